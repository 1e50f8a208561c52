//! Logging setup for claro-rights binaries.
//!
//! Voter decisions, decoder loading and database access are logged through
//! `tracing`. Logs go to stderr because the command line prints its
//! decisions on stdout.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose events are filtered at the configured level.
const CRATES: [&str; 3] = ["claro_rights", "claro_rights_core", "claro_rights_store"];

/// Filter directive applying `level` to every claro-rights crate,
/// e.g. `claro_rights=debug,claro_rights_core=debug,claro_rights_store=debug`.
pub fn filter_for(level: &str) -> String {
    CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `default_filter` when set. With `log_json` every
/// event is one JSON object per line.
pub fn init_tracing(default_filter: &str, log_json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
    );
    let registry = tracing_subscriber::registry().with(env_filter);
    if log_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
