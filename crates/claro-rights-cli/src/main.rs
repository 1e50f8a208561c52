//! claro-rights command line
//!
//! Votes on resource operations against the platform's rights database and
//! inspects permission masks. Decisions are printed as JSON on stdout; the
//! exit status is 1 when the request is denied.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use claro_rights_core::config::load_config;
use claro_rights_core::tracing_init;
use claro_rights_core::{
    AccessError, NodeId, Operation, PermissionMask, Requester, ResourceCollection,
    ResourceVoter, Subject, UserId, Vote,
};
use claro_rights_store::{RightsDatabase, SqliteRights};

#[derive(Parser, Debug)]
#[command(name = "claro-rights")]
#[command(version, about = "Resource rights voter for the learning platform")]
struct Cli {
    /// Rights database file (overrides configuration)
    #[arg(long, global = true, env = "CLARO_RIGHTS_DATABASE")]
    db: Option<PathBuf>,

    /// Directory holding `.claro-rights/settings.json` (defaults to the
    /// current directory)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Log level filter (e.g. "info", "debug", "warn")
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Requesting user ID; anonymous when omitted
    #[arg(long, global = true)]
    user: Option<i64>,

    /// Role held by the requester (repeatable)
    #[arg(long = "role", global = true)]
    roles: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check an action ("open", "delete", ...) on one or more nodes
    Action {
        name: String,
        #[arg(long = "node", required = true)]
        nodes: Vec<i64>,
    },
    /// Check creation of a resource type under a parent node
    Create {
        type_name: String,
        #[arg(long)]
        parent: i64,
    },
    /// Check a copy of nodes under a parent node
    Copy {
        #[arg(long)]
        parent: i64,
        #[arg(long = "node", required = true)]
        nodes: Vec<i64>,
    },
    /// Check a move of nodes under a parent node
    Move {
        #[arg(long)]
        parent: i64,
        #[arg(long = "node", required = true)]
        nodes: Vec<i64>,
    },
    /// Expand a mask into the actions it grants for a resource type
    Decode { type_name: String, mask: u32 },
    /// Build the mask of a set of actions for a resource type
    Encode {
        type_name: String,
        #[arg(required = true)]
        actions: Vec<String>,
    },
}

/// Decision printed for vote commands.
#[derive(Debug, Serialize)]
struct Decision<'a> {
    operation: &'a str,
    vote: Vote,
    errors: Vec<RenderedError<'a>>,
}

#[derive(Debug, Serialize)]
struct RenderedError<'a> {
    key: &'static str,
    message: String,
    params: BTreeMap<&'static str, &'a str>,
    configuration_fault: bool,
}

impl<'a> From<&'a AccessError> for RenderedError<'a> {
    fn from(error: &'a AccessError) -> Self {
        Self {
            key: error.key(),
            message: error.to_string(),
            params: error.params().into_iter().collect(),
            configuration_fault: error.is_configuration_fault(),
        }
    }
}

#[derive(Debug, Serialize)]
struct EncodedMask<'a> {
    type_name: &'a str,
    mask: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let project_dir = match &cli.config_dir {
        Some(dir) => Some(dir.clone()),
        None => std::env::current_dir().ok(),
    };
    let config = load_config(project_dir.as_deref())?;

    let level = cli.log_level.as_deref().unwrap_or(&config.log.level);
    tracing_init::init_tracing(&tracing_init::filter_for(level), cli.log_json || config.log.json);

    let db_path = match cli.db.clone().or_else(|| config.store.database_path.clone()) {
        Some(path) => path,
        None => default_db_path()?,
    };
    info!(
        version = env!("CARGO_PKG_VERSION"),
        path = %db_path.display(),
        inheritance = ?config.rights.inheritance,
        "Opening rights database"
    );
    let db = RightsDatabase::open(&db_path).await?;
    let rights = SqliteRights::with_inheritance(db, config.rights.inheritance);
    let decoders = Arc::new(rights.load_decoders().await?);

    let requester = requester(cli.user, &cli.roles);

    let mut collection = match cli.command {
        Command::Decode { type_name, mask } => {
            if !decoders.has_type(&type_name) {
                anyhow::bail!("no permissions are defined for the type {type_name}");
            }
            let decoded = decoders.decode_mask(PermissionMask::from_bits(mask), &type_name);
            print_json(&decoded)?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Encode { type_name, actions } => {
            let mask = decoders.encode_mask(actions.as_slice(), &type_name)?;
            print_json(&EncodedMask {
                type_name: &type_name,
                mask: mask.bits(),
            })?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Action { name, nodes } => {
            let nodes = rights.load_nodes(&node_ids(&nodes)).await?;
            ResourceCollection::new(nodes, Operation::parse(&name, None, None)?)
        }
        Command::Create { type_name, parent } => {
            let parent = rights.load_node(NodeId(parent)).await?;
            ResourceCollection::new(
                Vec::new(),
                Operation::parse("create", Some(parent), Some(type_name))?,
            )
        }
        Command::Copy { parent, nodes } => {
            let parent = rights.load_node(NodeId(parent)).await?;
            let nodes = rights.load_nodes(&node_ids(&nodes)).await?;
            ResourceCollection::new(nodes, Operation::parse("copy", Some(parent), None)?)
        }
        Command::Move { parent, nodes } => {
            let parent = rights.load_node(NodeId(parent)).await?;
            let nodes = rights.load_nodes(&node_ids(&nodes)).await?;
            ResourceCollection::new(nodes, Operation::parse("move", Some(parent), None)?)
        }
    };

    let voter = ResourceVoter::with_config(rights, decoders, config.voter);
    let vote = voter
        .vote(&requester, Subject::Collection(&mut collection))
        .await?;

    print_json(&Decision {
        operation: collection.operation().name(),
        vote,
        errors: collection.errors().iter().map(RenderedError::from).collect(),
    })?;

    Ok(if vote == Vote::Granted {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn requester(user: Option<i64>, roles: &[String]) -> Requester {
    let roles = roles.iter().map(String::as_str);
    match user {
        Some(id) => Requester::authenticated(UserId(id), roles),
        None => Requester::anonymous(roles),
    }
}

fn node_ids(ids: &[i64]) -> Vec<NodeId> {
    ids.iter().copied().map(NodeId).collect()
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

/// Default database path: ~/.claro-rights/rights.db
fn default_db_path() -> anyhow::Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(default_db_path_in(&home))
}

fn default_db_path_in(home: &Path) -> PathBuf {
    home.join(".claro-rights").join("rights.db")
}
