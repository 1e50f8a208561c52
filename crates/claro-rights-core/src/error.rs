//! Error types for the resource rights core library.

use thiserror::Error;

/// Result type alias using the rights core Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors raised while evaluating or configuring rights.
///
/// Access denials are not errors: they are reported as
/// [`AccessError`](crate::voter::AccessError) lists by the voter.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure of the rights repository (missing node, query failure, ...)
    #[error("Rights repository error: {0}")]
    Repository(String),

    /// A create/move/copy request was made against a single node.
    #[error("A resource collection must be used for the '{action}' action")]
    CollectionRequired { action: String },

    /// An operation could not be built from its attribute and arguments.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Mask decoder registry misconfiguration
    #[error("Mask decoder error: {0}")]
    Decoder(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
