//! claro-rights Core Library
//!
//! Resource permission engine of the learning platform:
//! - Resource tree model (nodes, types, workspaces)
//! - Permission bitmasks and the mask decoder registry
//! - Rights repository contract with an in-memory implementation
//! - Resource voter (workspace manager and creator overrides, per-node
//!   mask checks, create/copy/move composites)
//! - Configuration resolution and tracing setup

pub mod config;
pub mod decoder;
pub mod error;
pub mod mask;
pub mod node;
pub mod repository;
pub mod requester;
pub mod tracing_init;
pub mod voter;

pub use config::Config;
pub use decoder::MaskDecoderRegistry;
pub use error::{Error, Result};
pub use mask::{MaskBit, MaskDecoder, PermissionMask};
pub use node::{NodeId, ResourceNode, ResourceType, UserId, Workspace};
pub use repository::{InMemoryRights, RightsInheritance, RightsRepository};
pub use requester::{Requester, RoleSet};
pub use voter::{AccessError, Operation, ResourceCollection, ResourceVoter, Subject, Vote};
