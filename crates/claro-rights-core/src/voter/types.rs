//! Resource voter types.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::node::ResourceNode;

/// Attributes that only make sense on a collection with a target parent.
const COLLECTION_ONLY: [&str; 3] = ["create", "move", "copy"];

/// Whether `attribute` names a create/move/copy operation (case-insensitive).
pub fn requires_collection(attribute: &str) -> bool {
    COLLECTION_ONLY
        .iter()
        .any(|special| special.eq_ignore_ascii_case(attribute))
}

/// Outcome of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Granted,
    Denied,
    /// The voter does not handle this kind of subject.
    Abstain,
}

/// One reason a request cannot be granted.
///
/// The `Display` output is the English rendering of the message; callers
/// localising messages use [`AccessError::key`] and [`AccessError::params`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccessError {
    /// The requester lacks the bit of `action` on the node at `path`.
    #[error("You are not allowed to {action} the resource {path}")]
    ActionDenied { action: String, path: String },

    /// Resources of `type_name` cannot be created under `path`.
    #[error("You cannot create a resource of type {type_name} in {path}")]
    CreationWrongType { type_name: String, path: String },

    /// No decoder exists for `action` on `type_name`.
    #[error("The permission {action} does not exist for the type {type_name}")]
    UnknownPermission { action: String, type_name: String },
}

impl AccessError {
    /// Translation key of the message template.
    pub const fn key(&self) -> &'static str {
        match self {
            Self::ActionDenied { .. } => "resource_action_denied_message",
            Self::CreationWrongType { .. } => "resource_creation_wrong_type",
            Self::UnknownPermission { .. } => "resource_permission_unknown",
        }
    }

    /// Named template parameters.
    pub fn params(&self) -> Vec<(&'static str, &str)> {
        match self {
            Self::ActionDenied { action, path } => {
                vec![("%action%", action.as_str()), ("%path%", path.as_str())]
            }
            Self::CreationWrongType { type_name, path } => {
                vec![("%type%", type_name.as_str()), ("%path%", path.as_str())]
            }
            Self::UnknownPermission { action, type_name } => {
                vec![("%action%", action.as_str()), ("%type%", type_name.as_str())]
            }
        }
    }

    /// Whether this is a decoder misconfiguration rather than a denial.
    pub const fn is_configuration_fault(&self) -> bool {
        matches!(self, Self::UnknownPermission { .. })
    }
}

/// Operation requested on a [`ResourceCollection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// A plain action ("open", "delete", "compose", ...) on every node.
    Action(String),
    /// Create a resource of `type_name` under `parent`.
    Create {
        type_name: String,
        parent: ResourceNode,
    },
    /// Move every node under `parent`.
    Move { parent: ResourceNode },
    /// Copy every node under `parent`.
    Copy { parent: ResourceNode },
}

impl Operation {
    /// Build an operation from a framework attribute.
    ///
    /// `create` needs both `parent` and `type_name`; `move` and `copy` need
    /// `parent`. Anything else is a plain action and ignores both.
    pub fn parse(
        attribute: &str,
        parent: Option<ResourceNode>,
        type_name: Option<String>,
    ) -> Result<Self> {
        let attribute = attribute.to_lowercase();
        let missing_parent =
            || Error::InvalidOperation(format!("'{attribute}' requires a target parent"));
        match attribute.as_str() {
            "create" => {
                let parent = parent.ok_or_else(missing_parent)?;
                let type_name = type_name.ok_or_else(|| {
                    Error::InvalidOperation("'create' requires a resource type".to_string())
                })?;
                Ok(Self::Create { type_name, parent })
            }
            "move" => Ok(Self::Move {
                parent: parent.ok_or_else(missing_parent)?,
            }),
            "copy" => Ok(Self::Copy {
                parent: parent.ok_or_else(missing_parent)?,
            }),
            "" => Err(Error::InvalidOperation("empty attribute".to_string())),
            _ => Ok(Self::Action(attribute)),
        }
    }

    /// Lower-case name of the operation.
    pub fn name(&self) -> &str {
        match self {
            Self::Action(action) => action,
            Self::Create { .. } => "create",
            Self::Move { .. } => "move",
            Self::Copy { .. } => "copy",
        }
    }
}

/// A batch of nodes and the operation requested on them.
///
/// Voting stores the accumulated errors on the collection.
#[derive(Debug, Clone)]
pub struct ResourceCollection {
    nodes: Vec<ResourceNode>,
    operation: Operation,
    errors: Vec<AccessError>,
}

impl ResourceCollection {
    pub const fn new(nodes: Vec<ResourceNode>, operation: Operation) -> Self {
        Self {
            nodes,
            operation,
            errors: Vec::new(),
        }
    }

    pub fn nodes(&self) -> &[ResourceNode] {
        &self.nodes
    }

    pub const fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Errors from the last vote on this collection.
    pub fn errors(&self) -> &[AccessError] {
        &self.errors
    }

    pub(crate) fn set_errors(&mut self, errors: Vec<AccessError>) {
        self.errors = errors;
    }
}

/// What a vote is cast on.
#[derive(Debug)]
pub enum Subject<'a> {
    /// One node and the attribute requested on it.
    Node {
        node: &'a ResourceNode,
        attribute: &'a str,
    },
    /// A batch carrying its own operation.
    Collection(&'a mut ResourceCollection),
    /// Anything the resource voter does not handle.
    Unsupported,
}
