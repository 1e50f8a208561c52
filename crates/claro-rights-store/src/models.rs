//! Database rows read from the platform's rights tables.

use serde::{Deserialize, Serialize};

use claro_rights_core::node::{NodeId, ResourceNode, ResourceType, UserId, Workspace};

/// Resource node joined with its type and workspace.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NodeRow {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub creator_id: i64,
    pub path: String,
    pub type_id: i64,
    pub type_name: String,
    pub workspace_id: i64,
    pub workspace_guid: String,
    pub workspace_name: String,
}

impl From<NodeRow> for ResourceNode {
    fn from(row: NodeRow) -> Self {
        Self::from_stored(
            NodeId(row.id),
            row.name,
            ResourceType::new(row.type_id, row.type_name),
            row.parent_id.map(NodeId),
            Workspace::new(row.workspace_id, row.workspace_guid, row.workspace_name),
            UserId(row.creator_id),
            row.path,
        )
    }
}

/// Mask decoder joined with its resource type name.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DecoderRow {
    pub type_name: String,
    pub action: String,
    pub value: i64,
    pub granted_icon_class: Option<String>,
    pub denied_icon_class: Option<String>,
}
