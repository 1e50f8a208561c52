//! Resource tree model: nodes, resource types and workspaces.
//!
//! Nodes carry a materialised path with one segment per ancestor, each
//! written as `<name>%<id>` and terminated by a backtick:
//!
//! ```text
//! Workspace A%1`Documents%4`report.pdf%9`
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

const PATH_SEPARATOR: char = '`';
const ID_SEPARATOR: char = '%';

/// Resource node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub i64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Platform user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Named category of resource ("file", "directory", ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceType {
    pub id: i64,
    pub name: String,
}

impl ResourceType {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A workspace owning a subtree of resources.
///
/// Two workspaces are the same workspace when their guids match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: i64,
    pub guid: String,
    pub name: String,
}

impl Workspace {
    pub fn new(id: i64, guid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            guid: guid.into(),
            name: name.into(),
        }
    }
}

impl PartialEq for Workspace {
    fn eq(&self, other: &Self) -> bool {
        self.guid == other.guid
    }
}

impl Eq for Workspace {}

/// A node of the resource tree.
///
/// Workspace, parent, creator and path are fixed when the node is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceNode {
    id: NodeId,
    name: String,
    resource_type: ResourceType,
    parent: Option<NodeId>,
    workspace: Workspace,
    creator: UserId,
    path: String,
}

impl ResourceNode {
    /// Build a root node (no parent) of `workspace`.
    pub fn root(
        id: NodeId,
        name: impl Into<String>,
        resource_type: ResourceType,
        workspace: Workspace,
        creator: UserId,
    ) -> Self {
        let name = name.into();
        let path = path_segment(&name, id);
        Self {
            id,
            name,
            resource_type,
            parent: None,
            workspace,
            creator,
            path,
        }
    }

    /// Build a child of this node. The child inherits the workspace.
    #[must_use]
    pub fn child(
        &self,
        id: NodeId,
        name: impl Into<String>,
        resource_type: ResourceType,
        creator: UserId,
    ) -> Self {
        let name = name.into();
        let path = format!("{}{}", self.path, path_segment(&name, id));
        Self {
            id,
            name,
            resource_type,
            parent: Some(self.id),
            workspace: self.workspace.clone(),
            creator,
            path,
        }
    }

    /// Rebuild a node from its stored columns.
    pub fn from_stored(
        id: NodeId,
        name: String,
        resource_type: ResourceType,
        parent: Option<NodeId>,
        workspace: Workspace,
        creator: UserId,
        path: String,
    ) -> Self {
        Self {
            id,
            name,
            resource_type,
            parent,
            workspace,
            creator,
            path,
        }
    }

    pub const fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn resource_type(&self) -> &ResourceType {
        &self.resource_type
    }

    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub const fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub const fn creator(&self) -> UserId {
        self.creator
    }

    /// Raw materialised path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Human-readable path: segment names joined with ` / `.
    pub fn path_for_display(&self) -> String {
        segments(&self.path)
            .map(|segment| {
                segment
                    .rsplit_once(ID_SEPARATOR)
                    .map_or(segment, |(name, _)| name)
            })
            .collect::<Vec<_>>()
            .join(" / ")
    }

    /// Ids of the ancestors of this node, root first, nearest ancestor last.
    ///
    /// Segments whose id does not parse are skipped.
    pub fn ancestor_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = segments(&self.path)
            .filter_map(|segment| segment.rsplit_once(ID_SEPARATOR))
            .filter_map(|(_, id)| id.parse().ok().map(NodeId))
            .collect();
        if ids.last() == Some(&self.id) {
            ids.pop();
        }
        ids
    }
}

fn path_segment(name: &str, id: NodeId) -> String {
    format!("{name}{ID_SEPARATOR}{id}{PATH_SEPARATOR}")
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(PATH_SEPARATOR).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> (ResourceNode, ResourceNode, ResourceNode) {
        let ws = Workspace::new(1, "ws-guid", "Workspace A");
        let root = ResourceNode::root(
            NodeId(1),
            "Workspace A",
            ResourceType::new(1, "directory"),
            ws,
            UserId(7),
        );
        let docs = root.child(NodeId(4), "Documents", ResourceType::new(1, "directory"), UserId(7));
        let file = docs.child(NodeId(9), "report.pdf", ResourceType::new(2, "file"), UserId(8));
        (root, docs, file)
    }

    #[test]
    fn child_inherits_workspace_and_extends_path() {
        let (root, docs, file) = tree();
        assert_eq!(file.workspace(), root.workspace());
        assert_eq!(file.parent(), Some(docs.id()));
        assert_eq!(file.path(), "Workspace A%1`Documents%4`report.pdf%9`");
        assert!(root.parent().is_none());
    }

    #[test]
    fn display_path_strips_ids() {
        let (_, _, file) = tree();
        assert_eq!(file.path_for_display(), "Workspace A / Documents / report.pdf");
    }

    #[test]
    fn ancestors_are_ordered_root_first() {
        let (root, _, file) = tree();
        assert_eq!(file.ancestor_ids(), vec![NodeId(1), NodeId(4)]);
        assert!(root.ancestor_ids().is_empty());
    }

    #[test]
    fn workspaces_compare_by_guid() {
        let a = Workspace::new(1, "guid-a", "A");
        let renamed = Workspace::new(1, "guid-a", "Renamed");
        let b = Workspace::new(2, "guid-b", "A");
        assert_eq!(a, renamed);
        assert_ne!(a, b);
    }
}
