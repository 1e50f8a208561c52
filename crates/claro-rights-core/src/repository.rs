//! Rights repository contract and an in-memory implementation.
//!
//! The voter needs exactly two queries from persistence: the maximum mask
//! granted to a set of roles at a node, and the resource types those roles
//! may create under it. Where the stored rights come from (the node itself
//! or an ancestor) is the repository's business.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::mask::PermissionMask;
use crate::node::{NodeId, ResourceNode};
use crate::requester::RoleSet;

/// Read-only rights queries consumed by the voter.
pub trait RightsRepository: Send + Sync {
    /// OR of every mask stored for any of `roles` at the node governing `node`.
    fn max_granted_mask(
        &self,
        roles: &RoleSet,
        node: &ResourceNode,
    ) -> impl Future<Output = Result<PermissionMask>> + Send;

    /// Union of the resource type names `roles` may create under `node`.
    fn creatable_type_names(
        &self,
        roles: &RoleSet,
        node: &ResourceNode,
    ) -> impl Future<Output = Result<BTreeSet<String>>> + Send;
}

impl<R: RightsRepository> RightsRepository for Arc<R> {
    fn max_granted_mask(
        &self,
        roles: &RoleSet,
        node: &ResourceNode,
    ) -> impl Future<Output = Result<PermissionMask>> + Send {
        (**self).max_granted_mask(roles, node)
    }

    fn creatable_type_names(
        &self,
        roles: &RoleSet,
        node: &ResourceNode,
    ) -> impl Future<Output = Result<BTreeSet<String>>> + Send {
        (**self).creatable_type_names(roles, node)
    }
}

/// Where rights for a node are looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RightsInheritance {
    /// Only rights stored on the node itself count.
    #[default]
    Explicit,
    /// A node without rights for the requested roles falls back to its
    /// nearest ancestor that has some.
    NearestAncestor,
}

impl std::str::FromStr for RightsInheritance {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "explicit" => Ok(Self::Explicit),
            "nearest-ancestor" => Ok(Self::NearestAncestor),
            other => Err(crate::error::Error::Config(format!(
                "unknown rights inheritance '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct RightsEntry {
    mask: PermissionMask,
    creatable: BTreeSet<String>,
}

/// Rights held in memory, keyed by `(role, node)`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRights {
    entries: HashMap<(String, NodeId), RightsEntry>,
    inheritance: RightsInheritance,
}

impl InMemoryRights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inheritance(inheritance: RightsInheritance) -> Self {
        Self {
            entries: HashMap::new(),
            inheritance,
        }
    }

    /// Add `mask` to whatever `role` already holds at `node`.
    pub fn grant(&mut self, role: &str, node: NodeId, mask: PermissionMask) -> &mut Self {
        self.entry(role, node).mask |= mask;
        self
    }

    /// Replace the mask `role` holds at `node`.
    pub fn set_mask(&mut self, role: &str, node: NodeId, mask: PermissionMask) -> &mut Self {
        self.entry(role, node).mask = mask;
        self
    }

    /// Allow `role` to create resources of `type_name` under `node`.
    pub fn allow_creation(&mut self, role: &str, node: NodeId, type_name: &str) -> &mut Self {
        self.entry(role, node).creatable.insert(type_name.to_string());
        self
    }

    /// Drop every right `role` holds at `node`.
    pub fn revoke(&mut self, role: &str, node: NodeId) -> &mut Self {
        self.entries.remove(&(role.to_string(), node));
        self
    }

    fn entry(&mut self, role: &str, node: NodeId) -> &mut RightsEntry {
        self.entries.entry((role.to_string(), node)).or_default()
    }

    fn entries_at<'a>(
        &'a self,
        roles: &'a RoleSet,
        node: NodeId,
    ) -> impl Iterator<Item = &'a RightsEntry> + 'a {
        roles
            .iter()
            .filter_map(move |role| self.entries.get(&(role.to_string(), node)))
    }

    /// The node whose stored rights apply to `node` for `roles`.
    fn governing_node(&self, roles: &RoleSet, node: &ResourceNode) -> NodeId {
        match self.inheritance {
            RightsInheritance::Explicit => node.id(),
            RightsInheritance::NearestAncestor => std::iter::once(node.id())
                .chain(node.ancestor_ids().into_iter().rev())
                .find(|id| self.entries_at(roles, *id).next().is_some())
                .unwrap_or_else(|| node.id()),
        }
    }
}

impl RightsRepository for InMemoryRights {
    async fn max_granted_mask(&self, roles: &RoleSet, node: &ResourceNode) -> Result<PermissionMask> {
        let governing = self.governing_node(roles, node);
        Ok(self
            .entries_at(roles, governing)
            .fold(PermissionMask::EMPTY, |mask, entry| mask | entry.mask))
    }

    async fn creatable_type_names(
        &self,
        roles: &RoleSet,
        node: &ResourceNode,
    ) -> Result<BTreeSet<String>> {
        let governing = self.governing_node(roles, node);
        Ok(self
            .entries_at(roles, governing)
            .flat_map(|entry| entry.creatable.iter().cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{ResourceType, UserId, Workspace};

    fn nodes() -> (ResourceNode, ResourceNode) {
        let root = ResourceNode::root(
            NodeId(1),
            "root",
            ResourceType::new(1, "directory"),
            Workspace::new(1, "ws-1", "WS"),
            UserId(1),
        );
        let file = root.child(NodeId(2), "notes.txt", ResourceType::new(2, "file"), UserId(1));
        (root, file)
    }

    fn roles(names: &[&str]) -> RoleSet {
        names.iter().copied().collect()
    }

    #[tokio::test]
    async fn mask_is_or_of_all_roles() {
        let (_, file) = nodes();
        let mut rights = InMemoryRights::new();
        rights
            .grant("ROLE_A", file.id(), PermissionMask::from_bits(1))
            .grant("ROLE_B", file.id(), PermissionMask::from_bits(8))
            .grant("ROLE_C", file.id(), PermissionMask::from_bits(16));

        let mask = rights
            .max_granted_mask(&roles(&["ROLE_A", "ROLE_B"]), &file)
            .await
            .unwrap();
        assert_eq!(mask.bits(), 9);
    }

    #[tokio::test]
    async fn unknown_roles_get_nothing() {
        let (_, file) = nodes();
        let mut rights = InMemoryRights::new();
        rights.grant("ROLE_A", file.id(), PermissionMask::from_bits(1));

        let mask = rights
            .max_granted_mask(&roles(&["ROLE_Z"]), &file)
            .await
            .unwrap();
        assert!(mask.is_empty());
    }

    #[tokio::test]
    async fn explicit_inheritance_ignores_ancestors() {
        let (root, file) = nodes();
        let mut rights = InMemoryRights::new();
        rights.grant("ROLE_A", root.id(), PermissionMask::from_bits(31));

        let mask = rights
            .max_granted_mask(&roles(&["ROLE_A"]), &file)
            .await
            .unwrap();
        assert!(mask.is_empty());
    }

    #[tokio::test]
    async fn nearest_ancestor_inheritance_falls_back() {
        let (root, file) = nodes();
        let mut rights = InMemoryRights::with_inheritance(RightsInheritance::NearestAncestor);
        rights
            .grant("ROLE_A", root.id(), PermissionMask::from_bits(3))
            .allow_creation("ROLE_A", root.id(), "file");

        let requested = roles(&["ROLE_A"]);
        assert_eq!(
            rights.max_granted_mask(&requested, &file).await.unwrap().bits(),
            3
        );
        assert!(
            rights
                .creatable_type_names(&requested, &file)
                .await
                .unwrap()
                .contains("file")
        );

        // an explicit entry on the node wins over the ancestor
        rights.set_mask("ROLE_A", file.id(), PermissionMask::from_bits(1));
        assert_eq!(
            rights.max_granted_mask(&requested, &file).await.unwrap().bits(),
            1
        );
    }

    #[tokio::test]
    async fn creatable_types_union_across_roles() {
        let (root, _) = nodes();
        let mut rights = InMemoryRights::new();
        rights
            .allow_creation("ROLE_A", root.id(), "file")
            .allow_creation("ROLE_B", root.id(), "directory")
            .allow_creation("ROLE_C", root.id(), "activity");

        let types = rights
            .creatable_type_names(&roles(&["ROLE_A", "ROLE_B"]), &root)
            .await
            .unwrap();
        assert_eq!(
            types.into_iter().collect::<Vec<_>>(),
            vec!["directory".to_string(), "file".to_string()]
        );
    }

    #[tokio::test]
    async fn revoke_removes_rights() {
        let (_, file) = nodes();
        let mut rights = InMemoryRights::new();
        rights
            .grant("ROLE_A", file.id(), PermissionMask::from_bits(1))
            .revoke("ROLE_A", file.id());
        assert!(
            rights
                .max_granted_mask(&roles(&["ROLE_A"]), &file)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn inheritance_parses_kebab_case() {
        assert_eq!(
            "nearest-ancestor".parse::<RightsInheritance>().unwrap(),
            RightsInheritance::NearestAncestor
        );
        assert!("sideways".parse::<RightsInheritance>().is_err());
    }
}
