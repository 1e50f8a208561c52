//! [`RightsRepository`] over the rights database.

use std::collections::BTreeSet;

use tracing::debug;

use claro_rights_core::decoder::MaskDecoderRegistry;
use claro_rights_core::error::Result;
use claro_rights_core::mask::{MaskBit, MaskDecoder, PermissionMask};
use claro_rights_core::node::{NodeId, ResourceNode};
use claro_rights_core::repository::{RightsInheritance, RightsRepository};
use claro_rights_core::requester::RoleSet;

use crate::db::{DatabaseError, RightsDatabase};

/// Rights repository reading the platform's rights tables.
#[derive(Clone)]
pub struct SqliteRights {
    db: RightsDatabase,
    inheritance: RightsInheritance,
}

impl SqliteRights {
    pub const fn new(db: RightsDatabase) -> Self {
        Self::with_inheritance(db, RightsInheritance::Explicit)
    }

    pub const fn with_inheritance(db: RightsDatabase, inheritance: RightsInheritance) -> Self {
        Self { db, inheritance }
    }

    pub const fn database(&self) -> &RightsDatabase {
        &self.db
    }

    /// Load a resource node by ID.
    pub async fn load_node(&self, id: NodeId) -> Result<ResourceNode> {
        Ok(self.db.find_node(id).await?.into())
    }

    /// Load several nodes, keeping the order of `ids`.
    pub async fn load_nodes(&self, ids: &[NodeId]) -> Result<Vec<ResourceNode>> {
        let mut nodes = Vec::with_capacity(ids.len());
        for id in ids {
            nodes.push(self.load_node(*id).await?);
        }
        Ok(nodes)
    }

    /// Build the decoder registry from the stored mask decoders.
    pub async fn load_decoders(&self) -> Result<MaskDecoderRegistry> {
        let mut registry = MaskDecoderRegistry::new();
        let rows = self.db.list_mask_decoders().await?;
        let count = rows.len();
        for row in rows {
            let value = u32::try_from(row.value).map_err(|_| {
                DatabaseError::Invalid(format!(
                    "decoder '{}' of type '{}' has value {}",
                    row.action, row.type_name, row.value
                ))
            })?;
            let mut decoder = MaskDecoder::new(row.type_name, &row.action, MaskBit::try_from(value)?);
            decoder.granted_icon_class = row.granted_icon_class;
            decoder.denied_icon_class = row.denied_icon_class;
            registry.insert(decoder)?;
        }
        debug!(decoders = count, "Loaded mask decoders");
        Ok(registry)
    }

    /// The node whose stored rows apply to `node` for `roles`.
    async fn governing_node(&self, roles: &RoleSet, node: &ResourceNode) -> Result<NodeId> {
        if self.inheritance == RightsInheritance::Explicit {
            return Ok(node.id());
        }
        let candidates = std::iter::once(node.id()).chain(node.ancestor_ids().into_iter().rev());
        for candidate in candidates {
            if !self.db.role_masks(roles, candidate).await?.is_empty() {
                return Ok(candidate);
            }
        }
        Ok(node.id())
    }
}

fn to_mask(value: i64) -> std::result::Result<PermissionMask, DatabaseError> {
    u32::try_from(value)
        .map(PermissionMask::from_bits)
        .map_err(|_| DatabaseError::Invalid(format!("mask {value} out of range")))
}

impl RightsRepository for SqliteRights {
    async fn max_granted_mask(&self, roles: &RoleSet, node: &ResourceNode) -> Result<PermissionMask> {
        let governing = self.governing_node(roles, node).await?;
        let mut mask = PermissionMask::EMPTY;
        for value in self.db.role_masks(roles, governing).await? {
            mask |= to_mask(value)?;
        }
        Ok(mask)
    }

    async fn creatable_type_names(
        &self,
        roles: &RoleSet,
        node: &ResourceNode,
    ) -> Result<BTreeSet<String>> {
        let governing = self.governing_node(roles, node).await?;
        Ok(self
            .db
            .creatable_types(roles, governing)
            .await?
            .into_iter()
            .collect())
    }
}
