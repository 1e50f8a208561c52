//! Database queries over the platform's rights tables.

use sqlx::{QueryBuilder, Sqlite};

use claro_rights_core::node::NodeId;
use claro_rights_core::requester::RoleSet;

use super::db::{DatabaseError, RightsDatabase};
use super::models::{DecoderRow, NodeRow};

const NODE_SELECT: &str = r"
    SELECT n.id, n.name, n.parent_id, n.creator_id, n.path,
           t.id AS type_id, t.name AS type_name,
           w.id AS workspace_id, w.guid AS workspace_guid, w.name AS workspace_name
    FROM claro_resource_node n
    JOIN claro_resource_type t ON t.id = n.resource_type_id
    JOIN claro_workspace w ON w.id = n.workspace_id
    WHERE n.id = ?
";

/// Append ` AND role.name IN (?, ?, ...)` for every role of `roles`.
fn push_role_filter(builder: &mut QueryBuilder<'_, Sqlite>, roles: &RoleSet) {
    builder.push(" AND role.name IN (");
    let mut separated = builder.separated(", ");
    for role in roles {
        separated.push_bind(role.clone());
    }
    separated.push_unseparated(")");
}

impl RightsDatabase {
    // =========================================================================
    // Rights queries
    // =========================================================================

    /// Masks stored for any of `roles` at `node`, one per matching role.
    ///
    /// An empty role set matches nothing and runs no query.
    pub async fn role_masks(
        &self,
        roles: &RoleSet,
        node: NodeId,
    ) -> Result<Vec<i64>, DatabaseError> {
        if roles.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(
            r"
            SELECT rights.mask
            FROM claro_resource_rights rights
            JOIN claro_role role ON role.id = rights.role_id
            WHERE rights.resource_node_id = ",
        );
        builder.push_bind(node.0);
        push_role_filter(&mut builder, roles);

        let masks = builder
            .build_query_scalar::<i64>()
            .fetch_all(self.pool())
            .await?;
        Ok(masks)
    }

    /// Resource type names any of `roles` may create under `node`.
    pub async fn creatable_types(
        &self,
        roles: &RoleSet,
        node: NodeId,
    ) -> Result<Vec<String>, DatabaseError> {
        if roles.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(
            r"
            SELECT DISTINCT rtype.name
            FROM claro_resource_rights rights
            JOIN claro_role role ON role.id = rights.role_id
            JOIN claro_list_type_creation creation ON creation.resource_rights_id = rights.id
            JOIN claro_resource_type rtype ON rtype.id = creation.resource_type_id
            WHERE rights.resource_node_id = ",
        );
        builder.push_bind(node.0);
        push_role_filter(&mut builder, roles);
        builder.push(" ORDER BY rtype.name");

        let names = builder
            .build_query_scalar::<String>()
            .fetch_all(self.pool())
            .await?;
        Ok(names)
    }

    // =========================================================================
    // Node queries
    // =========================================================================

    /// Get a resource node by ID.
    pub async fn find_node(&self, id: NodeId) -> Result<NodeRow, DatabaseError> {
        sqlx::query_as::<_, NodeRow>(NODE_SELECT)
            .bind(id.0)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Resource node {id}")))
    }

    // =========================================================================
    // Mask decoder queries
    // =========================================================================

    /// List every mask decoder, grouped by type and ordered by bit.
    pub async fn list_mask_decoders(&self) -> Result<Vec<DecoderRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, DecoderRow>(
            r"
            SELECT t.name AS type_name, d.name AS action, d.value,
                   d.granted_icon_class, d.denied_icon_class
            FROM claro_resource_mask_decoder d
            JOIN claro_resource_type t ON t.id = d.resource_type_id
            ORDER BY t.name, d.value
            ",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows)
    }
}
