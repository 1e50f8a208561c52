#![allow(clippy::unwrap_used)] // Integration tests use unwrap for brevity

//! Integration tests for the `SQLite` rights repository.
//!
//! Seeds an in-memory database with the platform's rights tables and runs
//! the resource voter on top of it.

use std::sync::Arc;

use claro_rights_core::node::NodeId;
use claro_rights_core::repository::{RightsInheritance, RightsRepository};
use claro_rights_core::requester::{Requester, RoleSet};
use claro_rights_core::voter::{AccessError, ResourceVoter};
use claro_rights_core::{Error, UserId};
use claro_rights_store::{RightsDatabase, SqliteRights};

const SCHEMA: &str = r"
CREATE TABLE claro_workspace (
    id INTEGER PRIMARY KEY,
    guid TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL
);
CREATE TABLE claro_resource_type (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);
CREATE TABLE claro_resource_node (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    resource_type_id INTEGER NOT NULL REFERENCES claro_resource_type(id),
    parent_id INTEGER REFERENCES claro_resource_node(id),
    workspace_id INTEGER NOT NULL REFERENCES claro_workspace(id),
    creator_id INTEGER NOT NULL,
    path TEXT NOT NULL
);
CREATE TABLE claro_role (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);
CREATE TABLE claro_resource_rights (
    id INTEGER PRIMARY KEY,
    role_id INTEGER NOT NULL REFERENCES claro_role(id),
    resource_node_id INTEGER NOT NULL REFERENCES claro_resource_node(id),
    mask INTEGER NOT NULL
);
CREATE TABLE claro_list_type_creation (
    resource_rights_id INTEGER NOT NULL REFERENCES claro_resource_rights(id),
    resource_type_id INTEGER NOT NULL REFERENCES claro_resource_type(id)
);
CREATE TABLE claro_resource_mask_decoder (
    id INTEGER PRIMARY KEY,
    resource_type_id INTEGER NOT NULL REFERENCES claro_resource_type(id),
    name TEXT NOT NULL,
    value INTEGER NOT NULL,
    granted_icon_class TEXT,
    denied_icon_class TEXT
);
";

const FIXTURES: &str = r"
INSERT INTO claro_workspace (id, guid, name) VALUES (1, 'guid-physics', 'Physics');
INSERT INTO claro_resource_type (id, name) VALUES (1, 'directory'), (2, 'file'), (3, 'text');
INSERT INTO claro_resource_node (id, name, resource_type_id, parent_id, workspace_id, creator_id, path) VALUES
    (1, 'Physics', 1, NULL, 1, 100, 'Physics%1`'),
    (2, 'Lectures', 1, 1, 1, 100, 'Physics%1`Lectures%2`'),
    (3, 'week1.pdf', 2, 2, 1, 100, 'Physics%1`Lectures%2`week1.pdf%3`'),
    (4, 'notes', 3, 2, 1, 100, 'Physics%1`Lectures%2`notes%4`');
INSERT INTO claro_role (id, name) VALUES
    (1, 'ROLE_WS_COLLABORATOR_guid-physics'),
    (2, 'ROLE_WS_MANAGER_guid-physics'),
    (3, 'ROLE_USER');
INSERT INTO claro_resource_rights (id, role_id, resource_node_id, mask) VALUES
    (1, 1, 2, 1),
    (2, 3, 2, 2),
    (3, 1, 3, 1),
    (4, 3, 3, 8);
INSERT INTO claro_list_type_creation (resource_rights_id, resource_type_id) VALUES
    (1, 2),
    (2, 3);
INSERT INTO claro_resource_mask_decoder (resource_type_id, name, value, granted_icon_class, denied_icon_class) VALUES
    (2, 'open', 1, 'fa-eye', 'fa-eye-slash'),
    (2, 'copy', 2, NULL, NULL),
    (2, 'delete', 8, NULL, NULL),
    (1, 'open', 1, NULL, NULL),
    (1, 'copy', 2, NULL, NULL),
    (1, 'delete', 8, NULL, NULL);
";

async fn seeded() -> SqliteRights {
    let db = RightsDatabase::open_in_memory().await.unwrap();
    sqlx::raw_sql(SCHEMA).execute(db.pool()).await.unwrap();
    sqlx::raw_sql(FIXTURES).execute(db.pool()).await.unwrap();
    SqliteRights::new(db)
}

fn roles(names: &[&str]) -> RoleSet {
    names.iter().copied().collect()
}

#[tokio::test]
async fn loads_node_with_type_and_workspace() {
    let rights = seeded().await;
    let node = rights.load_node(NodeId(3)).await.unwrap();

    assert_eq!(node.name(), "week1.pdf");
    assert_eq!(node.resource_type().name, "file");
    assert_eq!(node.workspace().guid, "guid-physics");
    assert_eq!(node.parent(), Some(NodeId(2)));
    assert_eq!(node.creator(), UserId(100));
    assert_eq!(node.path_for_display(), "Physics / Lectures / week1.pdf");
}

#[tokio::test]
async fn missing_node_is_a_repository_error() {
    let rights = seeded().await;
    let result = rights.load_nodes(&[NodeId(3), NodeId(99)]).await;
    assert!(matches!(result, Err(Error::Repository(msg)) if msg.contains("99")));
}

#[tokio::test]
async fn mask_is_or_of_matching_roles() {
    let rights = seeded().await;
    let node = rights.load_node(NodeId(3)).await.unwrap();

    let both = roles(&["ROLE_WS_COLLABORATOR_guid-physics", "ROLE_USER"]);
    assert_eq!(rights.max_granted_mask(&both, &node).await.unwrap().bits(), 9);

    let user = roles(&["ROLE_USER"]);
    assert_eq!(rights.max_granted_mask(&user, &node).await.unwrap().bits(), 8);

    assert!(
        rights
            .max_granted_mask(&RoleSet::new(), &node)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn creatable_types_follow_roles() {
    let rights = seeded().await;
    let folder = rights.load_node(NodeId(2)).await.unwrap();

    let both = roles(&["ROLE_WS_COLLABORATOR_guid-physics", "ROLE_USER"]);
    let types = rights.creatable_type_names(&both, &folder).await.unwrap();
    assert_eq!(
        types.into_iter().collect::<Vec<_>>(),
        vec!["file".to_string(), "text".to_string()]
    );

    let none = rights
        .creatable_type_names(&roles(&["ROLE_ANONYMOUS"]), &folder)
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn nearest_ancestor_inheritance_reads_parent_rows() {
    let explicit = seeded().await;
    let inherited = SqliteRights::with_inheritance(
        explicit.database().clone(),
        RightsInheritance::NearestAncestor,
    );
    let root = inherited.load_node(NodeId(1)).await.unwrap();
    let file = inherited.load_node(NodeId(3)).await.unwrap();
    let notes = inherited.load_node(NodeId(4)).await.unwrap();
    let user = roles(&["ROLE_USER"]);
    let collaborator = roles(&["ROLE_WS_COLLABORATOR_guid-physics"]);

    // no rows on the root or above it
    assert!(inherited.max_granted_mask(&user, &root).await.unwrap().is_empty());
    // own rows win over the parent's
    assert_eq!(inherited.max_granted_mask(&user, &file).await.unwrap().bits(), 8);

    // notes has no rows of its own
    assert!(explicit.max_granted_mask(&user, &notes).await.unwrap().is_empty());
    assert_eq!(inherited.max_granted_mask(&user, &notes).await.unwrap().bits(), 2);
    assert!(
        explicit
            .creatable_type_names(&collaborator, &notes)
            .await
            .unwrap()
            .is_empty()
    );
    let inherited_types = inherited
        .creatable_type_names(&collaborator, &notes)
        .await
        .unwrap();
    assert!(inherited_types.contains("file"));
}

#[tokio::test]
async fn decoders_load_from_database() {
    let rights = seeded().await;
    let registry = rights.load_decoders().await.unwrap();

    let open = registry.decoder("file", "OPEN").unwrap();
    assert_eq!(open.bit.value(), 1);
    assert_eq!(open.granted_icon_class.as_deref(), Some("fa-eye"));
    assert!(registry.decoder("file", "export").is_none());
    assert!(registry.decoder("text", "open").is_none());
}

#[tokio::test]
async fn voter_over_sqlite_rights() {
    let rights = seeded().await;
    let registry = Arc::new(rights.load_decoders().await.unwrap());
    let file = rights.load_node(NodeId(3)).await.unwrap();
    let folder = rights.load_node(NodeId(2)).await.unwrap();
    let voter = ResourceVoter::new(rights, registry);

    let student = Requester::authenticated(UserId(7), ["ROLE_WS_COLLABORATOR_guid-physics"]);
    assert!(
        voter
            .check_action("open", std::slice::from_ref(&file), &student)
            .await
            .unwrap()
            .is_empty()
    );
    assert_eq!(
        voter
            .check_action("delete", std::slice::from_ref(&file), &student)
            .await
            .unwrap(),
        vec![AccessError::ActionDenied {
            action: "delete".to_string(),
            path: "Physics / Lectures / week1.pdf".to_string(),
        }]
    );

    // the text type has no decoders at all
    let text_errors = voter
        .check_creation("text", &folder, &student, folder.workspace())
        .await
        .unwrap();
    assert_eq!(text_errors.len(), 1);

    let manager = Requester::authenticated(UserId(8), ["ROLE_WS_MANAGER_guid-physics"]);
    assert!(
        voter
            .check_move(&folder, std::slice::from_ref(&file), &manager)
            .await
            .unwrap()
            .is_empty()
    );
}
