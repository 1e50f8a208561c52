//! `SQLite` storage for claro-rights.
//!
//! Reads roles, per-node rights masks, creation rights, resource nodes and
//! mask decoders from the platform's existing rights tables.

mod db;
mod models;
mod queries;
mod rights;

pub use db::{DatabaseError, RightsDatabase};
pub use models::{DecoderRow, NodeRow};
pub use rights::SqliteRights;
