//! Database connection handling.
//!
//! The rights tables belong to the platform; this crate opens an existing
//! database and never creates or migrates tables.

use std::path::Path;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tracing::info;

/// Database errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid stored data: {0}")]
    Invalid(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(e: sqlx::Error) -> Self {
        Self::Query(e.to_string())
    }
}

impl From<DatabaseError> for claro_rights_core::Error {
    fn from(e: DatabaseError) -> Self {
        Self::Repository(e.to_string())
    }
}

/// Handle on the platform's rights database.
#[derive(Clone)]
pub struct RightsDatabase {
    pool: Pool<Sqlite>,
}

impl RightsDatabase {
    /// Open an existing database read-only.
    ///
    /// Fails when the file does not exist.
    pub async fn open(path: &Path) -> Result<Self, DatabaseError> {
        if !path.exists() {
            return Err(DatabaseError::Io(format!(
                "database file {} does not exist",
                path.display()
            )));
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        info!(path = %path.display(), "Rights database opened");

        Ok(Self { pool })
    }

    /// Open an empty, writable in-memory database (for testing).
    pub async fn open_in_memory() -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| DatabaseError::Connection(e.to_string()))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_in_memory_works() {
        let db = RightsDatabase::open_in_memory().await;
        assert!(db.is_ok());
    }

    #[tokio::test]
    async fn open_missing_file_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = RightsDatabase::open(&dir.path().join("absent.db")).await;
        assert!(matches!(result, Err(DatabaseError::Io(_))));
    }

    #[test]
    fn converts_into_repository_error() {
        let err: claro_rights_core::Error = DatabaseError::NotFound("Resource node 4".into()).into();
        assert!(matches!(err, claro_rights_core::Error::Repository(msg) if msg.contains("node 4")));
    }
}
