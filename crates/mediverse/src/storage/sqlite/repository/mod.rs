//! SQLite repository implementation.
//!
//! Implements the repository traits from `mediverse_core::storage` using SQLite.
//! Each submodule holds the impl block for one trait.

mod admin;
mod applications;
mod appointments;
mod chats;
mod contact;
mod ratings;
mod reports;
mod slots;
mod specializations;
mod users;

use std::time::Duration;

use chrono::Utc;
use mediverse_core::storage::{RepositoryError, Result};
use tokio_rusqlite::Connection;

use super::conversions::format_datetime;
use super::error::wrap_err;
use super::schema;

/// How long a writer waits for a competing write transaction.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-based repository implementation.
///
/// Provides async access to SQLite storage for all clinic entities. Clones
/// share the same background connection.
#[derive(Clone)]
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Creates a new repository with a file-based database.
    ///
    /// The database file will be created if it doesn't exist.
    /// Schema tables are created automatically.
    pub async fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    /// Creates a new repository with an in-memory database.
    ///
    /// Useful for testing - data is lost when the connection is dropped.
    pub async fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    /// Applies connection settings and creates the schema.
    async fn init_schema(conn: &Connection) -> Result<()> {
        conn.call(|conn| {
            conn.pragma_update(None, "foreign_keys", true)
                .map_err(wrap_err)?;
            conn.busy_timeout(BUSY_TIMEOUT).map_err(wrap_err)?;
            conn.execute_batch(schema::CREATE_TABLES)
                .map_err(wrap_err)?;
            Ok(())
        })
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))
    }
}

/// Current time in storage format.
fn now() -> String {
    format_datetime(&Utc::now())
}
