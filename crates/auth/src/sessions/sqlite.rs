//! SQLite session storage implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mediverse_core::auth::{AuthError, Result, Session, SessionId, SessionRepository};
use sqlx::SqlitePool;
use uuid::Uuid;

/// SQLite-backed session storage.
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the session database at `path`.
    pub async fn connect(path: &str) -> Result<Self> {
        let options = sqlx::sqlite::SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        Ok(Self::new(pool))
    }

    /// Runs database migrations to create required tables.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Storage(e.to_string()))?;

        Ok(())
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AuthError::Storage(e.to_string()))
}

#[async_trait]
impl SessionRepository for SqliteSessionStore {
    async fn create_session(&self, session: &Session) -> Result<()> {
        sqlx::query("INSERT INTO sessions (id, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)")
            .bind(session.id.as_str())
            .bind(session.user_id.to_string())
            .bind(session.created_at.to_rfc3339())
            .bind(session.expires_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>> {
        let row = sqlx::query_as::<_, (String, String, String, String)>(
            "SELECT id, user_id, created_at, expires_at FROM sessions WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Storage(e.to_string()))?;

        match row {
            Some((id, user_id, created_at, expires_at)) => Ok(Some(Session {
                id: SessionId::new(id),
                user_id: Uuid::parse_str(&user_id).map_err(|e| AuthError::Storage(e.to_string()))?,
                created_at: parse_timestamp(&created_at)?,
                expires_at: parse_timestamp(&expires_at)?,
            })),
            None => Ok(None),
        }
    }

    async fn delete_session(&self, id: &SessionId) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn delete_user_sessions(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64> {
        // RFC 3339 UTC strings sort chronologically.
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn store() -> SqliteSessionStore {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        let store = SqliteSessionStore::new(pool);
        store.migrate().await.unwrap();
        store
    }

    fn session(id: &str, user_id: Uuid, expires_in: Duration) -> Session {
        let now = Utc::now();
        Session {
            id: SessionId::new(id.to_string()),
            user_id,
            created_at: now,
            expires_at: now + expires_in,
        }
    }

    #[tokio::test]
    async fn create_get_delete() {
        let store = store().await;
        let user_id = Uuid::new_v4();
        store
            .create_session(&session("s1", user_id, Duration::hours(1)))
            .await
            .unwrap();

        let found = store
            .get_session(&SessionId::new("s1".to_string()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.user_id, user_id);

        store
            .delete_session(&SessionId::new("s1".to_string()))
            .await
            .unwrap();
        assert!(store
            .get_session(&SessionId::new("s1".to_string()))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn delete_user_sessions_keeps_other_users() {
        let store = store().await;
        let ann = Uuid::new_v4();
        let bob = Uuid::new_v4();
        for (id, user) in [("a1", ann), ("a2", ann), ("b1", bob)] {
            store
                .create_session(&session(id, user, Duration::hours(1)))
                .await
                .unwrap();
        }

        store.delete_user_sessions(ann).await.unwrap();

        assert!(store
            .get_session(&SessionId::new("a2".to_string()))
            .await
            .unwrap()
            .is_none());
        assert!(store
            .get_session(&SessionId::new("b1".to_string()))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn purge_expired_removes_only_stale_sessions() {
        let store = store().await;
        let user = Uuid::new_v4();
        store
            .create_session(&session("old", user, Duration::hours(-1)))
            .await
            .unwrap();
        store
            .create_session(&session("fresh", user, Duration::hours(1)))
            .await
            .unwrap();

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert!(store
            .get_session(&SessionId::new("fresh".to_string()))
            .await
            .unwrap()
            .is_some());
    }
}
