//! In-memory session storage for tests and throwaway dev servers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use mediverse_core::auth::{is_session_expired, Result, Session, SessionId, SessionRepository};

/// Stores sessions in a `HashMap` wrapped in `Arc<RwLock<_>>`.
/// Data is lost when the store is dropped.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionStore {
    async fn create_session(&self, session: &Session) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.as_str().to_string(), session.clone());
        Ok(())
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(id.as_str()).cloned())
    }

    async fn delete_session(&self, id: &SessionId) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id.as_str());
        Ok(())
    }

    async fn delete_user_sessions(&self, user_id: Uuid) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| s.user_id != user_id);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !is_session_expired(s, now));
        Ok((before - sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn create_test_session(id: &str, user_id: Uuid) -> Session {
        Session {
            id: SessionId::new(id.to_string()),
            user_id,
            created_at: Utc::now(),
            expires_at: Utc::now() + Duration::hours(24),
        }
    }

    #[tokio::test]
    async fn test_session_create_and_get() {
        let store = MemorySessionStore::new();
        let user_id = Uuid::new_v4();
        store
            .create_session(&create_test_session("session-1", user_id))
            .await
            .unwrap();

        let retrieved = store
            .get_session(&SessionId::new("session-1".to_string()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(retrieved.user_id, user_id);
    }

    #[tokio::test]
    async fn test_session_delete_nonexistent() {
        let store = MemorySessionStore::new();
        let result = store
            .delete_session(&SessionId::new("nonexistent".to_string()))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_delete_user_sessions() {
        let store = MemorySessionStore::new();
        let ann = Uuid::new_v4();
        let bob = Uuid::new_v4();

        store.create_session(&create_test_session("session-1", ann)).await.unwrap();
        store.create_session(&create_test_session("session-2", ann)).await.unwrap();
        store.create_session(&create_test_session("session-3", bob)).await.unwrap();

        store.delete_user_sessions(ann).await.unwrap();

        assert!(store
            .get_session(&SessionId::new("session-1".to_string()))
            .await
            .unwrap()
            .is_none());
        assert!(store
            .get_session(&SessionId::new("session-3".to_string()))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = MemorySessionStore::new();
        let mut stale = create_test_session("stale", Uuid::new_v4());
        stale.expires_at = Utc::now() - Duration::minutes(1);
        store.create_session(&stale).await.unwrap();
        store
            .create_session(&create_test_session("fresh", Uuid::new_v4()))
            .await
            .unwrap();

        assert_eq!(store.purge_expired().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_clone_shares_state() {
        let store = MemorySessionStore::new();
        let clone = store.clone();

        store
            .create_session(&create_test_session("session-1", Uuid::new_v4()))
            .await
            .unwrap();

        assert!(clone
            .get_session(&SessionId::new("session-1".to_string()))
            .await
            .unwrap()
            .is_some());
    }
}
