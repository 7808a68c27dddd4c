use async_trait::async_trait;
use uuid::Uuid;

use super::{AuthError, Session, SessionId};

/// Result type for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Session storage abstraction.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Store a new session.
    async fn create_session(&self, session: &Session) -> Result<()>;

    /// Retrieve session by ID.
    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>>;

    /// Delete a specific session.
    async fn delete_session(&self, id: &SessionId) -> Result<()>;

    /// Delete all sessions for a user (blocking, deletion, password change).
    async fn delete_user_sessions(&self, user_id: Uuid) -> Result<()>;

    /// Drop sessions whose expiry is in the past. Returns how many were removed.
    async fn purge_expired(&self) -> Result<u64>;
}
