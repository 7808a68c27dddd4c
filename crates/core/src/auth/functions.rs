use chrono::{DateTime, Duration, Utc};
use rand::{distr::Alphanumeric, Rng};

use super::{Session, SessionId};

/// Length of generated session identifiers.
const SESSION_ID_LEN: usize = 48;

/// Generate a cryptographically random session ID.
pub fn generate_session_id() -> SessionId {
    let id: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect();
    SessionId::new(id)
}

/// Check if a session has expired.
pub fn is_session_expired(session: &Session, now: DateTime<Utc>) -> bool {
    session.expires_at <= now
}

/// Calculate session expiry from creation time and TTL.
pub fn calculate_expiry(created_at: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    created_at + ttl
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn session(created_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Session {
        Session {
            id: generate_session_id(),
            user_id: Uuid::new_v4(),
            created_at,
            expires_at,
        }
    }

    #[test]
    fn session_ids_are_long_alphanumeric_and_unique() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert_eq!(a.as_str().len(), SESSION_ID_LEN);
        assert!(a.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn session_not_expired_before_deadline() {
        let now = Utc::now();
        assert!(!is_session_expired(&session(now, now + Duration::hours(1)), now));
    }

    #[test]
    fn session_expired_at_and_after_deadline() {
        let now = Utc::now();
        assert!(is_session_expired(&session(now - Duration::hours(1), now), now));
        assert!(is_session_expired(
            &session(now - Duration::hours(2), now - Duration::hours(1)),
            now
        ));
    }

    #[test]
    fn expiry_is_creation_plus_ttl() {
        let created = Utc::now();
        assert_eq!(
            calculate_expiry(created, Duration::days(7)),
            created + Duration::days(7)
        );
    }
}
