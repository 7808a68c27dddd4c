use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },
    /// The row exists but its current state forbids the change
    /// (slot already booked, prescription already used, ...).
    #[error("{0}")]
    Conflict(String),
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl RepositoryError {
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Errors whose message is meant for the person who submitted the form.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::AlreadyExists { .. } | Self::Conflict(_)
        )
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let error = RepositoryError::not_found("Slot", "abc-123");
        assert_eq!(error.to_string(), "Slot not found: abc-123");
    }

    #[test]
    fn already_exists_display() {
        let error = RepositoryError::AlreadyExists {
            entity_type: "User",
            id: "ann@example.com".to_string(),
        };
        assert_eq!(error.to_string(), "User already exists: ann@example.com");
    }

    #[test]
    fn conflict_shows_the_bare_message() {
        let error = RepositoryError::conflict("This prescription has already been used");
        assert_eq!(error.to_string(), "This prescription has already been used");
        assert!(error.is_user_facing());
    }

    #[test]
    fn infrastructure_errors_are_not_user_facing() {
        assert!(!RepositoryError::ConnectionFailed("timeout".to_string()).is_user_facing());
        assert!(!RepositoryError::QueryFailed("syntax".to_string()).is_user_facing());
        assert_eq!(
            RepositoryError::InvalidData("bad date".to_string()).to_string(),
            "Invalid data: bad date"
        );
    }
}
