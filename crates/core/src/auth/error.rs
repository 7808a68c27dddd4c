use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Your account has been blocked")]
    AccountBlocked,

    #[error("Password must be at least {0} characters long")]
    WeakPassword(usize),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("session not found")]
    SessionNotFound,

    #[error("session expired")]
    SessionExpired,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl AuthError {
    /// True for errors caused by what the user typed, which are safe to show back.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::AccountBlocked
                | Self::WeakPassword(_)
                | Self::PasswordMismatch
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_facing_errors() {
        assert!(AuthError::InvalidCredentials.is_user_facing());
        assert!(AuthError::AccountBlocked.is_user_facing());
        assert!(!AuthError::Storage("disk full".to_string()).is_user_facing());
        assert!(!AuthError::SessionExpired.is_user_facing());
    }

    #[test]
    fn weak_password_message_names_the_minimum() {
        assert_eq!(
            AuthError::WeakPassword(8).to_string(),
            "Password must be at least 8 characters long"
        );
    }
}
