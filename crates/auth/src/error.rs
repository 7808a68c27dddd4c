use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Auth errors for the mediverse_auth crate.
///
/// Wraps the core `AuthError` and adds the failures of I/O that cannot live
/// in the functional core.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Core(#[from] mediverse_core::auth::AuthError),

    #[error("user lookup failed: {0}")]
    UserLookup(#[from] mediverse_core::storage::RepositoryError),
}

impl AuthError {
    /// The core error, when this wraps one.
    pub fn core(&self) -> Option<&mediverse_core::auth::AuthError> {
        match self {
            Self::Core(err) => Some(err),
            Self::UserLookup(_) => None,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        use mediverse_core::auth::AuthError as CoreError;

        let (status, message) = match &self {
            AuthError::Core(core_err) => match core_err {
                CoreError::InvalidCredentials | CoreError::AccountBlocked => {
                    (StatusCode::UNAUTHORIZED, self.to_string())
                }
                CoreError::WeakPassword(_) | CoreError::PasswordMismatch => {
                    (StatusCode::BAD_REQUEST, self.to_string())
                }
                CoreError::SessionNotFound | CoreError::SessionExpired => {
                    (StatusCode::UNAUTHORIZED, self.to_string())
                }
                CoreError::Hashing(_) | CoreError::Storage(_) => {
                    tracing::error!(error = %self, "Auth error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
            },
            AuthError::UserLookup(_) => {
                tracing::error!(error = %self, "Auth user lookup failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, message).into_response()
    }
}
