use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mediverse_core::clinic::{TransitionError, ValidationError};
use mediverse_core::storage::{repository_error_to_status_code, RepositoryError};

use super::authz::AuthzError;
use crate::uploads::UploadError;

/// Handler error wrapping `anyhow::Error`.
///
/// The status code comes from the wrapped error when it is one the
/// application knows about; anything else is a 500 with a generic body.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    fn status_and_message(&self) -> (StatusCode, String) {
        if let Some(repo_error) = self.0.downcast_ref::<RepositoryError>() {
            let code = repository_error_to_status_code(repo_error);
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            if repo_error.is_user_facing() {
                return (status, repo_error.to_string());
            }
            return (status, generic_message(status));
        }
        if let Some(authz) = self.0.downcast_ref::<AuthzError>() {
            return (StatusCode::FORBIDDEN, authz.to_string());
        }
        if let Some(err) = self.0.downcast_ref::<ValidationError>() {
            return (StatusCode::BAD_REQUEST, err.to_string());
        }
        if let Some(err) = self.0.downcast_ref::<TransitionError>() {
            return (StatusCode::CONFLICT, err.to_string());
        }
        if let Some(err) = self.0.downcast_ref::<UploadError>() {
            if err.is_user_facing() {
                return (StatusCode::BAD_REQUEST, err.to_string());
            }
        }
        if let Some(err) = self.0.downcast_ref::<mediverse_auth::AuthError>() {
            if err.core().is_some_and(|core| core.is_user_facing()) {
                return (StatusCode::UNAUTHORIZED, err.to_string());
            }
        }
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        (status, generic_message(status))
    }
}

fn generic_message(status: StatusCode) -> String {
    match status {
        StatusCode::SERVICE_UNAVAILABLE => "Service temporarily unavailable".to_string(),
        _ => "Something went wrong".to_string(),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            tracing::error!(error = %self.0, status = status.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self.0, status = status.as_u16(), "Request rejected");
        }

        (status, message).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use mediverse_core::clinic::Role;

    use super::*;

    async fn render(err: AppError) -> (StatusCode, String) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_keeps_its_message() {
        let err = AppError::from(RepositoryError::not_found("Appointment", "a-1"));
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Appointment not found: a-1");
    }

    #[tokio::test]
    async fn test_query_failures_are_hidden() {
        let err = AppError::from(RepositoryError::QueryFailed("no such table: users".into()));
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Something went wrong");
    }

    #[tokio::test]
    async fn test_authorization_failures_are_forbidden() {
        let err = AppError::from(AuthzError::WrongRole {
            required: Role::Doctor,
        });
        let (status, _) = render(err).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_unknown_errors_are_500() {
        let (status, _) = render(AppError(anyhow::anyhow!("boom"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
