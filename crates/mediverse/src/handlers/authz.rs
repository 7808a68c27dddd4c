//! Role and participant checks for page handlers.
//!
//! Failures surface as [`AuthzError`], which the error layer turns into
//! 403 Forbidden. Role-gated handlers take one of the extractors below.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use mediverse_auth::{AuthState, CurrentUser};
use mediverse_core::clinic::{Role, User};

use super::AppError;

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("This page is only available to {required} accounts")]
    WrongRole { required: Role },

    #[error("You are not part of this {0}")]
    NotParticipant(&'static str),
}

pub fn require_role(user: &User, required: Role) -> Result<(), AuthzError> {
    if user.role == required {
        Ok(())
    } else {
        tracing::debug!(user_id = %user.id, role = %user.role, required = %required, "Role check failed");
        Err(AuthzError::WrongRole { required })
    }
}

/// Resolves the signed-in user and checks the role.
///
/// Anonymous requests get the login redirect of [`CurrentUser`].
async fn user_with_role<S>(parts: &mut Parts, state: &S, required: Role) -> Result<User, Response>
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    let CurrentUser(user) = CurrentUser::from_request_parts(parts, state)
        .await
        .map_err(IntoResponse::into_response)?;
    require_role(&user, required).map_err(|e| AppError::from(e).into_response())?;
    Ok(user)
}

macro_rules! role_extractor {
    ($(#[$meta:meta])* $name:ident, $role:expr) => {
        $(#[$meta])*
        pub struct $name(pub User);

        impl<S> FromRequestParts<S> for $name
        where
            AuthState: FromRef<S>,
            S: Send + Sync,
        {
            type Rejection = Response;

            async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
                user_with_role(parts, state, $role).await.map($name)
            }
        }
    };
}

role_extractor!(
    /// A signed-in patient.
    Patient,
    Role::Patient
);
role_extractor!(
    /// A signed-in doctor.
    Doctor,
    Role::Doctor
);
role_extractor!(
    /// A signed-in admin.
    Admin,
    Role::Admin
);
