//! Axum extractors for the signed-in user.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use mediverse_core::auth::is_session_expired;
use mediverse_core::clinic::User;

use crate::{login::session_id_from_jar, AuthError, AuthState};

/// Resolves the cookie session to an active user.
///
/// Expired sessions are deleted on sight. Blocked and deleted users resolve
/// to `None` so their sessions stop working immediately.
async fn resolve_user(parts: &Parts, auth_state: &AuthState) -> Result<Option<User>, AuthError> {
    let jar = CookieJar::from_headers(&parts.headers);
    let Some(session_id) = session_id_from_jar(auth_state, &jar) else {
        return Ok(None);
    };

    let Some(session) = auth_state.sessions.get_session(&session_id).await? else {
        return Ok(None);
    };

    if is_session_expired(&session, Utc::now()) {
        auth_state.sessions.delete_session(&session_id).await?;
        return Ok(None);
    }

    let user = auth_state.users.get_user(session.user_id).await?;
    match user {
        Some(user) if user.is_active() => Ok(Some(user)),
        Some(user) => {
            tracing::warn!(user_id = %user.id, "Session of inactive user rejected");
            Ok(None)
        }
        None => Ok(None),
    }
}

/// Rejection for pages that need a signed-in user.
#[derive(Debug)]
pub enum AuthRejection {
    /// Not signed in: redirect to the login page, coming back afterwards.
    Login { return_to: String },
    Failed(AuthError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Login { return_to } => Redirect::to(&format!(
                "/login?return_to={}",
                urlencoding::encode(&return_to)
            ))
            .into_response(),
            Self::Failed(err) => err.into_response(),
        }
    }
}

/// Extractor for the signed-in user. Redirects to `/login` otherwise.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        match resolve_user(parts, &auth_state).await {
            Ok(Some(user)) => Ok(CurrentUser(user)),
            Ok(None) => Err(AuthRejection::Login {
                return_to: parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_else(|| "/".to_string()),
            }),
            Err(err) => Err(AuthRejection::Failed(err)),
        }
    }
}

/// Extractor for an optionally signed-in user. Never rejects.
pub struct OptionalUser(pub Option<User>);

impl<S> FromRequestParts<S> for OptionalUser
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        match resolve_user(parts, &auth_state).await {
            Ok(user) => Ok(OptionalUser(user)),
            Err(err) => {
                tracing::error!(error = %err, "Session lookup failed; treating as anonymous");
                Ok(OptionalUser(None))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, RwLock};

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        routing::{get, post},
        Router,
    };
    use http_body_util::BodyExt;
    use mediverse_core::clinic::{DoctorSummary, ProfileUpdate, Role};
    use mediverse_core::storage::{Result as RepoResult, UserRepository};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::{authenticate, hash_password, sign_in, AuthConfig, MemorySessionStore};

    /// Just enough of a user store for sign-in tests.
    #[derive(Default)]
    struct Users(RwLock<HashMap<Uuid, User>>);

    #[async_trait]
    impl UserRepository for Users {
        async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
            Ok(self.0.read().unwrap().get(&id).cloned())
        }
        async fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
            Ok(self
                .0
                .read()
                .unwrap()
                .values()
                .find(|u| u.email == email)
                .cloned())
        }
        async fn create_user(&self, user: &User) -> RepoResult<()> {
            self.0.write().unwrap().insert(user.id, user.clone());
            Ok(())
        }
        async fn update_profile(&self, _: Uuid, _: &ProfileUpdate) -> RepoResult<()> {
            Ok(())
        }
        async fn set_profile_image(&self, _: Uuid, _: &str) -> RepoResult<()> {
            Ok(())
        }
        async fn update_password(&self, _: Uuid, _: &str) -> RepoResult<()> {
            Ok(())
        }
        async fn set_blocked(&self, id: Uuid, blocked: bool) -> RepoResult<()> {
            if let Some(user) = self.0.write().unwrap().get_mut(&id) {
                user.is_blocked = blocked;
            }
            Ok(())
        }
        async fn soft_delete_user(&self, _: Uuid) -> RepoResult<()> {
            Ok(())
        }
        async fn list_users(&self, _: Option<Role>) -> RepoResult<Vec<User>> {
            Ok(vec![])
        }
        async fn list_doctors(&self, _: Option<Uuid>) -> RepoResult<Vec<DoctorSummary>> {
            Ok(vec![])
        }
        async fn get_doctor(&self, _: Uuid) -> RepoResult<Option<DoctorSummary>> {
            Ok(None)
        }
    }

    async fn setup() -> (AuthState, User) {
        let users = Arc::new(Users::default());
        let user = User::new_patient(
            "Ann",
            "ann@example.com",
            hash_password("correct horse").unwrap(),
        );
        users.create_user(&user).await.unwrap();

        let state = AuthState::new(
            Arc::new(MemorySessionStore::new()),
            users,
            AuthConfig::default(),
        );
        (state, user)
    }

    async fn whoami(CurrentUser(user): CurrentUser) -> String {
        user.name
    }

    async fn maybe(OptionalUser(user): OptionalUser) -> String {
        user.map(|u| u.name).unwrap_or_else(|| "anonymous".to_string())
    }

    async fn login(
        axum::extract::State(state): axum::extract::State<AuthState>,
        jar: CookieJar,
    ) -> Result<CookieJar, AuthError> {
        let user = authenticate(&state, "ann@example.com", "correct horse").await?;
        sign_in(&state, user.id, jar).await
    }

    fn app(state: AuthState) -> Router {
        Router::new()
            .route("/me", get(whoami))
            .route("/maybe", get(maybe))
            .route("/login", post(login))
            .with_state(state)
    }

    async fn session_cookie(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(Request::post("/login").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Lax"));
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn anonymous_request_redirects_to_login_with_return_to() {
        let (state, _) = setup().await;
        let response = app(state)
            .oneshot(Request::get("/me?tab=1").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/login?return_to=%2Fme%3Ftab%3D1"
        );
    }

    #[tokio::test]
    async fn signed_in_cookie_resolves_the_user() {
        let (state, _) = setup().await;
        let app = app(state);
        let cookie = session_cookie(&app).await;

        let response = app
            .oneshot(
                Request::get("/me")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "Ann");
    }

    #[tokio::test]
    async fn blocking_a_user_invalidates_existing_sessions() {
        let (state, user) = setup().await;
        let app = app(state.clone());
        let cookie = session_cookie(&app).await;

        state.users.set_blocked(user.id, true).await.unwrap();

        let response = app
            .oneshot(
                Request::get("/maybe")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(body_text(response).await, "anonymous");
    }

    #[tokio::test]
    async fn blocked_user_cannot_authenticate() {
        let (state, user) = setup().await;
        state.users.set_blocked(user.id, true).await.unwrap();

        let err = authenticate(&state, "ann@example.com", "correct horse")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Your account has been blocked");

        let err = authenticate(&state, "ann@example.com", "wrong")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid email or password");
    }

    #[tokio::test]
    async fn unknown_cookie_is_anonymous() {
        let (state, _) = setup().await;
        let response = app(state)
            .oneshot(
                Request::get("/maybe")
                    .header(header::COOKIE, "session=bogus")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(body_text(response).await, "anonymous");
    }
}
