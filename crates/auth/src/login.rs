//! Password sign-in and cookie session helpers.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use mediverse_core::auth::{calculate_expiry, generate_session_id, Session, SessionId};
use mediverse_core::auth::AuthError as CoreError;
use mediverse_core::clinic::User;
use uuid::Uuid;

use crate::{password::verify_password, AuthError, AuthState};

/// Reads the session ID from the request cookies.
pub fn session_id_from_jar(state: &AuthState, jar: &CookieJar) -> Option<SessionId> {
    jar.get(&state.config.cookie_name)
        .map(|cookie| SessionId::new(cookie.value().to_string()))
}

/// Checks an email/password pair.
///
/// Unknown and deleted accounts and wrong passwords all report
/// `InvalidCredentials`. Blocked accounts report `AccountBlocked` once the
/// password has been verified.
pub async fn authenticate(
    state: &AuthState,
    email: &str,
    password: &str,
) -> Result<User, AuthError> {
    let user = state
        .users
        .get_user_by_email(email)
        .await?
        .filter(|user| !user.is_deleted)
        .ok_or(CoreError::InvalidCredentials)?;

    if !verify_password(password, &user.password_hash)? {
        return Err(CoreError::InvalidCredentials.into());
    }

    if user.is_blocked {
        return Err(CoreError::AccountBlocked.into());
    }

    Ok(user)
}

/// Creates a session for the user and adds the session cookie to the jar.
pub async fn sign_in(
    state: &AuthState,
    user_id: Uuid,
    jar: CookieJar,
) -> Result<CookieJar, AuthError> {
    let now = Utc::now();
    let session = Session {
        id: generate_session_id(),
        user_id,
        created_at: now,
        expires_at: calculate_expiry(now, state.config.session_ttl_chrono()),
    };
    state.sessions.create_session(&session).await?;

    tracing::info!(user_id = %user_id, "User signed in");

    let max_age = time::Duration::seconds(state.config.session_ttl.as_secs() as i64);
    let cookie = Cookie::build((state.config.cookie_name.clone(), session.id.to_string()))
        .path("/")
        .http_only(true)
        .secure(state.config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(max_age);

    Ok(jar.add(cookie))
}

/// Deletes the current session (if any) and removes the cookie.
pub async fn sign_out(state: &AuthState, jar: CookieJar) -> Result<CookieJar, AuthError> {
    if let Some(session_id) = session_id_from_jar(state, &jar) {
        state.sessions.delete_session(&session_id).await?;
    }

    Ok(jar.remove(Cookie::build(state.config.cookie_name.clone()).path("/")))
}

/// Drops every session of a user, e.g. after blocking or a password change.
pub async fn sign_out_everywhere(state: &AuthState, user_id: Uuid) -> Result<(), AuthError> {
    state.sessions.delete_user_sessions(user_id).await?;
    tracing::info!(user_id = %user_id, "All sessions revoked");
    Ok(())
}
