//! Flash messages carried across a redirect in a short-lived cookie.
//!
//! A form post answers with [`redirect_with_flash`]; the next page reads the
//! message through the [`Flash`] extractor and [`clear_flash`] drops the
//! cookie once a page has been rendered.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request},
    http::{header::SET_COOKIE, request::Parts, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use mediverse_core::storage::RepositoryError;
use serde::{Deserialize, Serialize};

use super::AppError;

const FLASH_COOKIE: &str = "flash_message";

/// Flash message structure stored in cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashMessage {
    /// Message type: "error" or "success"
    #[serde(rename = "type")]
    pub message_type: String,
    pub message: String,
}

impl FlashMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message_type: "error".to_string(),
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message_type: "success".to_string(),
            message: message.into(),
        }
    }

    /// Serialize to JSON for cookie storage.
    pub fn to_cookie_value(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parses a raw (URL-encoded) cookie value.
    pub fn from_cookie_value(raw: &str) -> Option<Self> {
        let decoded = urlencoding::decode(raw).ok()?;
        serde_json::from_str(&decoded).ok()
    }

    /// Build a Set-Cookie header value for the flash message.
    ///
    /// Cookie properties:
    /// - Path: / (accessible from any page)
    /// - SameSite: Lax (sent on navigation, not cross-site requests)
    /// - Max-Age: 60 (expires after 60 seconds as a safety net)
    /// - HttpOnly (only ever read by the server)
    pub fn to_set_cookie_header(&self) -> String {
        let encoded = urlencoding::encode(&self.to_cookie_value()).into_owned();
        format!("{FLASH_COOKIE}={encoded}; Path=/; HttpOnly; SameSite=Lax; Max-Age=60")
    }
}

/// Create a redirect response with a flash message cookie.
pub fn redirect_with_flash(url: &str, flash: FlashMessage) -> Response {
    let cookie_header = flash.to_set_cookie_header();

    ([(SET_COOKIE, cookie_header)], Redirect::to(url)).into_response()
}

/// Redirects after a write: success flash on `Ok`, the error itself as a
/// flash when it is meant for the user, and a real error otherwise.
pub fn redirect_after<T>(
    url: &str,
    result: Result<T, RepositoryError>,
    success: &str,
) -> Result<Response, AppError> {
    match result {
        Ok(_) => Ok(redirect_with_flash(url, FlashMessage::success(success))),
        Err(err) if err.is_user_facing() => {
            Ok(redirect_with_flash(url, FlashMessage::error(err.to_string())))
        }
        Err(err) => Err(err.into()),
    }
}

/// The flash message of the current request, if any.
pub struct Flash(pub Option<FlashMessage>);

impl<S> FromRequestParts<S> for Flash
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        Ok(Flash(
            jar.get(FLASH_COOKIE)
                .and_then(|cookie| FlashMessage::from_cookie_value(cookie.value())),
        ))
    }
}

/// Expires the flash cookie once a non-redirect response has shown it.
pub async fn clear_flash(request: Request, next: Next) -> Response {
    let had_flash = CookieJar::from_headers(request.headers())
        .get(FLASH_COOKIE)
        .is_some();

    let mut response = next.run(request).await;

    if had_flash && !response.status().is_redirection() {
        response.headers_mut().append(
            SET_COOKIE,
            HeaderValue::from_static("flash_message=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"),
        );
    }
    response
}
