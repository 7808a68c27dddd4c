//! Shared rendering pieces: the askama response wrapper and the page
//! context every layout needs.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::{Local, NaiveDate, NaiveDateTime};
use mediverse_core::clinic::{Role, User};

use super::flash::{Flash, FlashMessage};

/// Template wrapper that converts Askama templates into HTML responses.
pub struct HtmlTemplate<T>(pub T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => {
                tracing::error!(error = %err, "Failed to render template");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to render page".to_string(),
                )
                    .into_response()
            }
        }
    }
}

/// Layout context: who is signed in and the pending flash message.
pub struct Page {
    pub user: Option<User>,
    pub flash: Option<FlashMessage>,
    pub title: String,
}

impl Page {
    pub fn new(title: impl Into<String>, user: Option<User>, Flash(flash): Flash) -> Self {
        Self {
            user,
            flash,
            title: title.into(),
        }
    }

    pub fn signed_in(title: impl Into<String>, user: &User, flash: Flash) -> Self {
        Self::new(title, Some(user.clone()), flash)
    }

    fn has_role(&self, role: Role) -> bool {
        self.user.as_ref().is_some_and(|user| user.role == role)
    }

    pub fn is_patient(&self) -> bool {
        self.has_role(Role::Patient)
    }

    pub fn is_doctor(&self) -> bool {
        self.has_role(Role::Doctor)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

/// Local wall-clock time; slots are published in clinic-local time.
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn today() -> NaiveDate {
    local_now().date()
}
