//! Patient-doctor chats.

use askama::Template;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use uuid::Uuid;

use mediverse_auth::CurrentUser;
use mediverse_core::clinic::{
    check_chat_transition, ChatDetail, ChatStartForm, ChatStatus, Message, MessageForm,
    MessageView, Role, User,
};
use mediverse_core::storage::RepositoryError;

use super::{
    authz::{AuthzError, Patient},
    flash::{redirect_after, redirect_with_flash, Flash, FlashMessage},
    views::{HtmlTemplate, Page},
    AppError,
};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "chats.html")]
struct ChatsTemplate {
    page: Page,
    chats: Vec<ChatDetail>,
}

#[derive(Template)]
#[template(path = "chat.html")]
struct ChatTemplate {
    page: Page,
    detail: ChatDetail,
    messages: Vec<MessageView>,
    viewer_id: Uuid,
    is_doctor: bool,
}

impl ChatTemplate {
    fn can_accept(&self) -> bool {
        self.is_doctor && self.detail.chat.status == ChatStatus::Pending
    }

    fn can_close(&self) -> bool {
        self.detail.chat.status.is_open()
    }

    fn can_write(&self) -> bool {
        self.detail.chat.status == ChatStatus::Accepted
    }
}

/// A chat the user takes part in.
async fn own_chat(state: &AppState, user: &User, id: Uuid) -> Result<ChatDetail, AppError> {
    let detail = state
        .chats
        .get_chat(id)
        .await?
        .ok_or_else(|| RepositoryError::not_found("Chat", id))?;
    if !detail.involves(user.id) {
        return Err(AuthzError::NotParticipant("chat").into());
    }
    Ok(detail)
}

/// GET /chats
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    flash: Flash,
) -> Result<impl IntoResponse, AppError> {
    let chats = state.chats.list_user_chats(user.id).await?;

    Ok(HtmlTemplate(ChatsTemplate {
        page: Page::signed_in("Chats", &user, flash),
        chats,
    }))
}

/// POST /chats
///
/// Reuses the open chat with the doctor if there is one.
pub async fn start(
    State(state): State<AppState>,
    Patient(patient): Patient,
    Form(form): Form<ChatStartForm>,
) -> Result<Response, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(err) => return Ok(redirect_with_flash("/chats", FlashMessage::error(err.to_string()))),
    };
    if state.users.get_doctor(input.doctor_id).await?.is_none() {
        return Ok(redirect_with_flash(
            "/chats",
            FlashMessage::error("This doctor is not available"),
        ));
    }

    let chat = state
        .chats
        .open_chat(patient.id, input.doctor_id, input.message)
        .await?;
    tracing::info!(chat_id = %chat.id, patient_id = %patient.id, doctor_id = %input.doctor_id, "Chat opened");

    Ok(Redirect::to(&format!("/chats/{}", chat.id)).into_response())
}

/// GET /chats/{id}
pub async fn thread(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    flash: Flash,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = own_chat(&state, &user, id).await?;
    let messages = state.chats.list_messages(id).await?;

    Ok(HtmlTemplate(ChatTemplate {
        is_doctor: detail.chat.doctor_id == user.id,
        viewer_id: user.id,
        page: Page::signed_in("Chat", &user, flash),
        detail,
        messages,
    }))
}

/// POST /chats/{id}/messages
pub async fn post_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Form(form): Form<MessageForm>,
) -> Result<Response, AppError> {
    let back = format!("/chats/{id}");
    own_chat(&state, &user, id).await?;

    let body = match form.validate() {
        Ok(body) => body,
        Err(err) => return Ok(redirect_with_flash(&back, FlashMessage::error(err.to_string()))),
    };

    match state.chats.add_message(&Message::new(id, user.id, body)).await {
        Ok(()) => Ok(Redirect::to(&back).into_response()),
        Err(err) if err.is_user_facing() => {
            Ok(redirect_with_flash(&back, FlashMessage::error(err.to_string())))
        }
        Err(err) => Err(err.into()),
    }
}

/// POST /chats/{id}/accept
pub async fn accept(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let detail = own_chat(&state, &user, id).await?;
    if detail.chat.doctor_id != user.id {
        return Err(AuthzError::WrongRole {
            required: Role::Doctor,
        }
        .into());
    }
    transition(&state, &detail, ChatStatus::Accepted, "Chat accepted").await
}

/// POST /chats/{id}/close
pub async fn close(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let detail = own_chat(&state, &user, id).await?;
    transition(&state, &detail, ChatStatus::Closed, "Chat closed").await
}

async fn transition(
    state: &AppState,
    detail: &ChatDetail,
    to: ChatStatus,
    success: &str,
) -> Result<Response, AppError> {
    let back = format!("/chats/{}", detail.chat.id);
    let from = detail.chat.status;
    if let Err(err) = check_chat_transition(from, to) {
        return Ok(redirect_with_flash(&back, FlashMessage::error(err.to_string())));
    }

    let result = state.chats.transition_chat(detail.chat.id, from, to).await;
    if result.is_ok() {
        tracing::info!(chat_id = %detail.chat.id, from = %from, to = %to, "Chat status changed");
    }
    redirect_after(&back, result, success)
}
