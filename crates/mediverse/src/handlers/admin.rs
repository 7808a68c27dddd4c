//! Admin back office: dashboard, user moderation, specializations and
//! contact messages. Doctor applications live in `applications`.

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Form,
};
use uuid::Uuid;

use mediverse_auth::sign_out_everywhere;
use mediverse_core::clinic::{
    AppointmentDetail, ContactMessage, DashboardStats, RoleFilter, Specialization, SpecializationForm,
    SpecializationSummary, User,
};
use mediverse_core::storage::RepositoryError;

use super::{
    authz::Admin,
    flash::{redirect_after, redirect_with_flash, Flash, FlashMessage},
    views::{HtmlTemplate, Page},
    AppError,
};
use crate::state::AppState;

/// Appointments shown on the dashboard.
const DASHBOARD_APPOINTMENTS: u32 = 10;

#[derive(Template)]
#[template(path = "admin/dashboard.html")]
struct DashboardTemplate {
    page: Page,
    stats: DashboardStats,
    recent: Vec<AppointmentDetail>,
}

#[derive(Template)]
#[template(path = "admin/users.html")]
struct UsersTemplate {
    page: Page,
    users: Vec<User>,
    filter: String,
    admin_id: Uuid,
}

#[derive(Template)]
#[template(path = "admin/specializations.html")]
struct SpecializationsTemplate {
    page: Page,
    specializations: Vec<SpecializationSummary>,
}

#[derive(Template)]
#[template(path = "admin/messages.html")]
struct MessagesTemplate {
    page: Page,
    messages: Vec<ContactMessage>,
}

/// Moderation actions on a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Moderation {
    Block,
    Unblock,
    Delete,
}

/// GET /admin
pub async fn dashboard(
    State(state): State<AppState>,
    Admin(admin): Admin,
    flash: Flash,
) -> Result<impl IntoResponse, AppError> {
    let stats = state.admin.dashboard_stats().await?;
    let recent = state
        .appointments
        .list_recent_appointments(DASHBOARD_APPOINTMENTS)
        .await?;

    Ok(HtmlTemplate(DashboardTemplate {
        page: Page::signed_in("Dashboard", &admin, flash),
        stats,
        recent,
    }))
}

/// GET /admin/users?role=
pub async fn users(
    State(state): State<AppState>,
    Admin(admin): Admin,
    flash: Flash,
    Query(filter): Query<RoleFilter>,
) -> Result<impl IntoResponse, AppError> {
    let role = filter.role();
    let users = state.users.list_users(role).await?;

    Ok(HtmlTemplate(UsersTemplate {
        page: Page::signed_in("Users", &admin, flash),
        users,
        filter: role.map(|r| r.as_str().to_string()).unwrap_or_default(),
        admin_id: admin.id,
    }))
}

/// POST /admin/users/{id}/block
pub async fn block_user(
    State(state): State<AppState>,
    Admin(admin): Admin,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    moderate(&state, &admin, id, Moderation::Block).await
}

/// POST /admin/users/{id}/unblock
pub async fn unblock_user(
    State(state): State<AppState>,
    Admin(admin): Admin,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    moderate(&state, &admin, id, Moderation::Unblock).await
}

/// POST /admin/users/{id}/delete
pub async fn delete_user(
    State(state): State<AppState>,
    Admin(admin): Admin,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    moderate(&state, &admin, id, Moderation::Delete).await
}

/// Applies a moderation action. Blocking and deleting revoke every session
/// of the user.
async fn moderate(
    state: &AppState,
    admin: &User,
    id: Uuid,
    action: Moderation,
) -> Result<Response, AppError> {
    const BACK: &str = "/admin/users";

    if id == admin.id {
        return Ok(redirect_with_flash(
            BACK,
            FlashMessage::error("You cannot change your own account"),
        ));
    }

    let result = match action {
        Moderation::Block => state.users.set_blocked(id, true).await,
        Moderation::Unblock => state.users.set_blocked(id, false).await,
        Moderation::Delete => state.users.soft_delete_user(id).await,
    };
    match result {
        Ok(()) => {}
        Err(err @ RepositoryError::NotFound { .. }) => {
            return Ok(redirect_with_flash(BACK, FlashMessage::error(err.to_string())));
        }
        Err(err) => return Err(err.into()),
    }

    if matches!(action, Moderation::Block | Moderation::Delete) {
        sign_out_everywhere(&state.auth, id).await?;
    }
    tracing::info!(user_id = %id, admin_id = %admin.id, action = ?action, "User moderated");

    let message = match action {
        Moderation::Block => "User blocked",
        Moderation::Unblock => "User unblocked",
        Moderation::Delete => "User deleted",
    };
    Ok(redirect_with_flash(BACK, FlashMessage::success(message)))
}

/// GET /admin/specializations
pub async fn specializations(
    State(state): State<AppState>,
    Admin(admin): Admin,
    flash: Flash,
) -> Result<impl IntoResponse, AppError> {
    let specializations = state.specializations.list_specializations().await?;

    Ok(HtmlTemplate(SpecializationsTemplate {
        page: Page::signed_in("Specializations", &admin, flash),
        specializations,
    }))
}

/// POST /admin/specializations
pub async fn create_specialization(
    State(state): State<AppState>,
    Admin(_): Admin,
    Form(form): Form<SpecializationForm>,
) -> Result<Response, AppError> {
    const BACK: &str = "/admin/specializations";

    let input = match form.validate() {
        Ok(input) => input,
        Err(err) => return Ok(redirect_with_flash(BACK, FlashMessage::error(err.to_string()))),
    };

    let specialization = Specialization::new(input.name, input.description);
    match state
        .specializations
        .create_specialization(&specialization)
        .await
    {
        Err(RepositoryError::AlreadyExists { .. }) => Ok(redirect_with_flash(
            BACK,
            FlashMessage::error(format!(
                "A specialization named \"{}\" already exists",
                specialization.name
            )),
        )),
        result => redirect_after(BACK, result, "Specialization created"),
    }
}

/// POST /admin/specializations/{id}
pub async fn update_specialization(
    State(state): State<AppState>,
    Admin(_): Admin,
    Path(id): Path<Uuid>,
    Form(form): Form<SpecializationForm>,
) -> Result<Response, AppError> {
    const BACK: &str = "/admin/specializations";

    let input = match form.validate() {
        Ok(input) => input,
        Err(err) => return Ok(redirect_with_flash(BACK, FlashMessage::error(err.to_string()))),
    };

    match state.specializations.update_specialization(id, &input).await {
        Err(RepositoryError::AlreadyExists { .. }) => Ok(redirect_with_flash(
            BACK,
            FlashMessage::error(format!(
                "A specialization named \"{}\" already exists",
                input.name
            )),
        )),
        result => redirect_after(BACK, result, "Specialization updated"),
    }
}

/// POST /admin/specializations/{id}/delete
pub async fn delete_specialization(
    State(state): State<AppState>,
    Admin(_): Admin,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let result = state.specializations.delete_specialization(id).await;
    redirect_after("/admin/specializations", result, "Specialization deleted")
}

/// GET /admin/messages
pub async fn messages(
    State(state): State<AppState>,
    Admin(admin): Admin,
    flash: Flash,
) -> Result<impl IntoResponse, AppError> {
    let messages = state.contact.list_contact_messages().await?;

    Ok(HtmlTemplate(MessagesTemplate {
        page: Page::signed_in("Contact messages", &admin, flash),
        messages,
    }))
}

/// POST /admin/messages/{id}/resolve
pub async fn resolve_message(
    State(state): State<AppState>,
    Admin(_): Admin,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let result = state.contact.resolve_contact_message(id).await;
    redirect_after("/admin/messages", result, "Message marked as resolved")
}
