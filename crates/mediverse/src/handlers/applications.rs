//! Doctor applications: patients apply with a supporting document, admins
//! review and decide.

use askama::Template;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Form,
};
use chrono::Utc;
use uuid::Uuid;

use mediverse_core::clinic::{
    ApplicationDetail, ApplicationFilter, ApplicationForm, ApplicationStatus, DoctorApplication,
    RejectForm, SpecializationSummary,
};
use mediverse_core::notify;
use mediverse_core::storage::RepositoryError;

use super::{
    authz::{Admin, Patient},
    flash::{redirect_with_flash, Flash, FlashMessage},
    multipart::MultipartForm,
    views::{HtmlTemplate, Page},
    AppError,
};
use crate::{
    mail::deliver,
    state::AppState,
    uploads::{content_type, UploadError, UploadKind},
};

#[derive(Template)]
#[template(path = "apply.html")]
struct ApplyTemplate {
    page: Page,
    latest: Option<ApplicationDetail>,
    specializations: Vec<SpecializationSummary>,
}

impl ApplyTemplate {
    fn can_apply(&self) -> bool {
        !matches!(
            self.latest.as_ref().map(|l| l.application.status),
            Some(ApplicationStatus::Pending)
        )
    }
}

#[derive(Template)]
#[template(path = "admin/applications.html")]
struct ApplicationsTemplate {
    page: Page,
    applications: Vec<ApplicationDetail>,
    filter: String,
}

/// GET /apply
pub async fn apply_page(
    State(state): State<AppState>,
    Patient(user): Patient,
    flash: Flash,
) -> Result<impl IntoResponse, AppError> {
    let latest = state.applications.latest_application_for_user(user.id).await?;
    let specializations = state.specializations.list_specializations().await?;

    Ok(HtmlTemplate(ApplyTemplate {
        page: Page::signed_in("Become a doctor", &user, flash),
        latest,
        specializations,
    }))
}

/// POST /apply
///
/// The document is written before the row and removed again when the
/// application is refused.
pub async fn submit_application(
    State(state): State<AppState>,
    Patient(user): Patient,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = match MultipartForm::collect(multipart, state.uploads.max_bytes()).await {
        Ok(form) => form,
        Err(err) => return upload_failure(err),
    };

    let input = match (ApplicationForm {
        specialization_id: form.text("specialization_id"),
        qualification: form.text("qualification"),
        experience_years: form.text("experience_years"),
        license_number: form.text("license_number"),
        bio: form.optional_text("bio"),
    })
    .validate()
    {
        Ok(input) => input,
        Err(err) => return Ok(redirect_with_flash("/apply", FlashMessage::error(err.to_string()))),
    };

    if state
        .specializations
        .get_specialization(input.specialization_id)
        .await?
        .is_none()
    {
        return Ok(redirect_with_flash(
            "/apply",
            FlashMessage::error("Please pick a specialization from the list"),
        ));
    }

    let document = match form.file("document") {
        Ok(file) => {
            state
                .uploads
                .save(UploadKind::Document, &file.file_name, &file.bytes)
                .await
        }
        Err(err) => Err(err),
    };
    let document = match document {
        Ok(stored) => stored,
        Err(err) => return upload_failure(err),
    };

    let application = DoctorApplication {
        id: Uuid::new_v4(),
        user_id: user.id,
        specialization_id: input.specialization_id,
        qualification: input.qualification,
        experience_years: input.experience_years,
        license_number: input.license_number,
        bio: input.bio,
        document,
        status: ApplicationStatus::Pending,
        review_note: None,
        created_at: Utc::now(),
        reviewed_at: None,
    };

    match state.applications.create_application(&application).await {
        Ok(()) => {
            tracing::info!(application_id = %application.id, user_id = %user.id, "Doctor application submitted");
            Ok(redirect_with_flash(
                "/apply",
                FlashMessage::success("Application submitted, we will review it shortly"),
            ))
        }
        Err(err) => {
            state.uploads.discard(&application.document).await;
            if err.is_user_facing() {
                Ok(redirect_with_flash("/apply", FlashMessage::error(err.to_string())))
            } else {
                Err(err.into())
            }
        }
    }
}

fn upload_failure(err: UploadError) -> Result<Response, AppError> {
    if err.is_user_facing() {
        Ok(redirect_with_flash("/apply", FlashMessage::error(err.to_string())))
    } else {
        Err(err.into())
    }
}

/// GET /admin/applications?status=
pub async fn list_applications(
    State(state): State<AppState>,
    Admin(admin): Admin,
    flash: Flash,
    Query(filter): Query<ApplicationFilter>,
) -> Result<impl IntoResponse, AppError> {
    let status = filter.status();
    let applications = state.applications.list_applications(status).await?;

    Ok(HtmlTemplate(ApplicationsTemplate {
        page: Page::signed_in("Doctor applications", &admin, flash),
        applications,
        filter: status.map(|s| s.as_str().to_string()).unwrap_or_default(),
    }))
}

/// POST /admin/applications/{id}/approve
pub async fn approve_application(
    State(state): State<AppState>,
    Admin(admin): Admin,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let decided = state.applications.approve_application(id, Utc::now()).await;
    finish_decision(&state, decided, "Application approved", admin.id).await
}

/// POST /admin/applications/{id}/reject
pub async fn reject_application(
    State(state): State<AppState>,
    Admin(admin): Admin,
    Path(id): Path<Uuid>,
    Form(form): Form<RejectForm>,
) -> Result<Response, AppError> {
    let note = match form.validate() {
        Ok(note) => note,
        Err(err) => {
            return Ok(redirect_with_flash(
                "/admin/applications",
                FlashMessage::error(err.to_string()),
            ));
        }
    };
    let decided = state
        .applications
        .reject_application(id, note, Utc::now())
        .await;
    finish_decision(&state, decided, "Application rejected", admin.id).await
}

async fn finish_decision(
    state: &AppState,
    decided: Result<ApplicationDetail, RepositoryError>,
    success: &str,
    admin_id: Uuid,
) -> Result<Response, AppError> {
    let detail = match decided {
        Ok(detail) => detail,
        Err(err) if err.is_user_facing() => {
            return Ok(redirect_with_flash(
                "/admin/applications",
                FlashMessage::error(err.to_string()),
            ));
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!(
        application_id = %detail.application.id,
        status = %detail.application.status,
        admin_id = %admin_id,
        "Doctor application decided"
    );
    deliver(
        state.mailer.as_ref(),
        notify::application_decided(
            &detail.applicant_name,
            &detail.applicant_email,
            detail.application.status,
            detail.application.review_note.as_deref(),
        ),
    )
    .await;

    Ok(redirect_with_flash("/admin/applications", FlashMessage::success(success)))
}

/// GET /admin/applications/{id}/document
pub async fn download_document(
    State(state): State<AppState>,
    Admin(_): Admin,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let detail = state
        .applications
        .get_application(id)
        .await?
        .ok_or_else(|| RepositoryError::not_found("Application", id))?;

    let stored = detail.application.document;
    let bytes = state.uploads.read(&stored).await?;
    let file_name = stored.rsplit('/').next().unwrap_or("document");

    Ok((
        [
            (header::CONTENT_TYPE, content_type(&stored).to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
