//! Medical reports and one-time prescription printing.

use askama::Template;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use chrono::Utc;
use uuid::Uuid;

use mediverse_auth::CurrentUser;
use mediverse_core::clinic::{
    AppointmentDetail, AppointmentStatus, MedicalReport, PrescriptionDetail, ReportDetail,
    ReportForm, Role,
};
use mediverse_core::notify;
use mediverse_core::storage::RepositoryError;

use super::{
    authz::{AuthzError, Doctor, Patient},
    flash::{redirect_with_flash, Flash, FlashMessage},
    views::{HtmlTemplate, Page},
    AppError,
};
use crate::{mail::deliver, state::AppState};

#[derive(Template)]
#[template(path = "report_form.html")]
struct ReportFormTemplate {
    page: Page,
    detail: AppointmentDetail,
}

#[derive(Template)]
#[template(path = "reports.html")]
struct ReportsTemplate {
    page: Page,
    reports: Vec<ReportDetail>,
}

#[derive(Template)]
#[template(path = "report.html")]
struct ReportTemplate {
    page: Page,
    detail: ReportDetail,
    can_print: bool,
}

#[derive(Template)]
#[template(path = "prescription.html")]
struct PrescriptionTemplate {
    prescription: PrescriptionDetail,
}

/// The doctor's own completed appointment that has no report yet.
async fn reportable_appointment(
    state: &AppState,
    doctor_id: Uuid,
    appointment_id: Uuid,
) -> Result<Result<AppointmentDetail, &'static str>, AppError> {
    let detail = state
        .appointments
        .get_appointment(appointment_id)
        .await?
        .filter(|detail| detail.appointment.doctor_id == doctor_id)
        .ok_or_else(|| RepositoryError::not_found("Appointment", appointment_id))?;

    if detail.appointment.status != AppointmentStatus::Completed {
        return Ok(Err("Reports can only be written for completed appointments"));
    }
    if state
        .reports
        .report_for_appointment(appointment_id)
        .await?
        .is_some()
    {
        return Ok(Err("This appointment already has a report"));
    }
    Ok(Ok(detail))
}

/// GET /appointments/{id}/report
pub async fn report_form(
    State(state): State<AppState>,
    Doctor(doctor): Doctor,
    flash: Flash,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let detail = match reportable_appointment(&state, doctor.id, id).await? {
        Ok(detail) => detail,
        Err(message) => {
            return Ok(redirect_with_flash(
                &format!("/appointments/{id}"),
                FlashMessage::error(message),
            ));
        }
    };

    Ok(HtmlTemplate(ReportFormTemplate {
        page: Page::signed_in("Write report", &doctor, flash),
        detail,
    })
    .into_response())
}

/// POST /appointments/{id}/report
///
/// Medicine rows arrive as repeated form keys, hence the `axum_extra` form.
pub async fn create_report(
    State(state): State<AppState>,
    Doctor(doctor): Doctor,
    Path(id): Path<Uuid>,
    Form(form): Form<ReportForm>,
) -> Result<Response, AppError> {
    let form_url = format!("/appointments/{id}/report");
    let input = match form.validate() {
        Ok(input) => input,
        Err(err) => return Ok(redirect_with_flash(&form_url, FlashMessage::error(err.to_string()))),
    };
    let detail = match reportable_appointment(&state, doctor.id, id).await? {
        Ok(detail) => detail,
        Err(message) => {
            return Ok(redirect_with_flash(
                &format!("/appointments/{id}"),
                FlashMessage::error(message),
            ));
        }
    };

    let report = MedicalReport {
        id: Uuid::new_v4(),
        appointment_id: id,
        patient_id: detail.appointment.patient_id,
        doctor_id: doctor.id,
        diagnosis: input.diagnosis,
        notes: input.notes,
        created_at: Utc::now(),
    };
    match state.reports.create_report(&report, &input.medicines).await {
        Ok(()) => {}
        Err(err) if err.is_user_facing() => {
            return Ok(redirect_with_flash(
                &format!("/appointments/{id}"),
                FlashMessage::error(err.to_string()),
            ));
        }
        Err(err) => return Err(err.into()),
    }
    tracing::info!(
        report_id = %report.id,
        appointment_id = %id,
        medicines = input.medicines.len(),
        "Medical report written"
    );

    deliver(state.mailer.as_ref(), notify::report_ready(&detail)).await;

    Ok(redirect_with_flash(
        &format!("/reports/{}", report.id),
        FlashMessage::success("Report saved"),
    ))
}

/// GET /reports
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    flash: Flash,
) -> Result<impl IntoResponse, AppError> {
    let reports = match user.role {
        Role::Patient => state.reports.list_patient_reports(user.id).await?,
        Role::Doctor => state.reports.list_doctor_reports(user.id).await?,
        Role::Admin => Vec::new(),
    };

    Ok(HtmlTemplate(ReportsTemplate {
        page: Page::signed_in("Medical reports", &user, flash),
        reports,
    }))
}

/// GET /reports/{id}
pub async fn detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    flash: Flash,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = state
        .reports
        .get_report(id)
        .await?
        .ok_or_else(|| RepositoryError::not_found("Report", id))?;

    let report = &detail.report;
    if report.patient_id != user.id && report.doctor_id != user.id && user.role != Role::Admin {
        return Err(AuthzError::NotParticipant("report").into());
    }

    Ok(HtmlTemplate(ReportTemplate {
        can_print: report.patient_id == user.id,
        page: Page::signed_in("Medical report", &user, flash),
        detail,
    }))
}

/// POST /prescriptions/{id}/print
///
/// Redeems the prescribed medicine and renders the printable prescription.
/// A prescription prints once; later attempts are refused.
pub async fn print_prescription(
    State(state): State<AppState>,
    Patient(patient): Patient,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    match state
        .reports
        .redeem_prescription(id, patient.id, Utc::now())
        .await
    {
        Ok(prescription) => {
            tracing::info!(medicine_id = %id, patient_id = %patient.id, "Prescription redeemed");
            Ok(HtmlTemplate(PrescriptionTemplate { prescription }).into_response())
        }
        Err(RepositoryError::Conflict(message)) => {
            tracing::info!(medicine_id = %id, patient_id = %patient.id, "Prescription already used");
            let back = match state.reports.get_prescription(id).await? {
                Some(prescription) => format!("/reports/{}", prescription.report_id),
                None => "/reports".to_string(),
            };
            Ok(redirect_with_flash(&back, FlashMessage::error(message)))
        }
        Err(err) => Err(err.into()),
    }
}
