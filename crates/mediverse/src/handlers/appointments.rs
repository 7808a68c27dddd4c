//! Booking, appointment lists and the appointment status machine.

use askama::Template;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use uuid::Uuid;

use mediverse_auth::CurrentUser;
use mediverse_core::clinic::{
    check_appointment_transition, AppointmentDetail, AppointmentStatus, BookingForm,
    MedicalReport, Rating, Role, User,
};
use mediverse_core::notify;
use mediverse_core::storage::{NewBooking, RepositoryError};

use super::{
    authz::{AuthzError, Patient},
    flash::{redirect_with_flash, Flash, FlashMessage},
    views::{local_now, HtmlTemplate, Page},
    AppError,
};
use crate::{mail::deliver, state::AppState};

/// How many appointments the admin list shows.
const RECENT_APPOINTMENTS: u32 = 100;

#[derive(Template)]
#[template(path = "appointments.html")]
struct AppointmentsTemplate {
    page: Page,
    appointments: Vec<AppointmentDetail>,
}

#[derive(Template)]
#[template(path = "appointment.html")]
struct AppointmentTemplate {
    page: Page,
    detail: AppointmentDetail,
    report: Option<MedicalReport>,
    rating: Option<Rating>,
    is_patient: bool,
    is_doctor: bool,
}

impl AppointmentTemplate {
    fn status(&self) -> AppointmentStatus {
        self.detail.appointment.status
    }

    fn can_confirm(&self) -> bool {
        self.is_doctor && self.status() == AppointmentStatus::Pending
    }

    fn can_complete(&self) -> bool {
        self.is_doctor && self.status() == AppointmentStatus::Confirmed
    }

    fn can_cancel(&self) -> bool {
        (self.is_doctor || self.is_patient) && self.status().can_transition_to(AppointmentStatus::Canceled)
    }

    fn can_write_report(&self) -> bool {
        self.is_doctor && self.status() == AppointmentStatus::Completed && self.report.is_none()
    }

    fn can_rate(&self) -> bool {
        self.is_patient && self.status() == AppointmentStatus::Completed && self.rating.is_none()
    }
}

#[derive(Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Loads an appointment the user may see: its patient, its doctor or an admin.
pub(super) async fn visible_appointment(
    state: &AppState,
    user: &User,
    id: Uuid,
) -> Result<AppointmentDetail, AppError> {
    let detail = state
        .appointments
        .get_appointment(id)
        .await?
        .ok_or_else(|| RepositoryError::not_found("Appointment", id))?;

    if detail.involves(user.id) || user.role == Role::Admin {
        Ok(detail)
    } else {
        Err(AuthzError::NotParticipant("appointment").into())
    }
}

/// POST /doctors/{id}/book
pub async fn book(
    State(state): State<AppState>,
    Patient(patient): Patient,
    Path(doctor_id): Path<Uuid>,
    Form(form): Form<BookingForm>,
) -> Result<Response, AppError> {
    let back = format!("/doctors/{doctor_id}");
    let input = match form.validate() {
        Ok(input) => input,
        Err(err) => return Ok(redirect_with_flash(&back, FlashMessage::error(err.to_string()))),
    };

    let booking = NewBooking {
        patient_id: patient.id,
        doctor_id,
        slot_id: input.slot_id,
        reason: input.reason,
    };
    let appointment = match state.appointments.book_appointment(&booking, local_now()).await {
        Ok(appointment) => appointment,
        Err(err) if err.is_user_facing() => {
            tracing::info!(slot_id = %booking.slot_id, patient_id = %patient.id, reason = %err, "Booking refused");
            return Ok(redirect_with_flash(&back, FlashMessage::error(err.to_string())));
        }
        Err(err) => return Err(err.into()),
    };
    tracing::info!(
        appointment_id = %appointment.id,
        slot_id = %appointment.slot_id,
        patient_id = %patient.id,
        "Appointment booked"
    );

    if let Some(detail) = state.appointments.get_appointment(appointment.id).await? {
        deliver(state.mailer.as_ref(), notify::appointment_booked_patient(&detail)).await;
        deliver(state.mailer.as_ref(), notify::appointment_booked_doctor(&detail)).await;
    }

    Ok(redirect_with_flash(
        &format!("/appointments/{}", appointment.id),
        FlashMessage::success("Appointment booked"),
    ))
}

/// GET /appointments
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    flash: Flash,
) -> Result<impl IntoResponse, AppError> {
    let appointments = match user.role {
        Role::Patient => state.appointments.list_patient_appointments(user.id).await?,
        Role::Doctor => state.appointments.list_doctor_appointments(user.id).await?,
        Role::Admin => {
            state
                .appointments
                .list_recent_appointments(RECENT_APPOINTMENTS)
                .await?
        }
    };

    Ok(HtmlTemplate(AppointmentsTemplate {
        page: Page::signed_in("Appointments", &user, flash),
        appointments,
    }))
}

/// GET /appointments/{id}
pub async fn detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    flash: Flash,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = visible_appointment(&state, &user, id).await?;
    let report = state.reports.report_for_appointment(id).await?;
    let rating = state.ratings.rating_for_appointment(id).await?;

    Ok(HtmlTemplate(AppointmentTemplate {
        is_patient: detail.appointment.patient_id == user.id,
        is_doctor: detail.appointment.doctor_id == user.id,
        page: Page::signed_in("Appointment", &user, flash),
        detail,
        report,
        rating,
    }))
}

/// POST /appointments/{id}/status
///
/// Doctors confirm and complete; either participant cancels.
pub async fn change_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Form(form): Form<StatusForm>,
) -> Result<Response, AppError> {
    let back = format!("/appointments/{id}");
    let detail = state
        .appointments
        .get_appointment(id)
        .await?
        .ok_or_else(|| RepositoryError::not_found("Appointment", id))?;
    if !detail.involves(user.id) {
        return Err(AuthzError::NotParticipant("appointment").into());
    }

    let Ok(to) = form.status.parse::<AppointmentStatus>() else {
        return Ok(redirect_with_flash(&back, FlashMessage::error("Unknown status")));
    };
    let doctor_only = matches!(to, AppointmentStatus::Confirmed | AppointmentStatus::Completed);
    if doctor_only && detail.appointment.doctor_id != user.id {
        return Err(AuthzError::WrongRole {
            required: Role::Doctor,
        }
        .into());
    }

    let from = detail.appointment.status;
    if let Err(err) = check_appointment_transition(from, to) {
        return Ok(redirect_with_flash(&back, FlashMessage::error(err.to_string())));
    }

    match state.appointments.transition_appointment(id, from, to).await {
        Ok(()) => {}
        Err(err) if err.is_user_facing() => {
            return Ok(redirect_with_flash(&back, FlashMessage::error(err.to_string())));
        }
        Err(err) => return Err(err.into()),
    }
    tracing::info!(appointment_id = %id, from = %from, to = %to, user_id = %user.id, "Appointment status changed");

    deliver(
        state.mailer.as_ref(),
        notify::appointment_status_changed(&detail, to),
    )
    .await;

    Ok(redirect_with_flash(
        &back,
        FlashMessage::success(format!("Appointment {to}")),
    ))
}
