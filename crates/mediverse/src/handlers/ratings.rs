use axum::{
    extract::{Path, State},
    response::Response,
    Form,
};
use chrono::Utc;
use uuid::Uuid;

use mediverse_core::clinic::{Rating, RatingForm};
use mediverse_core::storage::RepositoryError;

use super::{
    authz::{AuthzError, Patient},
    flash::{redirect_after, redirect_with_flash, FlashMessage},
    AppError,
};
use crate::state::AppState;

/// POST /appointments/{id}/rating
///
/// The repository enforces "completed, own appointment, once".
pub async fn rate(
    State(state): State<AppState>,
    Patient(patient): Patient,
    Path(id): Path<Uuid>,
    Form(form): Form<RatingForm>,
) -> Result<Response, AppError> {
    let back = format!("/appointments/{id}");
    let input = match form.validate() {
        Ok(input) => input,
        Err(err) => return Ok(redirect_with_flash(&back, FlashMessage::error(err.to_string()))),
    };

    let detail = state
        .appointments
        .get_appointment(id)
        .await?
        .ok_or_else(|| RepositoryError::not_found("Appointment", id))?;
    if detail.appointment.patient_id != patient.id {
        return Err(AuthzError::NotParticipant("appointment").into());
    }

    let rating = Rating {
        id: Uuid::new_v4(),
        appointment_id: id,
        patient_id: patient.id,
        doctor_id: detail.appointment.doctor_id,
        score: input.score,
        comment: input.comment,
        created_at: Utc::now(),
    };
    let result = state.ratings.create_rating(&rating).await;
    if result.is_ok() {
        tracing::info!(appointment_id = %id, doctor_id = %rating.doctor_id, score = rating.score, "Appointment rated");
    }
    redirect_after(&back, result, "Thanks for your rating")
}
