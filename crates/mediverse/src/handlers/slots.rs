//! Doctor slot management.

use askama::Template;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Form,
};
use uuid::Uuid;

use mediverse_core::clinic::{Slot, SlotForm, SlotListing};

use super::{
    authz::Doctor,
    flash::{redirect_after, redirect_with_flash, Flash, FlashMessage},
    views::{today, HtmlTemplate, Page},
    AppError,
};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "slots.html")]
struct SlotsTemplate {
    page: Page,
    slots: Vec<SlotListing>,
    today: String,
}

/// GET /slots
pub async fn my_slots(
    State(state): State<AppState>,
    Doctor(doctor): Doctor,
    flash: Flash,
) -> Result<impl IntoResponse, AppError> {
    let today = today();
    let slots = state.slots.list_doctor_slots(doctor.id, today).await?;

    Ok(HtmlTemplate(SlotsTemplate {
        page: Page::signed_in("My slots", &doctor, flash),
        slots,
        today: today.format("%Y-%m-%d").to_string(),
    }))
}

/// POST /slots
pub async fn create_slot(
    State(state): State<AppState>,
    Doctor(doctor): Doctor,
    Form(form): Form<SlotForm>,
) -> Result<Response, AppError> {
    let input = match form.validate(today()) {
        Ok(input) => input,
        Err(err) => return Ok(redirect_with_flash("/slots", FlashMessage::error(err.to_string()))),
    };

    let slot = Slot::new(doctor.id, input.date, input.start_time, input.end_time);
    let result = state.slots.create_slot(&slot).await;
    if result.is_ok() {
        tracing::info!(slot_id = %slot.id, doctor_id = %doctor.id, date = %slot.date, "Slot created");
    }
    redirect_after("/slots", result, "Slot created")
}

/// POST /slots/{id}/delete
pub async fn delete_slot(
    State(state): State<AppState>,
    Doctor(doctor): Doctor,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let result = state.slots.delete_slot(doctor.id, id).await;
    redirect_after("/slots", result, "Slot deleted")
}
