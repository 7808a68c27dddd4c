//! Doctor directory, doctor profile with the booking widget, and the two
//! availability endpoints used by the widget.

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mediverse_auth::OptionalUser;
use mediverse_core::clinic::{
    available_dates, bookable_slots_on, format_time, DateQuery, DoctorFilter, DoctorSummary,
    RatingView, Slot, SpecializationSummary,
};
use mediverse_core::storage::RepositoryError;

use super::{
    flash::Flash,
    views::{local_now, HtmlTemplate, Page},
    AppError,
};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "doctors.html")]
struct DirectoryTemplate {
    page: Page,
    doctors: Vec<DoctorSummary>,
    specializations: Vec<SpecializationSummary>,
    selected: Option<Uuid>,
}

impl DirectoryTemplate {
    fn is_selected(&self, id: &Uuid) -> bool {
        self.selected.as_ref() == Some(id)
    }
}

/// Bookable slots of one day.
struct DaySlots {
    date: NaiveDate,
    slots: Vec<Slot>,
}

#[derive(Template)]
#[template(path = "doctor.html")]
struct DoctorTemplate {
    page: Page,
    doctor: DoctorSummary,
    ratings: Vec<RatingView>,
    days: Vec<DaySlots>,
}

async fn find_doctor(state: &AppState, id: Uuid) -> Result<DoctorSummary, AppError> {
    state
        .users
        .get_doctor(id)
        .await?
        .ok_or_else(|| RepositoryError::not_found("Doctor", id).into())
}

/// GET /doctors
///
/// An unknown or malformed `specialization` filter shows every doctor.
pub async fn directory(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    flash: Flash,
    Query(filter): Query<DoctorFilter>,
) -> Result<impl IntoResponse, AppError> {
    let selected = filter.specialization_id();

    let doctors = state.users.list_doctors(selected).await?;
    let specializations = state.specializations.list_specializations().await?;

    Ok(HtmlTemplate(DirectoryTemplate {
        page: Page::new("Find a doctor", user, flash),
        doctors,
        specializations,
        selected,
    }))
}

/// GET /doctors/{id}
pub async fn doctor_profile(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    flash: Flash,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let doctor = find_doctor(&state, id).await?;
    let ratings = state.ratings.list_doctor_ratings(id).await?;

    let now = local_now();
    let slots = state.slots.available_slots(id, now).await?;
    let days = available_dates(&slots, now)
        .into_iter()
        .map(|date| DaySlots {
            date,
            slots: bookable_slots_on(&slots, date, now).into_iter().cloned().collect(),
        })
        .collect();

    Ok(HtmlTemplate(DoctorTemplate {
        page: Page::new(doctor.doctor.name.clone(), user, flash),
        doctor,
        ratings,
        days,
    }))
}

/// One bookable slot in the availability API.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotJson {
    pub id: Uuid,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
}

impl From<&Slot> for SlotJson {
    fn from(slot: &Slot) -> Self {
        Self {
            id: slot.id,
            date: slot.date,
            start_time: format_time(slot.start_time),
            end_time: format_time(slot.end_time),
        }
    }
}

/// GET /api/doctors/{id}/available-dates
///
/// Sorted, de-duplicated dates that still have a bookable slot.
pub async fn available_dates_api(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<NaiveDate>>, AppError> {
    find_doctor(&state, id).await?;

    let now = local_now();
    let slots = state.slots.available_slots(id, now).await?;
    Ok(Json(available_dates(&slots, now)))
}

/// GET /api/doctors/{id}/available-slots?date=YYYY-MM-DD
pub async fn available_slots_api(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Vec<SlotJson>>, AppError> {
    let date = query.parse()?;
    find_doctor(&state, id).await?;

    let now = local_now();
    let slots = state.slots.available_slots(id, now).await?;
    Ok(Json(
        bookable_slots_on(&slots, date, now)
            .into_iter()
            .map(SlotJson::from)
            .collect(),
    ))
}
