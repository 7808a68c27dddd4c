//! Public pages: home, specializations and the contact form.

use askama::Template;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Form,
};
use chrono::Utc;
use uuid::Uuid;

use mediverse_auth::OptionalUser;
use mediverse_core::clinic::{ContactForm, ContactMessage, DoctorSummary, SpecializationSummary};

use super::{
    flash::{redirect_with_flash, Flash, FlashMessage},
    views::{HtmlTemplate, Page},
    AppError,
};
use crate::state::AppState;

/// How many doctors the home page features.
const FEATURED_DOCTORS: usize = 6;

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    page: Page,
    specializations: Vec<SpecializationSummary>,
    doctors: Vec<DoctorSummary>,
}

#[derive(Template)]
#[template(path = "specializations.html")]
struct SpecializationsTemplate {
    page: Page,
    specializations: Vec<SpecializationSummary>,
}

#[derive(Template)]
#[template(path = "contact.html")]
struct ContactTemplate {
    page: Page,
}

/// GET /
pub async fn home(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    flash: Flash,
) -> Result<impl IntoResponse, AppError> {
    let specializations = state.specializations.list_specializations().await?;

    // Best rated first; unrated doctors keep their name order at the end.
    let mut doctors = state.users.list_doctors(None).await?;
    doctors.sort_by(|a, b| {
        b.rating
            .average
            .unwrap_or(0.0)
            .total_cmp(&a.rating.average.unwrap_or(0.0))
    });
    doctors.truncate(FEATURED_DOCTORS);

    Ok(HtmlTemplate(HomeTemplate {
        page: Page::new("Home", user, flash),
        specializations,
        doctors,
    }))
}

/// GET /specializations
pub async fn specializations(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    flash: Flash,
) -> Result<impl IntoResponse, AppError> {
    let specializations = state.specializations.list_specializations().await?;

    Ok(HtmlTemplate(SpecializationsTemplate {
        page: Page::new("Specializations", user, flash),
        specializations,
    }))
}

/// GET /contact
pub async fn contact_page(OptionalUser(user): OptionalUser, flash: Flash) -> impl IntoResponse {
    HtmlTemplate(ContactTemplate {
        page: Page::new("Contact us", user, flash),
    })
}

/// POST /contact
pub async fn submit_contact(
    State(state): State<AppState>,
    Form(form): Form<ContactForm>,
) -> Result<Response, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(err) => return Ok(redirect_with_flash("/contact", FlashMessage::error(err.to_string()))),
    };

    let message = ContactMessage {
        id: Uuid::new_v4(),
        name: input.name,
        email: input.email,
        subject: input.subject,
        body: input.body,
        is_resolved: false,
        created_at: Utc::now(),
    };
    state.contact.create_contact_message(&message).await?;
    tracing::info!(message_id = %message.id, "Contact message received");

    Ok(redirect_with_flash(
        "/contact",
        FlashMessage::success("Thanks, we will get back to you soon"),
    ))
}
