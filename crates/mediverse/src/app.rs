use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};

use crate::{
    handlers::{
        accounts, admin, applications, appointments, chats, doctors, flash::clear_flash, health,
        pages, ratings, reports, slots,
    },
    state::AppState,
    uploads::UploadKind,
};

/// Room for the non-file fields of a multipart form.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    let body_limit = state.uploads.max_bytes() + FORM_OVERHEAD_BYTES;
    let photos = ServeDir::new(state.uploads.dir(UploadKind::Photo));

    // JSON endpoints used by the booking widget
    let api_routes = Router::new()
        .route(
            "/doctors/{id}/available-dates",
            get(doctors::available_dates_api),
        )
        .route(
            "/doctors/{id}/available-slots",
            get(doctors::available_slots_api),
        );

    let account_routes = Router::new()
        .route("/login", get(accounts::login_page).post(accounts::login))
        .route("/logout", post(accounts::logout))
        .route(
            "/register",
            get(accounts::register_page).post(accounts::register),
        )
        .route(
            "/profile",
            get(accounts::profile_page).post(accounts::update_profile),
        )
        .route("/profile/photo", post(accounts::upload_photo))
        .route("/profile/password", post(accounts::change_password));

    let clinic_routes = Router::new()
        .route("/doctors", get(doctors::directory))
        .route("/doctors/{id}", get(doctors::doctor_profile))
        .route("/doctors/{id}/book", post(appointments::book))
        .route(
            "/apply",
            get(applications::apply_page).post(applications::submit_application),
        )
        .route("/slots", get(slots::my_slots).post(slots::create_slot))
        .route("/slots/{id}/delete", post(slots::delete_slot))
        .route("/appointments", get(appointments::list))
        .route("/appointments/{id}", get(appointments::detail))
        .route("/appointments/{id}/status", post(appointments::change_status))
        .route(
            "/appointments/{id}/report",
            get(reports::report_form).post(reports::create_report),
        )
        .route("/appointments/{id}/rating", post(ratings::rate))
        .route("/reports", get(reports::list))
        .route("/reports/{id}", get(reports::detail))
        .route("/prescriptions/{id}/print", post(reports::print_prescription))
        .route("/chats", get(chats::list).post(chats::start))
        .route("/chats/{id}", get(chats::thread))
        .route("/chats/{id}/messages", post(chats::post_message))
        .route("/chats/{id}/accept", post(chats::accept))
        .route("/chats/{id}/close", post(chats::close));

    let admin_routes = Router::new()
        .route("/", get(admin::dashboard))
        .route("/users", get(admin::users))
        .route("/users/{id}/block", post(admin::block_user))
        .route("/users/{id}/unblock", post(admin::unblock_user))
        .route("/users/{id}/delete", post(admin::delete_user))
        .route(
            "/specializations",
            get(admin::specializations).post(admin::create_specialization),
        )
        .route(
            "/specializations/{id}",
            post(admin::update_specialization),
        )
        .route(
            "/specializations/{id}/delete",
            post(admin::delete_specialization),
        )
        .route("/applications", get(applications::list_applications))
        .route(
            "/applications/{id}/approve",
            post(applications::approve_application),
        )
        .route(
            "/applications/{id}/reject",
            post(applications::reject_application),
        )
        .route(
            "/applications/{id}/document",
            get(applications::download_document),
        )
        .route("/messages", get(admin::messages))
        .route("/messages/{id}/resolve", post(admin::resolve_message));

    Router::new()
        .route("/", get(pages::home))
        .route("/specializations", get(pages::specializations))
        .route(
            "/contact",
            get(pages::contact_page).post(pages::submit_contact),
        )
        .route("/livez", get(health::livez))
        .route("/readyz", get(health::readyz))
        .merge(account_routes)
        .merge(clinic_routes)
        .nest("/admin", admin_routes)
        .nest("/api", api_routes)
        .nest_service("/uploads/photos", photos)
        .layer(middleware::from_fn(clear_flash))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(10),
        ))
        .with_state(state)
}
