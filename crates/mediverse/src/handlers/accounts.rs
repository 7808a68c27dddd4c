//! Registration, sign-in and the profile pages.

use askama::Template;
use axum::{
    extract::{Multipart, Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use mediverse_auth::{
    authenticate, hash_password, sign_in, sign_out, sign_out_everywhere, verify_password,
    CurrentUser, OptionalUser,
};
use mediverse_core::auth::{check_new_password, normalize_email, validate_return_to};
use mediverse_core::clinic::{
    age_on, LoginForm, PasswordForm, ProfileForm, RegisterForm, User,
};
use mediverse_core::notify;
use mediverse_core::storage::RepositoryError;

use super::{
    flash::{redirect_with_flash, Flash, FlashMessage},
    multipart::MultipartForm,
    views::{today, HtmlTemplate, Page},
    AppError,
};
use crate::{mail::deliver, state::AppState, uploads::UploadKind};

#[derive(Deserialize, Default)]
pub struct LoginQuery {
    pub return_to: Option<String>,
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    page: Page,
    return_to: String,
}

#[derive(Template)]
#[template(path = "register.html")]
struct RegisterTemplate {
    page: Page,
}

#[derive(Template)]
#[template(path = "profile.html")]
struct ProfileTemplate {
    page: Page,
    profile: User,
    age: Option<u32>,
}

/// GET /login
pub async fn login_page(
    OptionalUser(user): OptionalUser,
    flash: Flash,
    Query(query): Query<LoginQuery>,
) -> Response {
    let return_to = query
        .return_to
        .as_deref()
        .and_then(validate_return_to)
        .unwrap_or("/")
        .to_string();

    if user.is_some() {
        return Redirect::to(&return_to).into_response();
    }

    HtmlTemplate(LoginTemplate {
        page: Page::new("Sign in", None, flash),
        return_to,
    })
    .into_response()
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let return_to = form
        .return_to
        .as_deref()
        .and_then(validate_return_to)
        .unwrap_or("/")
        .to_string();

    let email = normalize_email(&form.email);
    let user = match authenticate(&state.auth, &email, &form.password).await {
        Ok(user) => user,
        Err(err) if err.core().is_some_and(|core| core.is_user_facing()) => {
            tracing::info!(email = %email, reason = %err, "Sign-in refused");
            let url = format!("/login?return_to={}", urlencoding::encode(&return_to));
            return Ok(redirect_with_flash(&url, FlashMessage::error(err.to_string())));
        }
        Err(err) => return Err(err.into()),
    };

    let jar = sign_in(&state.auth, user.id, jar).await?;
    Ok((jar, Redirect::to(&return_to)).into_response())
}

/// POST /logout
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Result<Response, AppError> {
    let jar = sign_out(&state.auth, jar).await?;
    Ok((jar, Redirect::to("/")).into_response())
}

/// GET /register
pub async fn register_page(OptionalUser(user): OptionalUser, flash: Flash) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }
    HtmlTemplate(RegisterTemplate {
        page: Page::new("Create an account", None, flash),
    })
    .into_response()
}

/// POST /register
///
/// Creates a patient account, sends the welcome email and signs in.
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let account = match form.validate() {
        Ok(account) => account,
        Err(err) => return Ok(redirect_with_flash("/register", FlashMessage::error(err.to_string()))),
    };
    if let Err(err) = check_new_password(&form.password, &form.password_confirm) {
        return Ok(redirect_with_flash("/register", FlashMessage::error(err.to_string())));
    }

    let user = User::new_patient(account.name, account.email, hash_password(&form.password)?);
    match state.users.create_user(&user).await {
        Ok(()) => {}
        Err(RepositoryError::AlreadyExists { .. }) => {
            return Ok(redirect_with_flash(
                "/register",
                FlashMessage::error("An account with this email already exists"),
            ));
        }
        Err(err) => return Err(err.into()),
    }
    tracing::info!(user_id = %user.id, "Patient registered");

    deliver(state.mailer.as_ref(), notify::welcome(&user)).await;

    let jar = sign_in(&state.auth, user.id, jar).await?;
    Ok((
        jar,
        redirect_with_flash("/", FlashMessage::success("Welcome to MediVerse!")),
    )
        .into_response())
}

/// GET /profile
pub async fn profile_page(CurrentUser(user): CurrentUser, flash: Flash) -> impl IntoResponse {
    let age = user.date_of_birth.map(|dob| age_on(dob, today()));
    HtmlTemplate(ProfileTemplate {
        page: Page::signed_in("My profile", &user, flash),
        profile: user,
        age,
    })
}

/// POST /profile
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    let update = match form.validate(today()) {
        Ok(update) => update,
        Err(err) => return Ok(redirect_with_flash("/profile", FlashMessage::error(err.to_string()))),
    };

    state.users.update_profile(user.id, &update).await?;
    Ok(redirect_with_flash("/profile", FlashMessage::success("Profile updated")))
}

/// POST /profile/photo
pub async fn upload_photo(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let stored = async {
        let form = MultipartForm::collect(multipart, state.uploads.max_bytes()).await?;
        let photo = form.file("photo")?;
        state
            .uploads
            .save(UploadKind::Photo, &photo.file_name, &photo.bytes)
            .await
    }
    .await;

    let stored = match stored {
        Ok(stored) => stored,
        Err(err) if err.is_user_facing() => {
            return Ok(redirect_with_flash("/profile", FlashMessage::error(err.to_string())));
        }
        Err(err) => return Err(err.into()),
    };

    if let Err(err) = state.users.set_profile_image(user.id, &stored).await {
        state.uploads.discard(&stored).await;
        return Err(err.into());
    }
    if let Some(previous) = &user.profile_image {
        state.uploads.discard(previous).await;
    }
    Ok(redirect_with_flash("/profile", FlashMessage::success("Photo updated")))
}

/// POST /profile/password
///
/// Every other session of the user is revoked; the current browser gets a
/// fresh session.
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    Form(form): Form<PasswordForm>,
) -> Result<Response, AppError> {
    if !verify_password(&form.current_password, &user.password_hash)? {
        return Ok(redirect_with_flash(
            "/profile",
            FlashMessage::error("Current password is incorrect"),
        ));
    }
    if let Err(err) = check_new_password(&form.new_password, &form.new_password_confirm) {
        return Ok(redirect_with_flash("/profile", FlashMessage::error(err.to_string())));
    }

    state
        .users
        .update_password(user.id, &hash_password(&form.new_password)?)
        .await?;
    sign_out_everywhere(&state.auth, user.id).await?;
    let jar = sign_in(&state.auth, user.id, jar).await?;

    Ok((
        jar,
        redirect_with_flash("/profile", FlashMessage::success("Password changed")),
    )
        .into_response())
}
