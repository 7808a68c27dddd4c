//! Credential and redirect validation.

use super::AuthError;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Longest email address accepted by the registration and contact forms.
pub const MAX_EMAIL_LEN: usize = 254;

/// Validates a post-login `return_to` target.
///
/// Only same-site relative paths are accepted: the value must start with a
/// single `/`, must not carry a scheme and must not contain control
/// characters.
///
/// ```
/// use mediverse_core::auth::validate_return_to;
///
/// assert_eq!(validate_return_to("/appointments"), Some("/appointments"));
/// assert_eq!(validate_return_to("//evil.example"), None);
/// assert_eq!(validate_return_to("https://evil.example"), None);
/// ```
pub fn validate_return_to(url: &str) -> Option<&str> {
    if !url.starts_with('/') || url.starts_with("//") {
        return None;
    }

    if url.chars().any(|c| c.is_control()) || url.contains("://") {
        return None;
    }

    // Browsers treat a backslash like a slash, so "/\evil.example" is protocol-relative.
    if url.starts_with("/\\") {
        return None;
    }

    Some(url)
}

/// Trims and lowercases an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Checks the shape of an (already normalized) email address.
///
/// One `@`, a non-empty local part, and a domain containing a dot that is
/// neither leading nor trailing.
pub fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.len() > MAX_EMAIL_LEN || email.contains(char::is_whitespace) {
        return false;
    }

    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };

    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

/// Applies the password policy to a new password and its confirmation.
pub fn check_new_password(password: &str, confirmation: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword(MIN_PASSWORD_LEN));
    }
    if password != confirmation {
        return Err(AuthError::PasswordMismatch);
    }
    Ok(())
}
