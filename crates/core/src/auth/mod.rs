mod error;
#[cfg(feature = "auth")]
mod functions;
mod traits;
mod types;
mod validation;

pub use error::AuthError;
#[cfg(feature = "auth")]
pub use functions::{calculate_expiry, generate_session_id, is_session_expired};
pub use traits::{Result, SessionRepository};
pub use types::{Session, SessionId};
pub use validation::{
    check_new_password, is_valid_email, normalize_email, validate_return_to, MAX_EMAIL_LEN,
    MIN_PASSWORD_LEN,
};
