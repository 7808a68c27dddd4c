//! Password authentication and cookie sessions for MediVerse.
//!
//! This crate provides:
//! - argon2 password hashing
//! - Session storage (SQLite via the `sqlite` feature, or in-memory)
//! - Sign-in / sign-out cookie helpers
//! - Axum extractors for the signed-in user

mod config;
mod error;
mod extractors;
mod login;
mod password;
mod sessions;
mod state;

pub use config::AuthConfig;
pub use error::AuthError;
pub use extractors::{AuthRejection, CurrentUser, OptionalUser};
pub use login::{authenticate, session_id_from_jar, sign_in, sign_out, sign_out_everywhere};
pub use password::{hash_password, verify_password};
pub use sessions::MemorySessionStore;
#[cfg(feature = "sqlite")]
pub use sessions::SqliteSessionStore;
pub use state::AuthState;
