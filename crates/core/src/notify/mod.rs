//! Outgoing email notifications.
//!
//! Bodies are plain text built by pure functions; delivery goes through the
//! [`Mailer`] trait so handlers never depend on SMTP.

mod error;
mod messages;

use async_trait::async_trait;

pub use error::NotifyError;
pub use messages::{
    application_decided, appointment_booked_doctor, appointment_booked_patient,
    appointment_status_changed, report_ready, welcome,
};

/// A plain-text email ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Email delivery backend.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), NotifyError>;
}
