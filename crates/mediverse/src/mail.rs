//! Email delivery backends.
//!
//! [`SmtpMailer`] talks to a real relay through `lettre`. [`LogMailer`] only
//! logs what would have been sent and is used when no SMTP host is configured.

use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use mediverse_core::notify::{Email, Mailer, NotifyError};

use crate::config::SmtpConfig;

/// Upper bound for one delivery attempt. A booking sends two emails, which
/// must both fit inside the request timeout.
pub const MAIL_TIMEOUT: Duration = Duration::from_secs(3);

/// Sends plain-text mail through an SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig, from: &str) -> Result<Self, NotifyError> {
        let from = parse_mailbox(from)?;

        let mut builder = if config.tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| NotifyError::Transport(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };
        builder = builder.port(config.port).timeout(Some(MAIL_TIMEOUT));

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.parse().map_err(|e: lettre::address::AddressError| {
        NotifyError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        }
    })
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &Email) -> Result<(), NotifyError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(&email.to)?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        tracing::debug!(to = %email.to, subject = %email.subject, "Email sent");
        Ok(())
    }
}

/// Writes emails to the log instead of sending them.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> Result<(), NotifyError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            body = %email.body,
            "Email (SMTP not configured)"
        );
        Ok(())
    }
}

/// Sends an email, logging failures instead of returning them.
///
/// Notifications never fail the request that triggered them. A send that
/// takes longer than [`MAIL_TIMEOUT`] is abandoned.
pub async fn deliver(mailer: &dyn Mailer, email: Email) {
    match tokio::time::timeout(MAIL_TIMEOUT, mailer.send(&email)).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            tracing::warn!(
                error = %err,
                to = %email.to,
                subject = %email.subject,
                "Failed to send email"
            );
        }
        Err(_) => {
            tracing::warn!(
                to = %email.to,
                subject = %email.subject,
                timeout_secs = MAIL_TIMEOUT.as_secs(),
                "Email delivery timed out"
            );
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Keeps every email it is asked to send.
    #[derive(Debug, Default, Clone)]
    pub struct RecordingMailer {
        sent: Arc<Mutex<Vec<Email>>>,
    }

    impl RecordingMailer {
        pub fn sent(&self) -> Vec<Email> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &Email) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    /// Never finishes sending, like a relay that stopped answering.
    #[derive(Debug, Default, Clone)]
    pub struct StalledMailer;

    #[async_trait]
    impl Mailer for StalledMailer {
        async fn send(&self, _: &Email) -> Result<(), NotifyError> {
            std::future::pending().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _: &Email) -> Result<(), NotifyError> {
            Err(NotifyError::Transport("connection refused".to_string()))
        }
    }

    fn email() -> Email {
        Email {
            to: "ann@example.com".to_string(),
            subject: "Hello".to_string(),
            body: "Hi Ann".to_string(),
        }
    }

    #[tokio::test]
    async fn test_deliver_swallows_failures() {
        deliver(&FailingMailer, email()).await;
    }

    #[tokio::test]
    async fn test_deliver_gives_up_on_a_stalled_relay() {
        let started = std::time::Instant::now();
        deliver(&testing::StalledMailer, email()).await;
        let elapsed = started.elapsed();
        assert!(elapsed >= MAIL_TIMEOUT);
        assert!(elapsed < MAIL_TIMEOUT * 2);
    }

    #[tokio::test]
    async fn test_log_mailer_accepts_everything() {
        assert!(LogMailer.send(&email()).await.is_ok());
    }

    #[test]
    fn test_invalid_sender_is_rejected() {
        let config = SmtpConfig {
            host: "localhost".to_string(),
            port: 2525,
            username: None,
            password: None,
            tls: false,
        };
        let result = SmtpMailer::new(&config, "not an address");
        assert!(matches!(result, Err(NotifyError::InvalidAddress { .. })));
    }

    #[test]
    fn test_plain_smtp_mailer_builds() {
        let config = SmtpConfig {
            host: "localhost".to_string(),
            port: 2525,
            username: Some("user".to_string()),
            password: Some("secret".to_string()),
            tls: false,
        };
        assert!(SmtpMailer::new(&config, "MediVerse <no-reply@mediverse.local>").is_ok());
    }
}
