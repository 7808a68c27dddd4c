use std::{env, path::PathBuf};

/// Default upload limit: 5 MiB.
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Outgoing mail server settings. Absent when `SMTP_HOST` is unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Use STARTTLS (default) instead of a plain connection.
    pub tls: bool,
}

/// Credentials of the admin account created on start-up if missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the clinic SQLite database (default: "mediverse.db")
    pub sqlite_path: String,
    /// Path to the session SQLite database (default: "mediverse-sessions.db")
    pub session_db_path: String,
    /// Root directory for uploaded files (default: "uploads")
    pub upload_dir: PathBuf,
    /// Maximum accepted upload size in bytes (default: 5 MiB)
    pub max_upload_bytes: usize,
    pub smtp: Option<SmtpConfig>,
    /// Sender address of notification emails
    pub mail_from: String,
    pub admin: Option<AdminBootstrap>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SQLITE_PATH` - clinic database path (default: "mediverse.db")
    /// - `SESSION_DB_PATH` - session database path (default: "mediverse-sessions.db")
    /// - `UPLOAD_DIR` - upload root (default: "uploads")
    /// - `MAX_UPLOAD_BYTES` - upload size limit (default: 5242880)
    /// - `SMTP_HOST`, `SMTP_PORT` (587), `SMTP_USERNAME`, `SMTP_PASSWORD`,
    ///   `SMTP_TLS` (true) - mail server; logging mailer when `SMTP_HOST` is unset
    /// - `MAIL_FROM` - sender (default: "MediVerse <no-reply@mediverse.local>")
    /// - `ADMIN_EMAIL` / `ADMIN_PASSWORD` - bootstrap admin account
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let smtp = var("SMTP_HOST").map(|host| SmtpConfig {
            host,
            port: var("SMTP_PORT").and_then(|v| v.parse().ok()).unwrap_or(587),
            username: var("SMTP_USERNAME"),
            password: var("SMTP_PASSWORD"),
            tls: var("SMTP_TLS").and_then(|v| v.parse().ok()).unwrap_or(true),
        });

        let admin = match (var("ADMIN_EMAIL"), var("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminBootstrap { email, password }),
            _ => None,
        };

        Self {
            sqlite_path: var("SQLITE_PATH").unwrap_or_else(|| "mediverse.db".to_string()),
            session_db_path: var("SESSION_DB_PATH")
                .unwrap_or_else(|| "mediverse-sessions.db".to_string()),
            upload_dir: var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            max_upload_bytes: var("MAX_UPLOAD_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            smtp,
            mail_from: var("MAIL_FROM")
                .unwrap_or_else(|| "MediVerse <no-reply@mediverse.local>".to_string()),
            admin,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = config_from(&[]);

        assert_eq!(config.sqlite_path, "mediverse.db");
        assert_eq!(config.session_db_path, "mediverse-sessions.db");
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert!(config.smtp.is_none());
        assert!(config.admin.is_none());
    }

    #[test]
    fn test_smtp_settings() {
        let config = config_from(&[
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_PORT", "2525"),
            ("SMTP_TLS", "false"),
            ("SMTP_USERNAME", "mailer"),
        ]);

        let smtp = config.smtp.unwrap();
        assert_eq!(smtp.host, "smtp.example.com");
        assert_eq!(smtp.port, 2525);
        assert!(!smtp.tls);
        assert_eq!(smtp.username.as_deref(), Some("mailer"));
        assert!(smtp.password.is_none());
    }

    #[test]
    fn test_admin_bootstrap_needs_both_values() {
        assert!(config_from(&[("ADMIN_EMAIL", "root@example.com")])
            .admin
            .is_none());

        let config = config_from(&[
            ("ADMIN_EMAIL", "root@example.com"),
            ("ADMIN_PASSWORD", "changeme123"),
        ]);
        assert_eq!(config.admin.unwrap().email, "root@example.com");
    }

    #[test]
    fn test_invalid_numbers_fall_back_to_defaults() {
        let config = config_from(&[("MAX_UPLOAD_BYTES", "lots")]);
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }
}
