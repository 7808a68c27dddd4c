use std::time::Duration;

const DEFAULT_SESSION_TTL_DAYS: u64 = 7;

/// Session cookie configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub session_ttl: Duration,
    pub cookie_name: String,
    pub cookie_secure: bool,
}

impl AuthConfig {
    /// Load from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SESSION_TTL_DAYS`: Session TTL in days (default: 7)
    /// - `COOKIE_SECURE`: Whether to set secure flag on cookies (default: true)
    pub fn from_env() -> Self {
        let session_ttl = std::env::var("SESSION_TTL_DAYS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|days| *days > 0)
            .unwrap_or(DEFAULT_SESSION_TTL_DAYS);

        let cookie_secure = std::env::var("COOKIE_SECURE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(true);

        Self {
            session_ttl: Duration::from_secs(session_ttl * 24 * 60 * 60),
            cookie_secure,
            ..Self::default()
        }
    }

    /// TTL as a `chrono` duration, for expiry arithmetic.
    pub fn session_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.session_ttl)
            .unwrap_or_else(|_| chrono::Duration::days(DEFAULT_SESSION_TTL_DAYS as i64))
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_DAYS * 24 * 60 * 60),
            cookie_name: "session".to_string(),
            cookie_secure: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ttl_is_a_week() {
        let config = AuthConfig::default();
        assert_eq!(config.session_ttl_chrono(), chrono::Duration::days(7));
        assert_eq!(config.cookie_name, "session");
        assert!(config.cookie_secure);
    }
}
