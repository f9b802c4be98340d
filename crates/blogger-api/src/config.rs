use anyhow::{Result, bail};
use chrono::Duration;

use blogger_types::api::SessionKind;

use crate::validation::Validators;

/// Secrets that must never reach production.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

/// Immutable runtime configuration, built once at startup and shared through
/// the application state.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub guest_refresh_ttl: Duration,
    pub validators: Validators,
}

impl AppConfig {
    /// Config with the standard token lifetimes: 20 minutes for access
    /// tokens, 5 days for refresh tokens, 24 hours for guest sessions.
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Result<Self> {
        Ok(Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl: Duration::minutes(20),
            refresh_ttl: Duration::days(5),
            guest_refresh_ttl: Duration::hours(24),
            validators: Validators::new()?,
        })
    }

    /// Refresh-token lifetime for a session of the given kind.
    pub fn session_ttl(&self, kind: SessionKind) -> Duration {
        match kind {
            SessionKind::Standard => self.refresh_ttl,
            SessionKind::Guest => self.guest_refresh_ttl,
        }
    }

    /// Reads `BLOGGER_ACCESS_TOKEN_SECRET` and `BLOGGER_REFRESH_TOKEN_SECRET`.
    /// Refuses empty or placeholder secrets, and refuses to sign both token
    /// kinds with the same key.
    pub fn from_env() -> Result<Self> {
        let access = secret_from_env("BLOGGER_ACCESS_TOKEN_SECRET")?;
        let refresh = secret_from_env("BLOGGER_REFRESH_TOKEN_SECRET")?;
        if access == refresh {
            bail!("access and refresh token secrets must differ");
        }
        Self::new(access, refresh)
    }
}

fn secret_from_env(var: &str) -> Result<String> {
    let secret = std::env::var(var).unwrap_or_default();
    if secret.is_empty() || PLACEHOLDER_SECRETS.contains(&secret.as_str()) {
        bail!("{var} is unset or still a placeholder");
    }
    Ok(secret)
}
