//! Authenticator settings, loadable from TOML.

use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default absolute lifetime of an issued authenticator (12 hours).
pub const DEFAULT_EXPIRY_SECS: u64 = 12 * 60 * 60;

/// Longest accepted lifetime or idle timeout (100 years).
pub const MAX_DURATION_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// How authenticators are issued and checked.
///
/// ```toml
/// expiry_secs = 43200
/// idle_timeout_secs = 1800
/// use_fingerprinting = true
/// sliding_window = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthenticatorSettings {
    /// Absolute lifetime of new authenticators. `None` issues non-expiring ones.
    pub expiry_secs: Option<u64>,
    /// Maximum time between uses of a touched authenticator.
    pub idle_timeout_secs: Option<u64>,
    /// Whether the client fingerprint is bound to and checked against authenticators.
    pub use_fingerprinting: bool,
    /// Whether new authenticators opt into sliding-window expiration.
    pub sliding_window: bool,
}

impl Default for AuthenticatorSettings {
    fn default() -> Self {
        Self {
            expiry_secs: Some(DEFAULT_EXPIRY_SECS),
            idle_timeout_secs: None,
            use_fingerprinting: true,
            sliding_window: false,
        }
    }
}

impl AuthenticatorSettings {
    /// Parse settings from a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content)
            .map_err(|e| Error::config(format!("Failed to parse settings: {e}")))?;
        settings.check()?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Absolute lifetime as a duration.
    pub fn expiry(&self) -> Option<Duration> {
        self.expiry_secs.map(secs_to_duration)
    }

    /// Idle timeout as a duration.
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs.map(secs_to_duration)
    }

    /// Reject values that cannot work; warn about ones that have no effect.
    pub fn check(&self) -> Result<()> {
        if self.expiry_secs == Some(0) {
            return Err(Error::config("expiry_secs must be positive"));
        }
        if self.idle_timeout_secs == Some(0) {
            return Err(Error::config("idle_timeout_secs must be positive"));
        }
        for (name, value) in [
            ("expiry_secs", self.expiry_secs),
            ("idle_timeout_secs", self.idle_timeout_secs),
        ] {
            if value.is_some_and(|secs| secs > MAX_DURATION_SECS) {
                return Err(Error::config(format!(
                    "{name} must not exceed {MAX_DURATION_SECS}"
                )));
            }
        }
        if self.idle_timeout_secs.is_some() && !self.sliding_window {
            log::warn!("idle_timeout_secs has no effect unless sliding_window is enabled");
        }
        Ok(())
    }
}

/// Durations beyond [`MAX_DURATION_SECS`] are clamped; `check` rejects them
/// for loaded settings, but the fields are public.
fn secs_to_duration(secs: u64) -> Duration {
    i64::try_from(secs.min(MAX_DURATION_SECS))
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}
