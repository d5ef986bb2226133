//! Transport and middleware settings.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default name of the token cookie.
pub const DEFAULT_COOKIE_NAME: &str = "tollgate";

/// Default name of the token header.
pub const DEFAULT_HEADER_NAME: &str = "X-Auth-Token";

/// `SameSite` attribute of the token cookie.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    /// Sent on same-site requests only.
    Strict,
    /// Also sent on top-level cross-site navigations.
    #[default]
    Lax,
    /// Sent on every request; requires `secure`.
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SameSite::Strict => write!(f, "Strict"),
            SameSite::Lax => write!(f, "Lax"),
            SameSite::None => write!(f, "None"),
        }
    }
}

/// Attributes of the cookie carrying the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieSettings {
    /// Cookie name.
    pub name: String,
    /// `Path` attribute.
    pub path: String,
    /// `Domain` attribute, omitted when unset.
    pub domain: Option<String>,
    /// `Secure` attribute.
    pub secure: bool,
    /// `HttpOnly` attribute.
    pub http_only: bool,
    /// `SameSite` attribute.
    pub same_site: SameSite,
    /// `Max-Age` attribute; a session cookie when unset.
    pub max_age_secs: Option<u64>,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_COOKIE_NAME.to_string(),
            path: "/".to_string(),
            domain: None,
            secure: true,
            http_only: true,
            same_site: SameSite::default(),
            max_age_secs: None,
        }
    }
}

impl CookieSettings {
    /// Reject settings browsers would refuse.
    pub fn check(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::Config("cookie name is empty".to_string()));
        }
        if self.same_site == SameSite::None && !self.secure {
            return Err(Error::Config(
                "cookies with SameSite=None must be secure".to_string(),
            ));
        }
        Ok(())
    }
}

/// Name of the header carrying the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderSettings {
    /// Header name.
    pub name: String,
}

impl Default for HeaderSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_HEADER_NAME.to_string(),
        }
    }
}

/// Configuration for the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthLayerConfig {
    /// Whether authentication is enabled. When false, all requests pass through.
    pub enabled: bool,
}

impl Default for AuthLayerConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// All HTTP settings as one TOML document.
///
/// ```toml
/// [layer]
/// enabled = true
///
/// [cookie]
/// name = "session"
/// same_site = "Strict"
/// max_age_secs = 3600
///
/// [header]
/// name = "X-Auth-Token"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Middleware switch.
    pub layer: AuthLayerConfig,
    /// Cookie transport.
    pub cookie: CookieSettings,
    /// Header transport.
    pub header: HeaderSettings,
}

impl HttpSettings {
    /// Parse settings from a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse HTTP settings: {e}")))?;
        settings.cookie.check()?;
        http::HeaderName::try_from(settings.header.name.as_str())?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }
}
