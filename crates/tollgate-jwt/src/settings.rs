//! JWT codec settings.

use std::path::Path;

use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use tollgate_core::AuthenticatorSettings;

use crate::error::{Error, Result};

/// Issuer written into tokens when none is configured.
pub const DEFAULT_ISSUER: &str = "tollgate";

/// HMAC algorithm used to sign tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JwtAlgorithm {
    /// HMAC with SHA-256.
    #[default]
    HS256,
    /// HMAC with SHA-384.
    HS384,
    /// HMAC with SHA-512.
    HS512,
}

impl From<JwtAlgorithm> for Algorithm {
    fn from(algorithm: JwtAlgorithm) -> Self {
        match algorithm {
            JwtAlgorithm::HS256 => Algorithm::HS256,
            JwtAlgorithm::HS384 => Algorithm::HS384,
            JwtAlgorithm::HS512 => Algorithm::HS512,
        }
    }
}

/// Settings of a [`JwtCodec`](crate::JwtCodec).
///
/// The authenticator settings are flattened into the same table:
///
/// ```toml
/// issuer = "my-app"
/// secret = "change-me"
/// algorithm = "HS512"
/// expiry_secs = 3600
/// sliding_window = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtSettings {
    /// Value of the `iss` claim, required to match on decode.
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// Shared HMAC secret.
    pub secret: String,
    /// Signing algorithm.
    #[serde(default)]
    pub algorithm: JwtAlgorithm,
    /// How authenticators carried by these tokens are issued.
    #[serde(flatten)]
    pub authenticator: AuthenticatorSettings,
}

fn default_issuer() -> String {
    DEFAULT_ISSUER.to_string()
}

impl JwtSettings {
    /// Settings with the default issuer and algorithm.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            issuer: default_issuer(),
            secret: secret.into(),
            algorithm: JwtAlgorithm::default(),
            authenticator: AuthenticatorSettings::default(),
        }
    }

    /// Replace the issuer.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Replace the algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: JwtAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Parse settings from a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse JWT settings: {e}")))?;
        settings.check()?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Reject settings no codec can work with.
    pub fn check(&self) -> Result<()> {
        if self.secret.is_empty() {
            return Err(Error::Config("secret must not be empty".to_string()));
        }
        if self.issuer.is_empty() {
            return Err(Error::Config("issuer must not be empty".to_string()));
        }
        self.authenticator
            .check()
            .map_err(|e| Error::Config(e.to_string()))
    }
}
