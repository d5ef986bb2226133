//! The authenticator entity and the login info it is bound to.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::settings::AuthenticatorSettings;
use crate::validator::{Status, Validators};
use crate::Result;

/// Identifies one identity at one provider, e.g. `("credentials", "john@doe.com")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginInfo {
    /// The provider that authenticated the identity.
    pub provider_id: String,
    /// The identity's key at that provider.
    pub provider_key: String,
}

impl LoginInfo {
    /// Create a new login info pair.
    pub fn new(provider_id: impl Into<String>, provider_key: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            provider_key: provider_key.into(),
        }
    }
}

impl fmt::Display for LoginInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider_id, self.provider_key)
    }
}

/// A credential asserting that a request acts as the identity behind
/// [`LoginInfo`].
///
/// Authenticators are values: every modifying operation consumes the
/// authenticator and returns a new one. `id` and `login_info` never change
/// once constructed. `touched` opts the authenticator into sliding-window
/// expiration; `expires` set to `None` means it never expires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Authenticator {
    id: String,
    login_info: LoginInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    touched: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<serde_json::Value>,
}

impl Authenticator {
    /// Create an untouched, non-expiring authenticator.
    pub fn new(id: impl Into<String>, login_info: LoginInfo) -> Self {
        Self {
            id: id.into(),
            login_info,
            touched: None,
            expires: None,
            fingerprint: None,
            tags: Vec::new(),
            payload: None,
        }
    }

    /// Create an authenticator with a random (UUID v4) id.
    pub fn generate(login_info: LoginInfo) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), login_info)
    }

    /// Issue a fresh authenticator for `login_info` according to `settings`.
    ///
    /// `fingerprint` is the client fingerprint of the login request; it is
    /// bound only when `settings.use_fingerprinting` is on.
    pub fn issue(
        login_info: LoginInfo,
        settings: &AuthenticatorSettings,
        clock: &dyn Clock,
        fingerprint: Option<&str>,
    ) -> Self {
        let now = clock.now();
        let mut authenticator = Self::generate(login_info);
        if settings.sliding_window {
            authenticator = authenticator.touch(now);
        }
        if let Some(expiry) = settings.expiry() {
            authenticator = authenticator.with_expiry(expiry, now);
        }
        match fingerprint {
            Some(fingerprint) if settings.use_fingerprinting => {
                authenticator.with_fingerprint(fingerprint)
            }
            _ => authenticator,
        }
    }

    /// The opaque id meaningful to the transport or store.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The identity this authenticator is bound to.
    pub fn login_info(&self) -> &LoginInfo {
        &self.login_info
    }

    /// Last time the authenticator was used, when sliding expiration is on.
    pub fn touched(&self) -> Option<DateTime<Utc>> {
        self.touched
    }

    /// Absolute expiry.
    pub fn expires(&self) -> Option<DateTime<Utc>> {
        self.expires
    }

    /// Client fingerprint bound at creation.
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    /// Application labels, in insertion order.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Opaque application data.
    pub fn payload(&self) -> Option<&serde_json::Value> {
        self.payload.as_ref()
    }

    /// Time left until expiry; negative once expired, `None` when it never expires.
    pub fn expires_in(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expires.map(|expires| expires - now)
    }

    /// Time since the authenticator was last touched.
    pub fn touched_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.touched.map(|touched| now - touched)
    }

    /// Whether sliding-window expiration is opted into.
    pub fn is_touched(&self) -> bool {
        self.touched.is_some()
    }

    /// True iff every given tag is present. Vacuously true for no tags.
    pub fn is_tagged_with<I, T>(&self, tags: I) -> bool
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        tags.into_iter()
            .all(|tag| self.tags.iter().any(|own| own == tag.as_ref()))
    }

    /// Run every validator and fold the verdicts by conjunction.
    pub async fn is_valid(&self, validators: &Validators) -> Result<Status> {
        validators.is_valid(self).await
    }

    /// Record a use at `now`. Only `touched` changes.
    #[must_use]
    pub fn touch(mut self, now: DateTime<Utc>) -> Self {
        self.touched = Some(now);
        self
    }

    /// Set the absolute expiry to `now + duration`, saturating at the
    /// bounds of the representable date range.
    #[must_use]
    pub fn with_expiry(mut self, duration: Duration, now: DateTime<Utc>) -> Self {
        let bound = if duration < Duration::zero() {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        };
        self.expires = Some(now.checked_add_signed(duration).unwrap_or(bound));
        self
    }

    /// Extend the lifetime by `duration` from `now`, touching the
    /// authenticator first if it is opted into sliding expiration.
    #[must_use]
    pub fn renew(self, duration: Duration, now: DateTime<Utc>) -> Self {
        let authenticator = if self.is_touched() {
            self.touch(now)
        } else {
            self
        };
        authenticator.with_expiry(duration, now)
    }

    /// Bind a client fingerprint.
    #[must_use]
    pub fn with_fingerprint(mut self, value: impl Into<String>) -> Self {
        self.fingerprint = Some(value.into());
        self
    }

    /// Replace the tags.
    #[must_use]
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Attach application data.
    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Set `touched` explicitly, used by codecs reconstructing a token.
    #[must_use]
    pub fn with_touched(mut self, touched: Option<DateTime<Utc>>) -> Self {
        self.touched = touched;
        self
    }

    /// Set `expires` explicitly, used by codecs reconstructing a token.
    #[must_use]
    pub fn with_expires(mut self, expires: Option<DateTime<Utc>>) -> Self {
        self.expires = expires;
        self
    }
}
