//! Client fingerprinting.

use http::header::{ACCEPT_CHARSET, ACCEPT_LANGUAGE, USER_AGENT};
use http::request::Parts;
use http::HeaderName;
use tollgate_core::{AuthenticatorSettings, FingerprintValidator, Validators};

/// Fingerprint of the client sending `parts`: the blake3 hex digest of
/// its `User-Agent`, `Accept-Language` and `Accept-Charset` headers
/// joined by `:`. Missing headers count as empty.
pub fn fingerprint(parts: &Parts) -> String {
    let header = |name: HeaderName| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    };
    let material = [
        header(USER_AGENT),
        header(ACCEPT_LANGUAGE),
        header(ACCEPT_CHARSET),
    ]
    .join(":");
    blake3::hash(material.as_bytes()).to_hex().to_string()
}

/// Per-request validators checking authenticators against the client's
/// fingerprint. Pass to `AuthenticationPipeline::with_source_validators`.
pub fn fingerprint_validators(parts: &Parts) -> Validators {
    Validators::new().with(FingerprintValidator::new(fingerprint(parts)))
}

/// Per-request validators as `settings` configure them: the fingerprint
/// check when `use_fingerprinting` is on, nothing otherwise.
pub fn request_validators(
    settings: &AuthenticatorSettings,
) -> impl Fn(&Parts) -> Validators + Send + Sync + 'static {
    let enabled = settings.use_fingerprinting;
    move |parts: &Parts| {
        if enabled {
            fingerprint_validators(parts)
        } else {
            Validators::new()
        }
    }
}
