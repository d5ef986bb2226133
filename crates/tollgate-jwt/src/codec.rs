//! Authenticators as signed JWTs.

use std::collections::HashSet;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tollgate_core::{Authenticator, AuthenticatorWriter, Clock, LoginInfo, TokenCodec};

use crate::error::{Error, Result};
use crate::settings::JwtSettings;

/// Claim set of a token.
///
/// `sub` holds the login info as base64-encoded JSON. `iat` and `exp` are
/// whole seconds since the epoch; the sub-second part travels in
/// `iat_ns` / `exp_ns` so that a token decodes to exactly the
/// authenticator it was encoded from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Claims {
    jti: String,
    sub: String,
    iss: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat_ns: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp_ns: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fgp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<serde_json::Value>,
}

/// Encodes authenticators as HMAC-signed JWTs and decodes them back.
///
/// Expiry is carried in `exp` but not enforced here: an expired token
/// still decodes, so that
/// [`ExpirationValidator`](tollgate_core::ExpirationValidator) can report
/// it as invalid credentials.
pub struct JwtCodec {
    settings: JwtSettings,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtCodec")
            .field("issuer", &self.settings.issuer)
            .field("algorithm", &self.settings.algorithm)
            .finish_non_exhaustive()
    }
}

impl JwtCodec {
    /// Build a codec from checked settings.
    pub fn new(settings: JwtSettings) -> Result<Self> {
        settings.check()?;
        let secret = settings.secret.as_bytes();

        let mut validation = Validation::new(settings.algorithm.into());
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();
        validation.set_issuer(&[settings.issuer.as_str()]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            settings,
        })
    }

    /// The settings this codec was built from.
    pub fn settings(&self) -> &JwtSettings {
        &self.settings
    }

    /// Issue a fresh authenticator for `login_info` under this codec's
    /// authenticator settings, bound to `fingerprint` when fingerprinting
    /// is enabled.
    pub fn issue(
        &self,
        login_info: LoginInfo,
        clock: &dyn Clock,
        fingerprint: Option<&str>,
    ) -> Authenticator {
        Authenticator::issue(login_info, &self.settings.authenticator, clock, fingerprint)
    }

    /// Sign `authenticator` into a compact JWT.
    pub fn encode(&self, authenticator: &Authenticator) -> Result<String> {
        let login_info =
            serde_json::to_vec(authenticator.login_info()).map_err(Error::LoginInfo)?;
        let claims = Claims {
            jti: authenticator.id().to_string(),
            sub: STANDARD.encode(login_info),
            iss: self.settings.issuer.clone(),
            iat: authenticator.touched().map(|t| t.timestamp()),
            iat_ns: authenticator.touched().and_then(subsec_nanos),
            exp: authenticator.expires().map(|t| t.timestamp()),
            exp_ns: authenticator.expires().and_then(subsec_nanos),
            tags: authenticator.tags().to_vec(),
            fgp: authenticator.fingerprint().map(str::to_string),
            payload: authenticator.payload().cloned(),
        };
        let header = Header::new(self.settings.algorithm.into());
        Ok(jsonwebtoken::encode(&header, &claims, &self.encoding)?)
    }

    /// Verify and decode a compact JWT.
    pub fn decode(&self, token: &str) -> Result<Authenticator> {
        let claims = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .inspect_err(|e| log::debug!("Rejected token: {e}"))?
            .claims;

        let login_info: LoginInfo =
            serde_json::from_slice(&STANDARD.decode(&claims.sub)?).map_err(Error::LoginInfo)?;

        let mut authenticator = Authenticator::new(claims.jti, login_info)
            .with_touched(timestamp("iat", claims.iat, claims.iat_ns)?)
            .with_expires(timestamp("exp", claims.exp, claims.exp_ns)?)
            .with_tags(claims.tags);
        if let Some(fingerprint) = claims.fgp {
            authenticator = authenticator.with_fingerprint(fingerprint);
        }
        if let Some(payload) = claims.payload {
            authenticator = authenticator.with_payload(payload);
        }
        Ok(authenticator)
    }
}

fn subsec_nanos(t: DateTime<Utc>) -> Option<u32> {
    Some(t.timestamp_subsec_nanos()).filter(|nanos| *nanos != 0)
}

fn timestamp(
    claim: &'static str,
    secs: Option<i64>,
    nanos: Option<u32>,
) -> Result<Option<DateTime<Utc>>> {
    secs.map(|secs| {
        DateTime::from_timestamp(secs, nanos.unwrap_or(0))
            .ok_or(Error::Timestamp { claim, value: secs })
    })
    .transpose()
}

#[async_trait]
impl AuthenticatorWriter for JwtCodec {
    async fn write(&self, authenticator: &Authenticator) -> tollgate_core::Result<String> {
        Ok(self.encode(authenticator)?)
    }
}

#[async_trait]
impl TokenCodec for JwtCodec {
    async fn decode(&self, raw: &str) -> tollgate_core::Result<Authenticator> {
        Ok(JwtCodec::decode(self, raw)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::settings::JwtAlgorithm;
    use chrono::TimeZone;
    use tollgate_core::FixedClock;

    fn codec() -> JwtCodec {
        JwtCodec::new(JwtSettings::new("s3cr3t")).unwrap()
    }

    fn full() -> Authenticator {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        Authenticator::new("id", LoginInfo::new("credentials", "john@doe.com"))
            .touch(now)
            .with_expiry(chrono::Duration::hours(1), now)
            .with_tags(["admin", "beta"])
            .with_fingerprint("abc")
            .with_payload(serde_json::json!({"theme": "dark"}))
    }

    #[test]
    fn test_round_trip_all_fields() {
        let codec = codec();
        let token = codec.encode(&full()).unwrap();
        assert_eq!(codec.decode(&token).unwrap(), full());
    }

    #[test]
    fn test_round_trip_minimal() {
        let codec = codec();
        let a = Authenticator::new("id", LoginInfo::new("credentials", "john@doe.com"));
        let token = codec.encode(&a).unwrap();
        assert_eq!(codec.decode(&token).unwrap(), a);
    }

    #[test]
    fn test_claim_shape() {
        let codec = codec();
        let token = codec.encode(&full()).unwrap();
        let claims =
            jsonwebtoken::decode::<serde_json::Value>(&token, &codec.decoding, &codec.validation)
                .unwrap()
                .claims;

        assert_eq!(claims["jti"], "id");
        assert_eq!(claims["iss"], "tollgate");
        assert_eq!(claims["fgp"], "abc");
        assert_eq!(claims["tags"], serde_json::json!(["admin", "beta"]));
        let sub = STANDARD.decode(claims["sub"].as_str().unwrap()).unwrap();
        let sub: serde_json::Value = serde_json::from_slice(&sub).unwrap();
        assert_eq!(
            sub,
            serde_json::json!({"providerId": "credentials", "providerKey": "john@doe.com"})
        );
    }

    #[test]
    fn test_round_trip_keeps_sub_second_precision() {
        let codec = codec();
        let issued = codec.issue(
            LoginInfo::new("credentials", "john@doe.com"),
            &FixedClock::new(DateTime::from_timestamp(1_714_564_800, 691_816_328).unwrap()),
            None,
        );
        let a = issued.touch(DateTime::from_timestamp(1_714_564_801, 5).unwrap());
        let token = codec.encode(&a).unwrap();
        assert_eq!(codec.decode(&token).unwrap(), a);
    }

    #[test]
    fn test_whole_seconds_carry_no_nanos_claim() {
        let codec = codec();
        let token = codec.encode(&full()).unwrap();
        let claims =
            jsonwebtoken::decode::<serde_json::Value>(&token, &codec.decoding, &codec.validation)
                .unwrap()
                .claims;
        assert_eq!(claims["iat"], 1_714_564_800);
        assert!(claims.get("iat_ns").is_none());
        assert!(claims.get("exp_ns").is_none());
    }

    #[test]
    fn test_out_of_range_nanos_are_rejected() {
        let codec = codec();
        let claims = Claims {
            jti: "id".into(),
            sub: STANDARD.encode(br#"{"providerId":"p","providerKey":"k"}"#),
            iss: "tollgate".into(),
            iat: Some(0),
            iat_ns: Some(2_000_000_000),
            exp: None,
            exp_ns: None,
            tags: Vec::new(),
            fgp: None,
            payload: None,
        };
        let token = jsonwebtoken::encode(&Header::default(), &claims, &codec.encoding).unwrap();
        assert!(matches!(
            codec.decode(&token),
            Err(Error::Timestamp { claim: "iat", .. })
        ));
    }

    #[test]
    fn test_expired_tokens_still_decode() {
        let codec = codec();
        let past = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        let a = Authenticator::new("id", LoginInfo::new("credentials", "john@doe.com"))
            .with_expires(Some(past));
        let token = codec.encode(&a).unwrap();
        assert_eq!(codec.decode(&token).unwrap().expires(), Some(past));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = codec().encode(&full()).unwrap();
        let other = JwtCodec::new(JwtSettings::new("other")).unwrap();
        assert!(matches!(other.decode(&token), Err(Error::Token(_))));
    }

    #[test]
    fn test_wrong_issuer_is_rejected() {
        let token = codec().encode(&full()).unwrap();
        let other = JwtCodec::new(JwtSettings::new("s3cr3t").with_issuer("someone-else")).unwrap();
        assert!(matches!(other.decode(&token), Err(Error::Token(_))));
    }

    #[test]
    fn test_algorithm_mismatch_is_rejected() {
        let token = codec().encode(&full()).unwrap();
        let other =
            JwtCodec::new(JwtSettings::new("s3cr3t").with_algorithm(JwtAlgorithm::HS512)).unwrap();
        assert!(other.decode(&token).is_err());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(codec().decode("not.a.jwt"), Err(Error::Token(_))));
    }

    #[test]
    fn test_bad_subject_is_rejected() {
        let codec = codec();
        let claims = Claims {
            jti: "id".into(),
            sub: "%%%".into(),
            iss: "tollgate".into(),
            iat: None,
            iat_ns: None,
            exp: None,
            exp_ns: None,
            tags: Vec::new(),
            fgp: None,
            payload: None,
        };
        let token = jsonwebtoken::encode(&Header::default(), &claims, &codec.encoding).unwrap();
        assert!(matches!(codec.decode(&token), Err(Error::Subject(_))));
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        assert!(matches!(
            JwtCodec::new(JwtSettings::new("")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_issue_applies_authenticator_settings() {
        let mut settings = JwtSettings::new("s3cr3t");
        settings.authenticator.sliding_window = true;
        settings.authenticator.expiry_secs = Some(60);
        let codec = JwtCodec::new(settings).unwrap();
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());

        let a = codec.issue(LoginInfo::new("credentials", "john@doe.com"), &clock, None);
        assert_eq!(a.touched(), Some(clock.now()));
        assert_eq!(a.expires(), Some(clock.now() + chrono::Duration::seconds(60)));
    }

    #[tokio::test]
    async fn test_token_codec_maps_errors_to_codec_failures() {
        let err = TokenCodec::decode(&codec(), "not.a.jwt").await.unwrap_err();
        assert!(matches!(err, tollgate_core::Error::Codec { .. }));
        assert!(err.to_string().starts_with("invalid token: "));
    }
}
