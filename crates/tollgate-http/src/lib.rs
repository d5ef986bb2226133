//! HTTP integration for Tollgate.
//!
//! Provides:
//! - [`HeaderTransport`], [`CookieTransport`], [`QueryTransport`]: read
//!   raw tokens from request [`Parts`](http::request::Parts) and write
//!   them into responses
//! - [`fingerprint`] / [`request_validators`]: client fingerprint for
//!   binding authenticators to a browser
//! - [`AuthLayer`] / [`AuthService`]: Tower middleware driving an
//!   [`AuthenticatorProvider`](tollgate_core::AuthenticatorProvider)
//! - [`Identity`] / [`identity_from_parts`]: what downstream handlers see
//! - [`HttpSettings`]: transport and middleware configuration

mod error;
mod fingerprint;
mod identity;
mod middleware;
mod settings;
mod transport;

pub use error::{Error, Result};
pub use fingerprint::{fingerprint, fingerprint_validators, request_validators};
pub use identity::{identity_from_parts, Identity};
pub use middleware::{AuthLayer, AuthService, HttpProvider};
pub use settings::{
    AuthLayerConfig, CookieSettings, HeaderSettings, HttpSettings, SameSite, DEFAULT_COOKIE_NAME,
    DEFAULT_HEADER_NAME,
};
pub use transport::{CookieTransport, HeaderTransport, QueryTransport};
