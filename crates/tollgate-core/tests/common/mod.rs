//! Common test utilities and harness for tollgate-core integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tollgate_core::{
    Authenticator, AuthenticatorWriter, Discarder, Embedder, Error, FixedClock, IdentityReader,
    LoginInfo, Result, Retriever, TokenCodec,
};

/// Name of the cookie carrying the token.
pub const COOKIE: &str = "tollgate";

/// Minimal request: just its cookies.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub cookies: HashMap<String, String>,
}

impl Request {
    /// A request without cookies.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A request carrying `value` in the token cookie.
    pub fn with_token(value: impl Into<String>) -> Self {
        Self {
            cookies: HashMap::from([(COOKIE.to_string(), value.into())]),
        }
    }
}

/// Minimal response: status, body and the cookies set on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: String,
    pub set_cookies: HashMap<String, Option<String>>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            set_cookies: HashMap::new(),
        }
    }

    /// The token set on the response, if any.
    pub fn token(&self) -> Option<&str> {
        self.set_cookies.get(COOKIE).and_then(|v| v.as_deref())
    }
}

/// Reads and writes the token cookie.
pub struct CookieJar;

impl Retriever<Request> for CookieJar {
    fn retrieve(&self, request: &Request) -> Option<String> {
        request.cookies.get(COOKIE).cloned()
    }
}

impl Embedder<Response> for CookieJar {
    fn embed(&self, value: String, mut response: Response) -> Result<Response> {
        response.set_cookies.insert(COOKIE.to_string(), Some(value));
        Ok(response)
    }
}

impl Discarder<Response> for CookieJar {
    fn discard(&self, mut response: Response) -> Response {
        response.set_cookies.insert(COOKIE.to_string(), None);
        response
    }
}

/// Token format: the authenticator's JSON.
pub struct JsonCodec;

#[async_trait]
impl AuthenticatorWriter for JsonCodec {
    async fn write(&self, authenticator: &Authenticator) -> Result<String> {
        serde_json::to_string(authenticator).map_err(Error::codec_from)
    }
}

#[async_trait]
impl TokenCodec for JsonCodec {
    async fn decode(&self, raw: &str) -> Result<Authenticator> {
        serde_json::from_str(raw).map_err(Error::codec_from)
    }
}

/// An application user.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub email: String,
}

/// Identity service knowing a fixed set of users and counting lookups.
#[derive(Default)]
pub struct Users {
    known: Vec<String>,
    lookups: AtomicUsize,
}

impl Users {
    pub fn with(emails: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            known: emails.iter().map(|e| (*e).to_string()).collect(),
            lookups: AtomicUsize::new(0),
        })
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityReader<User> for Users {
    async fn retrieve(&self, login_info: &LoginInfo) -> Result<Option<User>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .known
            .iter()
            .find(|email| **email == login_info.provider_key)
            .map(|email| User {
                email: email.clone(),
            }))
    }
}

/// A clock fixed at 2024-05-01 12:00:00 UTC.
pub fn clock() -> FixedClock {
    FixedClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
}

/// The authenticator used across scenarios.
pub fn john() -> Authenticator {
    Authenticator::new("id", LoginInfo::new("credentials", "john@doe.com"))
}
