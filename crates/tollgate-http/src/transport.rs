//! Transports moving raw token values between HTTP messages and the
//! authentication pipelines.
//!
//! Every transport reads from request [`Parts`]. Header and cookie
//! transports can also write into (and clear from) responses; a value the
//! response cannot carry is a transport error, never a silent skip.

use axum::response::Response;
use http::header::{COOKIE, SET_COOKIE};
use http::request::Parts;
use http::{HeaderName, HeaderValue};
use percent_encoding::percent_decode_str;
use tollgate_core::{Discarder, Embedder, Retriever};
use tollgate_core::Error as CoreError;

use crate::error::Result;
use crate::settings::{CookieSettings, HeaderSettings};

/// Token carried in a request header and returned in a response header.
#[derive(Debug, Clone)]
pub struct HeaderTransport {
    name: HeaderName,
}

impl HeaderTransport {
    /// Transport using the header `name`.
    pub fn new(name: &str) -> Result<Self> {
        Ok(Self {
            name: HeaderName::try_from(name)?,
        })
    }

    /// Transport configured from settings.
    pub fn from_settings(settings: &HeaderSettings) -> Result<Self> {
        Self::new(&settings.name)
    }

    /// The header name.
    pub fn name(&self) -> &HeaderName {
        &self.name
    }
}

impl Retriever<Parts> for HeaderTransport {
    fn retrieve(&self, parts: &Parts) -> Option<String> {
        let value = parts.headers.get(&self.name)?.to_str().ok()?;
        (!value.is_empty()).then(|| value.to_string())
    }
}

impl Embedder<Response> for HeaderTransport {
    fn embed(&self, value: String, mut response: Response) -> tollgate_core::Result<Response> {
        let value = HeaderValue::from_str(&value).map_err(|e| {
            CoreError::transport(format!("Cannot embed token into header {}: {e}", self.name))
        })?;
        response.headers_mut().insert(self.name.clone(), value);
        Ok(response)
    }
}

impl Discarder<Response> for HeaderTransport {
    fn discard(&self, mut response: Response) -> Response {
        response.headers_mut().remove(&self.name);
        response
    }
}

/// Token carried in a cookie.
#[derive(Debug, Clone)]
pub struct CookieTransport {
    settings: CookieSettings,
}

impl CookieTransport {
    /// Transport writing cookies with the given attributes.
    pub fn new(settings: CookieSettings) -> Result<Self> {
        settings.check()?;
        Ok(Self { settings })
    }

    /// The cookie attributes.
    pub fn settings(&self) -> &CookieSettings {
        &self.settings
    }

    /// Render a `Set-Cookie` value for `value` with the configured
    /// attributes; `max_age` overrides the configured one.
    fn render(&self, value: &str, max_age: Option<u64>) -> String {
        let s = &self.settings;
        let mut cookie = format!("{}={value}; Path={}", s.name, s.path);
        if let Some(domain) = &s.domain {
            cookie.push_str(&format!("; Domain={domain}"));
        }
        if let Some(max_age) = max_age.or(s.max_age_secs) {
            cookie.push_str(&format!("; Max-Age={max_age}"));
        }
        if s.secure {
            cookie.push_str("; Secure");
        }
        if s.http_only {
            cookie.push_str("; HttpOnly");
        }
        cookie.push_str(&format!("; SameSite={}", s.same_site));
        cookie
    }

    fn append(&self, cookie: String, mut response: Response) -> tollgate_core::Result<Response> {
        let value = HeaderValue::from_str(&cookie).map_err(|e| {
            CoreError::transport(format!("Cannot set cookie {}: {e}", self.settings.name))
        })?;
        response.headers_mut().append(SET_COOKIE, value);
        Ok(response)
    }
}

/// RFC 6265 `cookie-octet`: visible ASCII except `"`, `,`, `;` and `\`.
fn is_cookie_octet(byte: u8) -> bool {
    matches!(byte, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}

impl Retriever<Parts> for CookieTransport {
    fn retrieve(&self, parts: &Parts) -> Option<String> {
        parts
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|header| header.to_str().ok())
            .flat_map(|header| header.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.settings.name)
            .map(|(_, value)| value.trim_matches('"').to_string())
            .filter(|value| !value.is_empty())
    }
}

impl Embedder<Response> for CookieTransport {
    fn embed(&self, value: String, response: Response) -> tollgate_core::Result<Response> {
        if !value.bytes().all(is_cookie_octet) {
            return Err(CoreError::transport(format!(
                "Cannot set cookie {}: value contains characters outside the cookie-octet set",
                self.settings.name
            )));
        }
        let cookie = self.render(&value, None);
        self.append(cookie, response)
    }
}

impl Discarder<Response> for CookieTransport {
    fn discard(&self, mut response: Response) -> Response {
        let cookie = self.render("", Some(0));
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => log::error!("Cannot expire cookie {}: {e}", self.settings.name),
        }
        response
    }
}

/// Token carried in a query string parameter. Read-only: tokens are
/// never written back into URLs.
#[derive(Debug, Clone)]
pub struct QueryTransport {
    name: String,
}

impl QueryTransport {
    /// Transport reading the parameter `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Retriever<Parts> for QueryTransport {
    fn retrieve(&self, parts: &Parts) -> Option<String> {
        parts
            .uri
            .query()?
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(name, _)| decode(name).as_deref() == Some(self.name.as_str()))
            .and_then(|(_, value)| decode(value))
            .filter(|value| !value.is_empty())
    }
}

fn decode(component: &str) -> Option<String> {
    let component = component.replace('+', " ");
    percent_decode_str(&component)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}
