//! JWT token format for Tollgate.
//!
//! Provides:
//! - [`JwtCodec`]: HMAC-signed JWTs implementing
//!   [`tollgate_core::TokenCodec`], so it plugs into a
//!   [`TokenReader`](tollgate_core::TokenReader) and a
//!   [`StatelessTarget`](tollgate_core::StatelessTarget)
//! - [`JwtSettings`]: issuer, secret and algorithm, plus the
//!   authenticator settings tokens are issued with
//! - [`Error`]: codec errors, convertible into core codec failures

mod codec;
mod error;
mod settings;

#[cfg(test)]
mod proptests;

pub use codec::JwtCodec;
pub use error::{Error, Result};
pub use settings::{JwtAlgorithm, JwtSettings, DEFAULT_ISSUER};
