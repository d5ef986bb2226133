//! JWT codec error types.

/// Errors raised while encoding or decoding a JWT.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Signature, issuer or structure check failed.
    #[error("invalid token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// The `sub` claim is not valid base64.
    #[error("invalid subject encoding: {0}")]
    Subject(#[from] base64::DecodeError),

    /// The decoded `sub` claim is not a login info document.
    #[error("invalid login info: {0}")]
    LoginInfo(#[source] serde_json::Error),

    /// A timestamp claim is outside the representable range.
    #[error("invalid timestamp in claim '{claim}': {value}")]
    Timestamp {
        /// The claim name.
        claim: &'static str,
        /// The offending value.
        value: i64,
    },

    /// The codec settings are unusable.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the error comes from a malformed or forged token rather
    /// than from the codec's own setup.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Error::Config(_))
    }
}

impl From<Error> for tollgate_core::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::Config(message) => tollgate_core::Error::config(message),
            other => tollgate_core::Error::codec_from(other),
        }
    }
}

/// Result type alias using the JWT [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;
