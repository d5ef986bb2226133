//! HTTP-specific error types.

/// Errors raised while configuring HTTP transports.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A configured header name is not a valid HTTP header name.
    #[error("invalid header name: {0}")]
    HeaderName(#[from] http::header::InvalidHeaderName),

    /// Settings could not be loaded or are inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<Error> for tollgate_core::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::Config(message) => tollgate_core::Error::config(message),
            other => tollgate_core::Error::config(other.to_string()),
        }
    }
}

/// Result type alias using the HTTP [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;
