//! Error types for tollgate-core.

/// Boxed source error carried by capability failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by the capabilities plugged into an authentication pipeline.
///
/// Inside [`AuthenticationPipeline`](crate::AuthenticationPipeline) every
/// error is converted into [`AuthState::Failure`](crate::AuthState::Failure);
/// only the write-back side ([`TargetPipeline`](crate::TargetPipeline))
/// returns them to its caller.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A validator failed to produce a verdict.
    #[error("{message}")]
    Validator {
        /// Human-readable error message
        message: String,
        /// Source error if available
        #[source]
        source: Option<BoxError>,
    },

    /// The identity lookup failed.
    #[error("{message}")]
    Identity {
        /// Human-readable error message
        message: String,
        /// Source error if available
        #[source]
        source: Option<BoxError>,
    },

    /// The backing store failed.
    #[error("{message}")]
    Store {
        /// Human-readable error message
        message: String,
        /// Source error if available
        #[source]
        source: Option<BoxError>,
    },

    /// A token could not be encoded or decoded.
    #[error("{message}")]
    Codec {
        /// Human-readable error message
        message: String,
        /// Source error if available
        #[source]
        source: Option<BoxError>,
    },

    /// A transport could not read or write its raw value.
    #[error("{message}")]
    Transport {
        /// Human-readable error message
        message: String,
    },

    /// An authorization policy failed to evaluate.
    #[error("{message}")]
    Authorization {
        /// Human-readable error message
        message: String,
    },

    /// Settings could not be loaded or are inconsistent.
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// A pipeline step panicked.
    #[error("{step} panicked: {message}")]
    Panicked {
        /// The pipeline step that panicked
        step: &'static str,
        /// Panic payload, when it was a string
        message: String,
    },
}

/// Convenience `Result` type alias for tollgate operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns whether the error was caused by a malformed credential
    /// rather than by the server side.
    pub fn is_client_error(&self) -> bool {
        match self {
            Error::Codec { .. } | Error::Transport { .. } => true,
            Error::Validator { .. }
            | Error::Identity { .. }
            | Error::Store { .. }
            | Error::Authorization { .. }
            | Error::Config { .. }
            | Error::Panicked { .. } => false,
        }
    }

    /// Creates a validator error.
    pub fn validator<S: Into<String>>(message: S) -> Self {
        Error::Validator {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an identity lookup error.
    pub fn identity<S: Into<String>>(message: S) -> Self {
        Error::Identity {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a backing store error.
    pub fn store<S: Into<String>>(message: S) -> Self {
        Error::Store {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a backing store error with a source error.
    pub fn store_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Store {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a codec error.
    pub fn codec<S: Into<String>>(message: S) -> Self {
        Error::Codec {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a codec error whose message is taken from `source`.
    pub fn codec_from<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Codec {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a transport error.
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Error::Transport {
            message: message.into(),
        }
    }

    /// Creates an authorization error.
    pub fn authorization<S: Into<String>>(message: S) -> Self {
        Error::Authorization {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }
}
