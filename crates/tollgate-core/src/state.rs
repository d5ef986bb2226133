//! The closed set of outcomes of an authentication attempt.

use std::fmt;

use crate::authenticator::{Authenticator, LoginInfo};
use crate::authorization::Authorization;
use crate::{Error, Result};

/// Result of running an [`AuthenticationPipeline`](crate::AuthenticationPipeline).
///
/// Exactly one variant holds. [`AuthState::Authenticated`] is the only
/// success; every other variant names a different reason the request is
/// not authenticated.
#[derive(Debug)]
pub enum AuthState<I> {
    /// The request acts as `identity` through `authenticator`.
    Authenticated {
        /// The resolved identity.
        identity: I,
        /// The validated authenticator.
        authenticator: Authenticator,
        /// The login info the identity was resolved from.
        login_info: LoginInfo,
    },

    /// The source carried no credential.
    MissingCredentials,

    /// A credential was found but failed validation.
    InvalidCredentials {
        /// The rejected authenticator.
        authenticator: Authenticator,
        /// Every validation error, in validator order.
        errors: Vec<String>,
    },

    /// The credential is valid but no identity exists for it.
    MissingIdentity {
        /// The valid authenticator.
        authenticator: Authenticator,
        /// The login info that resolved to nothing.
        login_info: LoginInfo,
    },

    /// A step failed unexpectedly.
    Failure(Error),
}

impl<I> AuthState<I> {
    /// Returns `true` if the state is `Authenticated`.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated { .. })
    }

    /// Returns `true` if the state is `MissingCredentials`.
    pub fn is_missing_credentials(&self) -> bool {
        matches!(self, AuthState::MissingCredentials)
    }

    /// Returns `true` if the state is `InvalidCredentials`.
    pub fn is_invalid_credentials(&self) -> bool {
        matches!(self, AuthState::InvalidCredentials { .. })
    }

    /// Returns `true` if the state is `MissingIdentity`.
    pub fn is_missing_identity(&self) -> bool {
        matches!(self, AuthState::MissingIdentity { .. })
    }

    /// Returns `true` if the state is `Failure`.
    pub fn is_failure(&self) -> bool {
        matches!(self, AuthState::Failure(_))
    }

    /// The identity, when authenticated.
    pub fn identity(&self) -> Option<&I> {
        match self {
            AuthState::Authenticated { identity, .. } => Some(identity),
            _ => None,
        }
    }

    /// The authenticator found in the source, if any got that far.
    pub fn authenticator(&self) -> Option<&Authenticator> {
        match self {
            AuthState::Authenticated { authenticator, .. }
            | AuthState::InvalidCredentials { authenticator, .. }
            | AuthState::MissingIdentity { authenticator, .. } => Some(authenticator),
            AuthState::MissingCredentials | AuthState::Failure(_) => None,
        }
    }

    /// The error of a `Failure` state.
    pub fn error(&self) -> Option<&Error> {
        match self {
            AuthState::Failure(error) => Some(error),
            _ => None,
        }
    }

    /// Convert into the identity/authenticator pair, or give back the state.
    pub fn into_authenticated(self) -> std::result::Result<(I, Authenticator), Self> {
        match self {
            AuthState::Authenticated {
                identity,
                authenticator,
                ..
            } => Ok((identity, authenticator)),
            other => Err(other),
        }
    }

    /// Evaluate `authorization` for an authenticated state. Any other
    /// state is never authorized.
    pub async fn authorize<A>(&self, authorization: &A) -> Result<bool>
    where
        A: Authorization<I> + ?Sized,
    {
        match self {
            AuthState::Authenticated {
                identity,
                authenticator,
                ..
            } => authorization.is_authorized(identity, authenticator).await,
            _ => Ok(false),
        }
    }

    /// Short name of the variant, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthState::Authenticated { .. } => "authenticated",
            AuthState::MissingCredentials => "missing credentials",
            AuthState::InvalidCredentials { .. } => "invalid credentials",
            AuthState::MissingIdentity { .. } => "missing identity",
            AuthState::Failure(_) => "failure",
        }
    }
}

impl<I> fmt::Display for AuthState<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthState::Authenticated { login_info, .. } => {
                write!(f, "authenticated as {login_info}")
            }
            AuthState::MissingCredentials => write!(f, "missing credentials"),
            AuthState::InvalidCredentials { errors, .. } => {
                write!(f, "invalid credentials: {}", errors.join("; "))
            }
            AuthState::MissingIdentity { login_info, .. } => {
                write!(f, "no identity for {login_info}")
            }
            AuthState::Failure(error) => write!(f, "{error}"),
        }
    }
}
