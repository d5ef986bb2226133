//! The authenticated identity as seen by downstream handlers.

use tollgate_core::Authenticator;

/// Identity and authenticator of an authenticated request.
///
/// Stored in HTTP request extensions by [`AuthService`](crate::AuthService).
#[derive(Debug, Clone)]
pub struct Identity<I> {
    /// The application identity.
    pub identity: I,
    /// The authenticator the request was authenticated with.
    pub authenticator: Authenticator,
}

/// Extract the [`Identity`] from HTTP request `Parts`, if present.
pub fn identity_from_parts<I>(parts: &http::request::Parts) -> Option<&Identity<I>>
where
    I: Send + Sync + 'static,
{
    parts.extensions.get::<Identity<I>>()
}
