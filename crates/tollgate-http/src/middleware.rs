//! Tower authentication middleware.
//!
//! `AuthLayer` and `AuthService` run an [`AuthenticatorProvider`] around
//! any inner service. Authenticated requests reach the inner service with
//! an [`Identity`] in their extensions, and the refreshed credential is
//! written back into the inner service's response.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::response::{IntoResponse, Response};
use http::request::Parts;
use http::{Request, StatusCode};
use tollgate_core::{AuthState, AuthenticatorProvider};
use tower::{Layer, Service};

use crate::identity::Identity;
use crate::settings::AuthLayerConfig;

/// The provider shape the middleware drives.
pub type HttpProvider<I> = AuthenticatorProvider<Parts, Response, I>;

/// Tower `Layer` that wraps services with authentication.
pub struct AuthLayer<I> {
    provider: Arc<HttpProvider<I>>,
    config: AuthLayerConfig,
}

impl<I> Clone for AuthLayer<I> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            config: self.config.clone(),
        }
    }
}

impl<I> AuthLayer<I> {
    /// Create a new auth layer with the given provider and config.
    pub fn new(provider: HttpProvider<I>, config: AuthLayerConfig) -> Self {
        Self {
            provider: Arc::new(provider),
            config,
        }
    }
}

impl<I, S> Layer<S> for AuthLayer<I> {
    type Service = AuthService<I, S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            provider: self.provider.clone(),
            config: self.config.clone(),
        }
    }
}

/// Tower `Service` that authenticates requests before forwarding them.
pub struct AuthService<I, S> {
    inner: S,
    provider: Arc<HttpProvider<I>>,
    config: AuthLayerConfig,
}

impl<I, S: Clone> Clone for AuthService<I, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            provider: self.provider.clone(),
            config: self.config.clone(),
        }
    }
}

impl<I, S> Service<Request<Body>> for AuthService<I, S>
where
    I: Clone + Send + Sync + 'static,
    S: Service<Request<Body>, Error = Infallible> + Clone + Send + 'static,
    S::Response: IntoResponse,
    S::Future: Send,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let provider = self.provider.clone();
        let enabled = self.config.enabled;

        Box::pin(async move {
            // Authentication switched off
            if !enabled {
                let resp = inner
                    .call(req)
                    .await
                    .unwrap_or_else(|infallible| match infallible {});
                return Ok(resp.into_response());
            }

            let (parts, body) = req.into_parts();
            let outcome = provider
                .handle(parts, move |parts, state| async move {
                    match state {
                        AuthState::Authenticated {
                            identity,
                            authenticator,
                            ..
                        } => {
                            let mut req = Request::from_parts(parts, body);
                            req.extensions_mut().insert(Identity {
                                identity,
                                authenticator,
                            });
                            inner
                                .call(req)
                                .await
                                .unwrap_or_else(|infallible| match infallible {})
                                .into_response()
                        }
                        rejected => rejection(&rejected),
                    }
                })
                .await;

            Ok(outcome.unwrap_or_else(|e| {
                log::error!("Writing back the authenticator failed: {e}");
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "internal authentication error",
                )
            }))
        })
    }
}

/// Response for a request that did not authenticate.
fn rejection<I>(state: &AuthState<I>) -> Response {
    match state {
        AuthState::Failure(error) if !error.is_client_error() => {
            log::error!("Authentication failed: {error}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "internal authentication error",
            )
        }
        AuthState::MissingIdentity { .. } => {
            log::warn!("Authentication failed: {state}");
            error_response(StatusCode::FORBIDDEN, "identity", &state.to_string())
        }
        _ => {
            log::warn!("Authentication failed: {state}");
            error_response(StatusCode::UNAUTHORIZED, "authentication", &state.to_string())
        }
    }
}

/// Build a JSON error response.
fn error_response(status: StatusCode, category: &str, message: &str) -> Response {
    let body = serde_json::json!({
        "error": {
            "category": category,
            "message": message,
        }
    });

    (
        status,
        [(http::header::CONTENT_TYPE, "application/json")],
        serde_json::to_string(&body).unwrap_or_default(),
    )
        .into_response()
}
