//! Entry point tying authentication, application logic and write-back
//! together.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::authenticator::Authenticator;
use crate::clock::SystemClock;
use crate::pipeline::AuthenticationPipeline;
use crate::state::AuthState;
use crate::step::{Step, Touch};
use crate::target::TargetPipeline;
use crate::Result;

/// Runs an [`AuthenticationPipeline`], hands the outcome to a
/// continuation, and refreshes the credential on the continuation's
/// response.
///
/// The refresh step runs only for [`AuthState::Authenticated`] and only
/// after the continuation produced its response. It defaults to
/// [`Touch`] on the system clock, which keeps sliding-window
/// authenticators alive.
pub struct AuthenticatorProvider<S, T, I> {
    pipeline: AuthenticationPipeline<S, I>,
    target: Arc<dyn TargetPipeline<T>>,
    refresh: Arc<dyn Step<Authenticator, Authenticator>>,
}

impl<S, T, I> Clone for AuthenticatorProvider<S, T, I> {
    fn clone(&self) -> Self {
        Self {
            pipeline: self.pipeline.clone(),
            target: self.target.clone(),
            refresh: self.refresh.clone(),
        }
    }
}

impl<S, T, I> fmt::Debug for AuthenticatorProvider<S, T, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatorProvider")
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

impl<S, T, I> AuthenticatorProvider<S, T, I>
where
    S: Sync + 'static,
    T: Send + 'static,
    I: Send + 'static,
{
    /// Create a provider that touches sliding-window authenticators on
    /// every authenticated request.
    pub fn new(
        pipeline: AuthenticationPipeline<S, I>,
        target: impl TargetPipeline<T> + 'static,
    ) -> Self {
        Self {
            pipeline,
            target: Arc::new(target),
            refresh: Arc::new(Touch::new(SystemClock)),
        }
    }

    /// Replace the refresh step applied before write-back.
    #[must_use]
    pub fn with_refresh(
        mut self,
        refresh: impl Step<Authenticator, Authenticator> + 'static,
    ) -> Self {
        self.refresh = Arc::new(refresh);
        self
    }

    /// The authentication pipeline.
    pub fn pipeline(&self) -> &AuthenticationPipeline<S, I> {
        &self.pipeline
    }

    /// Authenticate `source` and let `continuation` build the response.
    ///
    /// Returns an error only when the write-back fails.
    pub async fn authenticate<F, Fut>(&self, source: &S, continuation: F) -> Result<T>
    where
        F: FnOnce(AuthState<I>) -> Fut,
        Fut: Future<Output = T>,
    {
        let state = self.pipeline.authenticate(source).await;
        let authenticated = authenticated(&state);
        let response = continuation(state).await;
        self.write_back(authenticated, response).await
    }

    /// Like [`authenticate`](Self::authenticate), but hands ownership of
    /// `source` to the continuation once authentication is done.
    pub async fn handle<F, Fut>(&self, source: S, continuation: F) -> Result<T>
    where
        F: FnOnce(S, AuthState<I>) -> Fut,
        Fut: Future<Output = T>,
    {
        let state = self.pipeline.authenticate(&source).await;
        let authenticated = authenticated(&state);
        let response = continuation(source, state).await;
        self.write_back(authenticated, response).await
    }

    /// Embed `authenticator` into `target` without refreshing it, e.g.
    /// after a login or a deliberate renewal.
    pub async fn embed(&self, authenticator: &Authenticator, target: T) -> Result<T> {
        self.target.write(authenticator, target).await
    }

    /// Instruct the client to drop its credential.
    pub async fn discard(&self, target: T) -> Result<T> {
        self.target.discard(target).await
    }

    /// Invalidate `authenticator` and instruct the client to drop it.
    pub async fn discard_authenticator(
        &self,
        authenticator: &Authenticator,
        target: T,
    ) -> Result<T> {
        self.target.discard_authenticator(authenticator, target).await
    }

    async fn write_back(&self, authenticator: Option<Authenticator>, response: T) -> Result<T> {
        let Some(authenticator) = authenticator else {
            return Ok(response);
        };
        let refreshed = self.refresh.run(authenticator).await?;
        log::debug!("Writing back authenticator {}", refreshed.id());
        self.target.write(&refreshed, response).await
    }
}

fn authenticated<I>(state: &AuthState<I>) -> Option<Authenticator> {
    match state {
        AuthState::Authenticated { authenticator, .. } => Some(authenticator.clone()),
        _ => None,
    }
}
