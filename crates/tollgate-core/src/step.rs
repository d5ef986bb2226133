//! Composable, possibly suspending pipeline steps.
//!
//! A [`Step<A, B>`] turns an `A` into a `B` or fails. Steps compose with
//! [`StepExt::and_then`] (or [`compose`]) into a `Step<A, C>`.
//!
//! ```
//! use chrono::Duration;
//! use tollgate_core::step::{Renew, Step, StepExt, Touch};
//! use tollgate_core::{Authenticator, Clock, FixedClock, LoginInfo};
//!
//! # tokio_test::block_on(async {
//! let clock = FixedClock::new(chrono::Utc::now());
//! let refresh = Touch::new(clock.clone())
//!     .and_then(Renew::new(Duration::hours(1), clock.clone()));
//!
//! let authenticator = Authenticator::new("id", LoginInfo::new("credentials", "john@doe.com"));
//! let renewed = refresh.run(authenticator).await.unwrap();
//! assert_eq!(renewed.expires(), Some(clock.now() + Duration::hours(1)));
//! # });
//! ```

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::Duration;

use crate::authenticator::Authenticator;
use crate::clock::Clock;
use crate::Result;

/// One effectful transformation.
#[async_trait]
pub trait Step<A, B>: Send + Sync {
    /// Run the step.
    async fn run(&self, input: A) -> Result<B>;
}

/// Sequential composition of two steps.
pub struct AndThen<F, G, B> {
    first: F,
    second: G,
    _mid: PhantomData<fn() -> B>,
}

#[async_trait]
impl<A, B, C, F, G> Step<A, C> for AndThen<F, G, B>
where
    A: Send + 'static,
    B: Send + 'static,
    C: 'static,
    F: Step<A, B>,
    G: Step<B, C>,
{
    async fn run(&self, input: A) -> Result<C> {
        let mid = self.first.run(input).await?;
        self.second.run(mid).await
    }
}

/// Run `first`, then feed its output to `second`.
pub fn compose<F, G, B>(first: F, second: G) -> AndThen<F, G, B> {
    AndThen {
        first,
        second,
        _mid: PhantomData,
    }
}

/// Method form of [`compose`].
pub trait StepExt<A, B>: Step<A, B> + Sized {
    /// Run `self`, then `next`.
    fn and_then<C, G: Step<B, C>>(self, next: G) -> AndThen<Self, G, B> {
        compose(self, next)
    }
}

impl<A, B, S: Step<A, B>> StepExt<A, B> for S {}

/// A step backed by an async function.
#[derive(Debug, Clone)]
pub struct FnStep<F>(F);

/// Wrap an async function as a step.
pub fn step_fn<F>(f: F) -> FnStep<F> {
    FnStep(f)
}

#[async_trait]
impl<A, B, F, Fut> Step<A, B> for FnStep<F>
where
    A: Send + 'static,
    B: 'static,
    F: Fn(A) -> Fut + Send + Sync,
    Fut: Future<Output = Result<B>> + Send + 'static,
{
    async fn run(&self, input: A) -> Result<B> {
        (self.0)(input).await
    }
}

/// Passes its input through.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

#[async_trait]
impl<A: Send + 'static> Step<A, A> for Passthrough {
    async fn run(&self, input: A) -> Result<A> {
        Ok(input)
    }
}

/// Touches authenticators that opted into sliding expiration; leaves
/// the others untouched.
#[derive(Debug, Clone)]
pub struct Touch<C> {
    clock: C,
}

impl<C: Clock> Touch<C> {
    /// Touch at `clock.now()`.
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl<C: Clock> Step<Authenticator, Authenticator> for Touch<C> {
    async fn run(&self, authenticator: Authenticator) -> Result<Authenticator> {
        Ok(if authenticator.is_touched() {
            authenticator.touch(self.clock.now())
        } else {
            authenticator
        })
    }
}

/// Renews authenticators for a fixed duration.
#[derive(Debug, Clone)]
pub struct Renew<C> {
    duration: Duration,
    clock: C,
}

impl<C: Clock> Renew<C> {
    /// Renew for `duration` from `clock.now()`.
    pub fn new(duration: Duration, clock: C) -> Self {
        Self { duration, clock }
    }
}

#[async_trait]
impl<C: Clock> Step<Authenticator, Authenticator> for Renew<C> {
    async fn run(&self, authenticator: Authenticator) -> Result<Authenticator> {
        Ok(authenticator.renew(self.duration, self.clock.now()))
    }
}

/// Binds a client fingerprint.
#[derive(Debug, Clone)]
pub struct Fingerprint(pub String);

#[async_trait]
impl Step<Authenticator, Authenticator> for Fingerprint {
    async fn run(&self, authenticator: Authenticator) -> Result<Authenticator> {
        Ok(authenticator.with_fingerprint(self.0.clone()))
    }
}
