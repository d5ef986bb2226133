//! Authorization policies over an identity and its authenticator.
//!
//! Policies combine with [`and`], [`or`] and [`not`]. Combinators always
//! evaluate both operands, since policies may have side effects such as
//! audit logging.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::authenticator::Authenticator;
use crate::Result;

/// A boolean policy over `(identity, authenticator)`.
#[async_trait]
pub trait Authorization<I>: Send + Sync {
    /// Whether `identity` acting through `authenticator` is allowed.
    async fn is_authorized(&self, identity: &I, authenticator: &Authenticator) -> Result<bool>;
}

#[async_trait]
impl<I: Sync + 'static, A: Authorization<I> + ?Sized> Authorization<I> for Arc<A> {
    async fn is_authorized(&self, identity: &I, authenticator: &Authenticator) -> Result<bool> {
        (**self).is_authorized(identity, authenticator).await
    }
}

/// Allows everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Authorized;

#[async_trait]
impl<I: Sync + 'static> Authorization<I> for Authorized {
    async fn is_authorized(&self, _: &I, _: &Authenticator) -> Result<bool> {
        Ok(true)
    }
}

/// Denies everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unauthorized;

#[async_trait]
impl<I: Sync + 'static> Authorization<I> for Unauthorized {
    async fn is_authorized(&self, _: &I, _: &Authenticator) -> Result<bool> {
        Ok(false)
    }
}

/// Negation of a policy.
#[derive(Debug, Clone)]
pub struct Not<A>(pub A);

#[async_trait]
impl<I: Sync + 'static, A: Authorization<I>> Authorization<I> for Not<A> {
    async fn is_authorized(&self, identity: &I, authenticator: &Authenticator) -> Result<bool> {
        Ok(!self.0.is_authorized(identity, authenticator).await?)
    }
}

/// Conjunction of two policies.
#[derive(Debug, Clone)]
pub struct And<A, B>(pub A, pub B);

#[async_trait]
impl<I: Sync + 'static, A: Authorization<I>, B: Authorization<I>> Authorization<I> for And<A, B> {
    async fn is_authorized(&self, identity: &I, authenticator: &Authenticator) -> Result<bool> {
        let (left, right) = futures::join!(
            self.0.is_authorized(identity, authenticator),
            self.1.is_authorized(identity, authenticator)
        );
        Ok(left? && right?)
    }
}

/// Disjunction of two policies.
#[derive(Debug, Clone)]
pub struct Or<A, B>(pub A, pub B);

#[async_trait]
impl<I: Sync + 'static, A: Authorization<I>, B: Authorization<I>> Authorization<I> for Or<A, B> {
    async fn is_authorized(&self, identity: &I, authenticator: &Authenticator) -> Result<bool> {
        let (left, right) = futures::join!(
            self.0.is_authorized(identity, authenticator),
            self.1.is_authorized(identity, authenticator)
        );
        Ok(left? || right?)
    }
}

/// Both policies must allow.
pub fn and<A, B>(left: A, right: B) -> And<A, B> {
    And(left, right)
}

/// Either policy must allow.
pub fn or<A, B>(left: A, right: B) -> Or<A, B> {
    Or(left, right)
}

/// Invert a policy.
pub fn not<A>(policy: A) -> Not<A> {
    Not(policy)
}

/// A policy defined by a synchronous predicate.
pub struct Predicate<I, F> {
    predicate: F,
    _identity: PhantomData<fn(&I)>,
}

impl<I, F> Predicate<I, F>
where
    F: Fn(&I, &Authenticator) -> bool + Send + Sync,
{
    /// Wrap `predicate` as a policy.
    pub fn new(predicate: F) -> Self {
        Self {
            predicate,
            _identity: PhantomData,
        }
    }
}

#[async_trait]
impl<I: Sync + 'static, F> Authorization<I> for Predicate<I, F>
where
    F: Fn(&I, &Authenticator) -> bool + Send + Sync,
{
    async fn is_authorized(&self, identity: &I, authenticator: &Authenticator) -> Result<bool> {
        Ok((self.predicate)(identity, authenticator))
    }
}

/// Allows authenticators carrying every one of the given tags.
#[derive(Debug, Clone)]
pub struct WithTags(pub Vec<String>);

#[async_trait]
impl<I: Sync + 'static> Authorization<I> for WithTags {
    async fn is_authorized(&self, _: &I, authenticator: &Authenticator) -> Result<bool> {
        Ok(authenticator.is_tagged_with(&self.0))
    }
}
