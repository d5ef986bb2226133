//! Write-back of authenticators into response-like targets.

use async_trait::async_trait;

use crate::authenticator::Authenticator;
use crate::capability::{AuthenticatorWriter, BackingStore, Discarder, Embedder, IdWriter};
use crate::Result;

/// Embeds a serialized authenticator into a target, or removes it again.
///
/// Errors are returned to the caller unchanged: a failed write-back must
/// abort the response instead of silently skipping the refresh.
#[async_trait]
pub trait TargetPipeline<T>: Send + Sync {
    /// Serialize `authenticator` and embed it into `target`.
    async fn write(&self, authenticator: &Authenticator, target: T) -> Result<T>;

    /// Instruct the client to drop its credential.
    async fn discard(&self, target: T) -> Result<T>;

    /// Invalidate `authenticator` server-side, then discard it from
    /// `target`.
    async fn discard_authenticator(&self, authenticator: &Authenticator, target: T) -> Result<T>;
}

/// The serialized authenticator itself travels to the client.
#[derive(Debug, Clone)]
pub struct StatelessTarget<W, E> {
    writer: W,
    transport: E,
}

impl<W, E> StatelessTarget<W, E> {
    /// Serialize with `writer`, embed with `transport`.
    pub fn new(writer: W, transport: E) -> Self {
        Self { writer, transport }
    }
}

#[async_trait]
impl<T, W, E> TargetPipeline<T> for StatelessTarget<W, E>
where
    T: Send + 'static,
    W: AuthenticatorWriter,
    E: Embedder<T> + Discarder<T>,
{
    async fn write(&self, authenticator: &Authenticator, target: T) -> Result<T> {
        let raw = self.writer.write(authenticator).await?;
        self.transport.embed(raw, target)
    }

    async fn discard(&self, target: T) -> Result<T> {
        Ok(self.transport.discard(target))
    }

    /// Stateless tokens cannot be revoked; this only discards.
    async fn discard_authenticator(&self, _: &Authenticator, target: T) -> Result<T> {
        Ok(self.transport.discard(target))
    }
}

/// The authenticator is kept in a [`BackingStore`]; only its id travels
/// to the client.
#[derive(Debug, Clone)]
pub struct StatefulTarget<B, E> {
    store: B,
    transport: E,
}

impl<B, E> StatefulTarget<B, E> {
    /// Persist into `store`, embed the id with `transport`.
    pub fn new(store: B, transport: E) -> Self {
        Self { store, transport }
    }

    /// The backing store written to.
    pub fn store(&self) -> &B {
        &self.store
    }
}

#[async_trait]
impl<T, B, E> TargetPipeline<T> for StatefulTarget<B, E>
where
    T: Send + 'static,
    B: BackingStore,
    E: Embedder<T> + Discarder<T>,
{
    async fn write(&self, authenticator: &Authenticator, target: T) -> Result<T> {
        let stored = self.store.put(authenticator.clone()).await?;
        let raw = IdWriter.write(&stored).await?;
        self.transport.embed(raw, target)
    }

    async fn discard(&self, target: T) -> Result<T> {
        Ok(self.transport.discard(target))
    }

    async fn discard_authenticator(&self, authenticator: &Authenticator, target: T) -> Result<T> {
        self.store.remove(authenticator.id()).await?;
        Ok(self.transport.discard(target))
    }
}
