//! Capabilities the pipelines are assembled from.
//!
//! Concrete transports, codecs, stores and identity services live outside
//! this crate and plug in through these traits:
//!
//! - [`Retriever`] / [`Embedder`] / [`Discarder`]: move raw token strings
//!   in and out of requests and responses
//! - [`TokenCodec`] / [`AuthenticatorWriter`]: turn raw strings into
//!   authenticators and back
//! - [`AuthenticatorReader`]: the three-way source reader (error / absent / present)
//! - [`IdentityReader`]: resolve a [`LoginInfo`] to an identity
//! - [`BackingStore`]: server-side storage for stateful authenticators

use std::sync::Arc;

use async_trait::async_trait;

use crate::authenticator::{Authenticator, LoginInfo};
use crate::Result;

/// Reads the raw token value from a request-like source.
pub trait Retriever<S>: Send + Sync {
    /// The raw value, or `None` when the source carries no token.
    fn retrieve(&self, source: &S) -> Option<String>;
}

/// Embeds a raw token value into a response-like target.
pub trait Embedder<T>: Send + Sync {
    /// Return `target` carrying `value`, or a transport error when the
    /// target cannot carry it.
    fn embed(&self, value: String, target: T) -> Result<T>;
}

/// Removes a previously embedded token from a response-like target.
pub trait Discarder<T>: Send + Sync {
    /// Return `target` instructing the client to drop the token.
    fn discard(&self, target: T) -> T;
}

/// Serializes an authenticator into its transport form.
#[async_trait]
pub trait AuthenticatorWriter: Send + Sync {
    /// The serialized form.
    async fn write(&self, authenticator: &Authenticator) -> Result<String>;
}

/// A token format that can both read and write authenticators.
#[async_trait]
pub trait TokenCodec: AuthenticatorWriter {
    /// Rebuild an authenticator from its serialized form.
    async fn decode(&self, raw: &str) -> Result<Authenticator>;
}

/// Turns a source into an authenticator.
///
/// `Ok(None)` means the source carries no credential, which is distinct
/// from an error while reading one.
#[async_trait]
pub trait AuthenticatorReader<S>: Send + Sync {
    /// Read the authenticator carried by `source`.
    async fn read(&self, source: &S) -> Result<Option<Authenticator>>;
}

/// Resolves login info to an application identity.
#[async_trait]
pub trait IdentityReader<I>: Send + Sync {
    /// The identity bound to `login_info`, if it still exists.
    async fn retrieve(&self, login_info: &LoginInfo) -> Result<Option<I>>;
}

/// Server-side storage for stateful authenticators.
#[async_trait]
pub trait BackingStore: Send + Sync {
    /// Insert or replace the authenticator under its id.
    async fn put(&self, authenticator: Authenticator) -> Result<Authenticator>;

    /// Look up an authenticator by id.
    async fn find(&self, id: &str) -> Result<Option<Authenticator>>;

    /// Remove an authenticator. Removing a missing id is not an error.
    async fn remove(&self, id: &str) -> Result<()>;
}

impl<S, R: Retriever<S> + ?Sized> Retriever<S> for Arc<R> {
    fn retrieve(&self, source: &S) -> Option<String> {
        (**self).retrieve(source)
    }
}

impl<T, E: Embedder<T> + ?Sized> Embedder<T> for Arc<E> {
    fn embed(&self, value: String, target: T) -> Result<T> {
        (**self).embed(value, target)
    }
}

impl<T, D: Discarder<T> + ?Sized> Discarder<T> for Arc<D> {
    fn discard(&self, target: T) -> T {
        (**self).discard(target)
    }
}

#[async_trait]
impl<W: AuthenticatorWriter + ?Sized> AuthenticatorWriter for Arc<W> {
    async fn write(&self, authenticator: &Authenticator) -> Result<String> {
        (**self).write(authenticator).await
    }
}

#[async_trait]
impl<C: TokenCodec + ?Sized> TokenCodec for Arc<C> {
    async fn decode(&self, raw: &str) -> Result<Authenticator> {
        (**self).decode(raw).await
    }
}

#[async_trait]
impl<S: Sync + 'static, R: AuthenticatorReader<S> + ?Sized> AuthenticatorReader<S> for Arc<R> {
    async fn read(&self, source: &S) -> Result<Option<Authenticator>> {
        (**self).read(source).await
    }
}

#[async_trait]
impl<I: 'static, R: IdentityReader<I> + ?Sized> IdentityReader<I> for Arc<R> {
    async fn retrieve(&self, login_info: &LoginInfo) -> Result<Option<I>> {
        (**self).retrieve(login_info).await
    }
}

#[async_trait]
impl<B: BackingStore + ?Sized> BackingStore for Arc<B> {
    async fn put(&self, authenticator: Authenticator) -> Result<Authenticator> {
        (**self).put(authenticator).await
    }

    async fn find(&self, id: &str) -> Result<Option<Authenticator>> {
        (**self).find(id).await
    }

    async fn remove(&self, id: &str) -> Result<()> {
        (**self).remove(id).await
    }
}

/// Stateless reader: the retrieved raw value is the whole serialized
/// authenticator.
#[derive(Debug, Clone)]
pub struct TokenReader<R, C> {
    retriever: R,
    codec: C,
}

impl<R, C> TokenReader<R, C> {
    /// Compose a retriever with a codec.
    pub fn new(retriever: R, codec: C) -> Self {
        Self { retriever, codec }
    }
}

#[async_trait]
impl<S, R, C> AuthenticatorReader<S> for TokenReader<R, C>
where
    S: Sync + 'static,
    R: Retriever<S>,
    C: TokenCodec,
{
    async fn read(&self, source: &S) -> Result<Option<Authenticator>> {
        match self.retriever.retrieve(source) {
            Some(raw) => self.codec.decode(&raw).await.map(Some),
            None => Ok(None),
        }
    }
}

/// Stateful reader: the retrieved raw value is an id resolved through a
/// [`BackingStore`]. An id the store no longer knows reads as absent.
#[derive(Debug, Clone)]
pub struct StoreReader<R, B> {
    retriever: R,
    store: B,
}

impl<R, B> StoreReader<R, B> {
    /// Compose a retriever with a backing store.
    pub fn new(retriever: R, store: B) -> Self {
        Self { retriever, store }
    }
}

#[async_trait]
impl<S, R, B> AuthenticatorReader<S> for StoreReader<R, B>
where
    S: Sync + 'static,
    R: Retriever<S>,
    B: BackingStore,
{
    async fn read(&self, source: &S) -> Result<Option<Authenticator>> {
        match self.retriever.retrieve(source) {
            Some(id) => self.store.find(&id).await,
            None => Ok(None),
        }
    }
}

/// Writer producing the authenticator id, the serialized form used by
/// stateful transports.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdWriter;

#[async_trait]
impl AuthenticatorWriter for IdWriter {
    async fn write(&self, authenticator: &Authenticator) -> Result<String> {
        Ok(authenticator.id().to_string())
    }
}
