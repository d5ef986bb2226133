//! In-memory backing store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::authenticator::Authenticator;
use crate::capability::BackingStore;
use crate::Result;

/// A [`BackingStore`] kept in process memory.
///
/// Suitable for tests and single-instance deployments; entries are lost
/// on restart.
#[derive(Debug, Default)]
pub struct MemoryBackingStore {
    entries: RwLock<HashMap<String, Authenticator>>,
}

impl MemoryBackingStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored authenticators.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl BackingStore for MemoryBackingStore {
    async fn put(&self, authenticator: Authenticator) -> Result<Authenticator> {
        log::info!(
            "Storing authenticator {} for {}",
            authenticator.id(),
            authenticator.login_info()
        );
        self.entries
            .write()
            .await
            .insert(authenticator.id().to_string(), authenticator.clone());
        Ok(authenticator)
    }

    async fn find(&self, id: &str) -> Result<Option<Authenticator>> {
        Ok(self.entries.read().await.get(id).cloned())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        if self.entries.write().await.remove(id).is_some() {
            log::info!("Removed authenticator {id}");
        }
        Ok(())
    }
}
