use super::{BrainStorage, Connector};
use crate::config::ConnectionTarget;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory storage (for development/testing)
///
/// Clones share the same entries, so a test can keep one handle and hand
/// another to the adapter.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<RwLock<HashMap<String, String>>>,
    writes: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
}

impl MemoryStorage {
    /// Create empty storage
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `key`
    pub async fn value(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    /// Seed `key` without counting it as a write
    pub async fn insert(&self, key: &str, value: &str) {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
    }

    /// Number of `SET` commands received
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Whether `QUIT` was received
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrainStorage for MemoryStorage {
    async fn ping(&mut self) -> Result<()> {
        Ok(())
    }

    async fn get(&mut self, key: &str) -> Result<Option<String>> {
        Ok(self.value(key).await)
    }

    async fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.insert(key, value).await;
        self.writes.fetch_add(1, Ordering::SeqCst);
        debug!(key = %key, bytes = value.len(), "Stored value in memory");
        Ok(())
    }

    async fn quit(&mut self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out clones of one [`MemoryStorage`]
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    storage: MemoryStorage,
}

impl MemoryConnector {
    /// Connector over `storage`
    #[must_use]
    pub fn new(storage: MemoryStorage) -> Self {
        Self { storage }
    }

    /// The shared storage
    #[must_use]
    pub fn storage(&self) -> &MemoryStorage {
        &self.storage
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, target: &ConnectionTarget) -> Result<Box<dyn BrainStorage>> {
        debug!(prefix = %target.prefix(), "Connected to in-memory storage");
        Ok(Box::new(self.storage.clone()))
    }
}
