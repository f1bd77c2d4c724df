use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::Result;

/// The external document collection the `delete-slot` command acts on.
#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Deletes the document stored under `key`.
    ///
    /// # Returns
    ///
    /// The number of deleted documents. Failures are reported as
    /// [`AppError::Collaborator`](crate::error::AppError::Collaborator).
    async fn delete_one(&self, key: &str) -> Result<u64>;
}

/// An in-process slot collection.
#[derive(Clone, Default)]
pub struct MemorySlotStore {
    slots: Arc<RwLock<HashMap<String, sonic_rs::Value>>>,
}

impl MemorySlotStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `document` under `key`, replacing any previous one.
    pub async fn insert(&self, key: impl Into<String>, document: sonic_rs::Value) {
        self.slots.write().await.insert(key.into(), document);
    }

    /// Whether a document is stored under `key`.
    pub async fn contains(&self, key: &str) -> bool {
        self.slots.read().await.contains_key(key)
    }
}

#[async_trait]
impl SlotStore for MemorySlotStore {
    async fn delete_one(&self, key: &str) -> Result<u64> {
        let removed = self.slots.write().await.remove(key);
        Ok(u64::from(removed.is_some()))
    }
}
