//! In-memory backend.
//!
//! Process-local map with an atomic conditional put. Used by tests and by
//! embedders that do not need durability. Failure and latency injection
//! hooks let callers exercise error paths without a real service.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::storage::attribute::AttributeMap;
use crate::storage::backend::{BackendError, PutOutcome, SnapshotBackend};
use crate::storage::key::StorageKey;

/// In-memory implementation of [`SnapshotBackend`].
#[derive(Default)]
pub struct InMemoryBackend {
    items: RwLock<HashMap<StorageKey, AttributeMap>>,
    fail_on_get: RwLock<bool>,
    fail_on_put: RwLock<bool>,
    lose_put_response: RwLock<bool>,
    latency: RwLock<Option<Duration>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `get_item` fail with a retryable error.
    pub async fn set_fail_on_get(&self, fail: bool) {
        *self.fail_on_get.write().await = fail;
    }

    /// Make every conditional put fail with a retryable error.
    pub async fn set_fail_on_put(&self, fail: bool) {
        *self.fail_on_put.write().await = fail;
    }

    /// Apply each conditional put, then report it as failed with an
    /// unknown outcome, as if the response had been lost in transit.
    pub async fn set_lose_put_response(&self, lose: bool) {
        *self.lose_put_response.write().await = lose;
    }

    /// Delay each request before it touches the map.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.write().await = latency;
    }

    /// Store `item` at `key` unconditionally, bypassing the marshaller.
    pub async fn insert_raw(&self, key: StorageKey, item: AttributeMap) {
        self.items.write().await.insert(key, item);
    }

    pub async fn get_raw(&self, key: &StorageKey) -> Option<AttributeMap> {
        self.items.read().await.get(key).cloned()
    }

    pub async fn stored_count(&self) -> usize {
        self.items.read().await.len()
    }

    async fn delay(&self) {
        let latency = *self.latency.read().await;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl SnapshotBackend for InMemoryBackend {
    async fn get_item(&self, key: &StorageKey) -> Result<Option<AttributeMap>, BackendError> {
        self.delay().await;
        if *self.fail_on_get.read().await {
            return Err(BackendError::retryable("injected get_item failure"));
        }
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn put_item_if_not_exists(
        &self,
        key: &StorageKey,
        item: AttributeMap,
    ) -> Result<PutOutcome, BackendError> {
        self.delay().await;
        if *self.fail_on_put.read().await {
            return Err(BackendError::retryable("injected put_item failure"));
        }

        // Check and insert under one write guard.
        let outcome = {
            let mut items = self.items.write().await;
            if items.contains_key(key) {
                debug!(key = %key, "Conditional put rejected: item exists");
                PutOutcome::ConditionFailed
            } else {
                items.insert(key.clone(), item);
                PutOutcome::Written
            }
        };

        if *self.lose_put_response.read().await {
            return Err(BackendError::outcome_unknown(
                "injected lost put_item response",
            ));
        }
        Ok(outcome)
    }
}
