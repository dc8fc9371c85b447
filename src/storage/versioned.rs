//! Write-once version snapshot store over a conditional key-value backend.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use super::backend::{PutOutcome, SnapshotBackend};
use super::key::derive_key;
use super::marshal::{decode, encode, DecodeError};
use super::{Result, SnapshotStore, StoreError};
use crate::model::{Id, VersionSnapshot};

/// [`SnapshotStore`] implementation shared by every backend.
///
/// Holds the backend for its whole lifetime and no other state, so one
/// instance can serve any number of concurrent callers.
pub struct VersionSnapshotStore<B> {
    backend: B,
    request_timeout: Option<Duration>,
}

impl<B: SnapshotBackend> VersionSnapshotStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            request_timeout: None,
        }
    }

    /// Apply `timeout` to every backend request issued through the trait
    /// methods.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    /// Like [`SnapshotStore::get`] with an explicit deadline for this call.
    ///
    /// Elapsing yields `StoreError::Timeout`; a read has no side effects.
    pub async fn get_with_timeout(
        &self,
        id: &Id,
        timeout: Option<Duration>,
    ) -> Result<VersionSnapshot> {
        id.validate()?;
        let key = derive_key(id);

        let item = match within(timeout, self.backend.get_item(&key)).await {
            Some(result) => result.map_err(|source| {
                warn!(
                    partition_key = %key.partition_key,
                    sort_key = %key.sort_key,
                    error = %source,
                    "Backend get_item failed"
                );
                StoreError::Backend {
                    operation: "get_item",
                    key: key.clone(),
                    source,
                }
            })?,
            None => {
                warn!(
                    partition_key = %key.partition_key,
                    sort_key = %key.sort_key,
                    "Version snapshot read timed out"
                );
                return Err(StoreError::Timeout {
                    operation: "get",
                    id: id.clone(),
                });
            }
        };

        let Some(item) = item else {
            debug!(
                partition_key = %key.partition_key,
                sort_key = %key.sort_key,
                "Version snapshot not found"
            );
            return Err(StoreError::NotFound { id: id.clone() });
        };

        let snapshot = decode(&item)
            .and_then(|snapshot| {
                if snapshot.id == *id {
                    Ok(snapshot)
                } else {
                    Err(DecodeError::IdMismatch {
                        requested: id.clone(),
                        found: snapshot.id,
                    })
                }
            })
            .map_err(|source| {
                error!(
                    partition_key = %key.partition_key,
                    sort_key = %key.sort_key,
                    error = %source,
                    "Stored version snapshot is unreadable"
                );
                StoreError::Decode {
                    id: id.clone(),
                    source,
                }
            })?;

        debug!(
            partition_key = %key.partition_key,
            sort_key = %key.sort_key,
            size = snapshot.snapshot_spec.len(),
            "Retrieved version snapshot"
        );
        Ok(snapshot)
    }

    /// Like [`SnapshotStore::write_if_absent`] with an explicit deadline for
    /// this call.
    ///
    /// Elapsing yields `StoreError::OutcomeUnknown`: the request may or may
    /// not have been applied.
    pub async fn write_if_absent_with_timeout(
        &self,
        snapshot: &VersionSnapshot,
        timeout: Option<Duration>,
    ) -> Result<()> {
        snapshot.validate()?;
        let key = derive_key(&snapshot.id);
        let item = encode(snapshot);

        let outcome = within(timeout, self.backend.put_item_if_not_exists(&key, item)).await;
        match outcome {
            Some(Ok(PutOutcome::Written)) => {
                debug!(
                    partition_key = %key.partition_key,
                    sort_key = %key.sort_key,
                    size = snapshot.snapshot_spec.len(),
                    "Stored version snapshot"
                );
                Ok(())
            }
            Some(Ok(PutOutcome::ConditionFailed)) => {
                debug!(
                    partition_key = %key.partition_key,
                    sort_key = %key.sort_key,
                    "Version snapshot already exists"
                );
                Err(StoreError::AlreadyExists {
                    id: snapshot.id.clone(),
                })
            }
            Some(Err(source)) if source.outcome_unknown => {
                warn!(
                    partition_key = %key.partition_key,
                    sort_key = %key.sort_key,
                    error = %source,
                    "Version snapshot write failed after dispatch; outcome unknown"
                );
                Err(StoreError::OutcomeUnknown {
                    id: snapshot.id.clone(),
                })
            }
            Some(Err(source)) => {
                warn!(
                    partition_key = %key.partition_key,
                    sort_key = %key.sort_key,
                    error = %source,
                    "Backend conditional put failed"
                );
                Err(StoreError::Backend {
                    operation: "put_item_if_not_exists",
                    key,
                    source,
                })
            }
            None => {
                warn!(
                    partition_key = %key.partition_key,
                    sort_key = %key.sort_key,
                    "Version snapshot write timed out; outcome unknown"
                );
                Err(StoreError::OutcomeUnknown {
                    id: snapshot.id.clone(),
                })
            }
        }
    }
}

#[async_trait]
impl<B: SnapshotBackend> SnapshotStore for VersionSnapshotStore<B> {
    async fn get(&self, id: &Id) -> Result<VersionSnapshot> {
        self.get_with_timeout(id, self.request_timeout).await
    }

    async fn write_if_absent(&self, snapshot: &VersionSnapshot) -> Result<()> {
        self.write_if_absent_with_timeout(snapshot, self.request_timeout)
            .await
    }
}

/// Await `fut`, bounded by `timeout` when one is set. `None` means elapsed.
async fn within<F: Future>(timeout: Option<Duration>, fut: F) -> Option<F::Output> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut).await.ok(),
        None => Some(fut.await),
    }
}
