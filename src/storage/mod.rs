//! Storage for version snapshots.
//!
//! Layers, leaf first:
//! - [`key`]: id to `(partitionKey, sortKey)` derivation
//! - [`attribute`] / [`marshal`]: snapshot to schema-less document and back
//! - [`backend`]: the conditional key-value contract a backend must meet
//! - [`versioned`]: the write-once store built on that contract
//!
//! ## Backends
//!
//! - `InMemoryBackend` - process-local map
//! - `DynamoBackend` (feature: dynamo) - DynamoDB table

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::config::{BackendType, ConfigError, StoreConfig};
use crate::model::{Id, ValidationError};

pub mod attribute;
pub mod backend;
pub mod key;
pub mod marshal;
pub mod memory;
mod snapshot_store;
mod versioned;

#[cfg(feature = "dynamo")]
pub mod dynamo;

pub use attribute::{AttributeMap, AttributeValue};
pub use backend::{BackendError, PutOutcome, SnapshotBackend};
pub use key::{derive_key, StorageKey, DELIMITER};
pub use marshal::{decode, encode, DecodeError};
pub use memory::InMemoryBackend;
pub use snapshot_store::SnapshotStore;
pub use versioned::VersionSnapshotStore;

#[cfg(feature = "dynamo")]
pub use dynamo::DynamoBackend;

/// Errors returned by [`SnapshotStore`] operations.
///
/// `NotFound` and `AlreadyExists` are ordinary outcomes, not failures of
/// the store; use the predicates below instead of matching on messages.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid version snapshot id: {0}")]
    Validation(#[from] ValidationError),

    #[error("Version snapshot not found: {id}")]
    NotFound { id: Id },

    #[error("Version snapshot already exists: {id}")]
    AlreadyExists { id: Id },

    #[error("Failed to decode version snapshot {id}: {source}")]
    Decode { id: Id, source: DecodeError },

    #[error("Backend {operation} failed for key {key}: {source}")]
    Backend {
        operation: &'static str,
        key: StorageKey,
        source: BackendError,
    },

    #[error("Version snapshot {operation} timed out: {id}")]
    Timeout { operation: &'static str, id: Id },

    #[error("Version snapshot write outcome unknown (timed out after dispatch): {id}")]
    OutcomeUnknown { id: Id },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists { .. })
    }

    /// Whether repeating the same call may succeed.
    ///
    /// A timed-out write is not retryable as-is: the caller must first
    /// find out whether it landed (a retry reports `AlreadyExists` if so).
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Backend { source, .. } => source.retryable,
            StoreError::Timeout { .. } => true,
            _ => false,
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Initialize a snapshot store based on configuration.
///
/// # Errors
///
/// Returns error if the configured backend requires an unavailable feature.
pub async fn init_store(
    config: &StoreConfig,
) -> std::result::Result<Arc<dyn SnapshotStore>, ConfigError> {
    let timeout = config.request_timeout();

    match config.backend {
        BackendType::Memory => {
            info!(timeout = ?timeout, "SnapshotStore: memory");
            let store = VersionSnapshotStore::new(InMemoryBackend::new());
            Ok(Arc::new(apply_timeout(store, timeout)))
        }
        #[cfg(feature = "dynamo")]
        BackendType::Dynamo => {
            info!(
                table = %config.table_name,
                region = ?config.region,
                endpoint = ?config.endpoint,
                timeout = ?timeout,
                "SnapshotStore: dynamo"
            );
            let backend = DynamoBackend::new(
                &config.table_name,
                config.region.as_deref(),
                config.endpoint.as_deref(),
            )
            .await;
            let store = VersionSnapshotStore::new(backend);
            Ok(Arc::new(apply_timeout(store, timeout)))
        }
        #[cfg(not(feature = "dynamo"))]
        BackendType::Dynamo => {
            tracing::error!("DynamoDB backend requested but 'dynamo' feature is not enabled");
            Err(ConfigError::Invalid(
                "DynamoDB backend requires the 'dynamo' feature".to_string(),
            ))
        }
    }
}

fn apply_timeout<B: SnapshotBackend>(
    store: VersionSnapshotStore<B>,
    timeout: Option<std::time::Duration>,
) -> VersionSnapshotStore<B> {
    match timeout {
        Some(timeout) => store.with_request_timeout(timeout),
        None => store,
    }
}
