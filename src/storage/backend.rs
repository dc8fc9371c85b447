//! Backend adapter contract.

use async_trait::async_trait;
use thiserror::Error;

use super::attribute::AttributeMap;
use super::key::StorageKey;

/// Failure reported by a backend adapter.
///
/// `retryable` is the adapter's classification (throttling, transport)
/// and is surfaced to callers through `StoreError::is_retryable`.
///
/// `outcome_unknown` marks a conditional put that failed after the request
/// reached the service (lost response, server-side timeout). The item may
/// or may not be stored; such errors are never retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
    pub retryable: bool,
    pub outcome_unknown: bool,
}

impl BackendError {
    pub fn retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
            outcome_unknown: false,
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
            outcome_unknown: false,
        }
    }

    pub fn outcome_unknown(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
            outcome_unknown: true,
        }
    }
}

/// Result of a conditional put.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// No item existed at the key; the document is now stored.
    Written,
    /// An item already existed at the key; nothing was changed.
    ConditionFailed,
}

/// Key-value service with point reads and atomic conditional inserts.
///
/// Implementations must be safe to share across concurrent callers.
/// `put_item_if_not_exists` must evaluate the existence check and the
/// insert as one atomic step; callers rely on it as the only concurrency
/// primitive.
///
/// # Implementations
///
/// - `InMemoryBackend`: process-local map for tests and embedding
/// - `DynamoBackend`: DynamoDB table (feature `dynamo`)
#[async_trait]
pub trait SnapshotBackend: Send + Sync {
    /// Point lookup by exact key. `None` if no item exists.
    async fn get_item(&self, key: &StorageKey) -> Result<Option<AttributeMap>, BackendError>;

    /// Insert `item` at `key` only if neither key attribute exists there yet.
    ///
    /// Adapters must not resend the request on failure. A failure after
    /// dispatch is reported with [`BackendError::outcome_unknown`].
    async fn put_item_if_not_exists(
        &self,
        key: &StorageKey,
        item: AttributeMap,
    ) -> Result<PutOutcome, BackendError>;
}
