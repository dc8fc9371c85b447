//! SnapshotStore trait definition.

use async_trait::async_trait;

use super::Result;
use crate::model::{Id, VersionSnapshot};

/// Interface for version snapshot persistence.
///
/// Snapshots are write-once: each [`Id`] moves from absent to present
/// exactly once and never back. There is no update or delete.
///
/// Callers are expected to branch on the outcome rather than treat every
/// error alike:
/// - `StoreError::NotFound` from `get` means nothing was captured yet
/// - `StoreError::AlreadyExists` from `write_if_absent` means the snapshot
///   was captured earlier (or by a concurrent writer) and retrying is moot
///
/// # Implementations
///
/// - `VersionSnapshotStore<B>`: write-once protocol over any `SnapshotBackend`
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Retrieve the snapshot stored under `id`.
    async fn get(&self, id: &Id) -> Result<VersionSnapshot>;

    /// Persist `snapshot` unless a snapshot with the same id exists.
    ///
    /// Never overwrites. The existence check is delegated to the backend's
    /// atomic conditional put.
    async fn write_if_absent(&self, snapshot: &VersionSnapshot) -> Result<()>;
}
