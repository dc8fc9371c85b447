//! Version Snapshot Store
//!
//! Persists immutable, uniquely identified version snapshots in a
//! conditional key-value backend and reads them back by id.
//!
//! A snapshot is written at most once: [`SnapshotStore::write_if_absent`]
//! relies on the backend's atomic conditional put, so concurrent writers of
//! the same id get exactly one winner and `AlreadyExists` for the rest.

pub mod config;
pub mod model;
pub mod storage;
pub mod utils;

pub use config::{BackendType, ConfigError, StoreConfig};
pub use model::{Id, ValidationError, VersionSnapshot};
pub use storage::{init_store, SnapshotStore, StoreError, VersionSnapshotStore};
