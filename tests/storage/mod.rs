//! Shared storage integration tests.
//!
//! Tests the SnapshotStore interface against every backend.
//! Each backend's test binary imports these functions through the runner macro.

pub mod snapshot_store_tests;
