//! SnapshotStore interface tests.
//!
//! These tests verify the contract of the SnapshotStore trait.
//! Each backend should run these tests. Every test uses a fresh asset id so
//! runs against a shared table do not interfere.

use std::sync::Arc;

use version_snapshot::{Id, SnapshotStore, StoreError, ValidationError, VersionSnapshot};

/// Create an id under a unique asset.
pub fn make_id(resource_name: &str) -> Id {
    Id::new(
        format!("asset-{}", uuid::Uuid::new_v4()),
        "config",
        resource_name,
        "us",
    )
}

pub fn make_snapshot(id: &Id, spec: &[u8]) -> VersionSnapshot {
    VersionSnapshot::new(id.clone(), spec.to_vec())
}

// =============================================================================
// SnapshotStore::get tests
// =============================================================================

pub async fn test_get_nonexistent<S: SnapshotStore + ?Sized>(store: &S) {
    let id = make_id("never-written");

    let err = store.get(&id).await.expect_err("get should fail");
    match err {
        StoreError::NotFound { id: missing } => assert_eq!(missing, id),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

pub async fn test_read_your_write<S: SnapshotStore + ?Sized>(store: &S) {
    let id = make_id("primary");
    let snapshot = make_snapshot(&id, b"hello");

    store
        .write_if_absent(&snapshot)
        .await
        .expect("write should succeed");

    let retrieved = store.get(&id).await.expect("get should succeed");
    assert_eq!(retrieved, snapshot);
}

pub async fn test_get_preserves_binary_payload<S: SnapshotStore + ?Sized>(store: &S) {
    let id = make_id("binary");
    let data: Vec<u8> = (0..=255u8).rev().collect();

    store
        .write_if_absent(&make_snapshot(&id, &data))
        .await
        .expect("write should succeed");

    let retrieved = store.get(&id).await.expect("get should succeed");
    assert_eq!(retrieved.snapshot_spec, data);
}

pub async fn test_get_with_structurally_equal_id<S: SnapshotStore + ?Sized>(store: &S) {
    let id = make_id("primary");
    store
        .write_if_absent(&make_snapshot(&id, b"hello"))
        .await
        .expect("write should succeed");

    let rebuilt = Id::new(
        id.asset_id.clone(),
        id.resource_type.clone(),
        id.resource_name.clone(),
        id.location.clone(),
    );
    let retrieved = store.get(&rebuilt).await.expect("get should succeed");
    assert_eq!(retrieved.snapshot_spec, b"hello");
}

// =============================================================================
// SnapshotStore::write_if_absent tests
// =============================================================================

pub async fn test_write_once<S: SnapshotStore + ?Sized>(store: &S) {
    let id = make_id("primary");

    store
        .write_if_absent(&make_snapshot(&id, b"hello"))
        .await
        .expect("first write should succeed");

    let err = store
        .write_if_absent(&make_snapshot(&id, b"other"))
        .await
        .expect_err("second write should be rejected");
    assert!(err.is_already_exists(), "unexpected error: {:?}", err);

    let retrieved = store.get(&id).await.expect("get should succeed");
    assert_eq!(retrieved.snapshot_spec, b"hello", "original payload must survive");
}

pub async fn test_rewrite_same_payload_reports_exists<S: SnapshotStore + ?Sized>(store: &S) {
    let id = make_id("primary");
    let snapshot = make_snapshot(&id, b"same");

    store.write_if_absent(&snapshot).await.unwrap();
    let err = store.write_if_absent(&snapshot).await.unwrap_err();
    assert!(err.is_already_exists());
}

pub async fn test_empty_payload<S: SnapshotStore + ?Sized>(store: &S) {
    let id = make_id("empty");

    store
        .write_if_absent(&make_snapshot(&id, b""))
        .await
        .expect("write should succeed");

    let retrieved = store.get(&id).await.expect("get should succeed");
    assert!(retrieved.snapshot_spec.is_empty());
}

// =============================================================================
// Validation tests
// =============================================================================

pub async fn test_delimiter_collision_rejected<S: SnapshotStore + ?Sized>(store: &S) {
    let asset = format!("asset-{}", uuid::Uuid::new_v4());
    let a = Id::new(asset.clone(), "a^b", "c", "us");
    let b = Id::new(asset, "a", "b^c", "us");

    for id in [a, b] {
        let err = store
            .write_if_absent(&make_snapshot(&id, b"x"))
            .await
            .expect_err("write should be rejected");
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::ContainsDelimiter { .. })
        ));

        let err = store.get(&id).await.expect_err("get should be rejected");
        assert!(matches!(err, StoreError::Validation(_)));
    }
}

pub async fn test_empty_field_rejected<S: SnapshotStore + ?Sized>(store: &S) {
    let id = Id::new(format!("asset-{}", uuid::Uuid::new_v4()), "config", "", "us");

    let err = store
        .write_if_absent(&make_snapshot(&id, b"x"))
        .await
        .expect_err("write should be rejected");
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::EmptyField("resourceName"))
    ));
}

// =============================================================================
// Isolation tests
// =============================================================================

pub async fn test_id_field_isolation<S: SnapshotStore + ?Sized>(store: &S) {
    let base = make_id("primary");
    let mut other_location = base.clone();
    other_location.location = "eu".to_string();
    let mut other_type = base.clone();
    other_type.resource_type = "secret".to_string();

    store.write_if_absent(&make_snapshot(&base, b"1")).await.unwrap();
    store
        .write_if_absent(&make_snapshot(&other_location, b"2"))
        .await
        .unwrap();
    store
        .write_if_absent(&make_snapshot(&other_type, b"3"))
        .await
        .unwrap();

    assert_eq!(store.get(&base).await.unwrap().snapshot_spec, b"1");
    assert_eq!(store.get(&other_location).await.unwrap().snapshot_spec, b"2");
    assert_eq!(store.get(&other_type).await.unwrap().snapshot_spec, b"3");
}

// =============================================================================
// Concurrency tests
// =============================================================================

pub async fn test_concurrent_race<S: SnapshotStore + ?Sized + 'static>(store: Arc<S>) {
    const WRITERS: u8 = 8;
    let id = make_id("raced");

    let writes = (0..WRITERS).map(|n| {
        let store = Arc::clone(&store);
        let snapshot = make_snapshot(&id, &[n]);
        async move {
            let result = store.write_if_absent(&snapshot).await;
            (n, result)
        }
    });
    let results = futures::future::join_all(writes).await;

    let mut winners = Vec::new();
    for (n, result) in results {
        match result {
            Ok(()) => winners.push(n),
            Err(e) => assert!(e.is_already_exists(), "unexpected error: {:?}", e),
        }
    }
    assert_eq!(winners.len(), 1, "exactly one writer must win");

    let retrieved = store.get(&id).await.unwrap();
    assert_eq!(retrieved.snapshot_spec, vec![winners[0]]);
}

// =============================================================================
// Test runner macro
// =============================================================================

/// Run all SnapshotStore interface tests against a store implementation.
///
/// Takes an `Arc` of the store; the race test shares it across writers.
#[macro_export]
macro_rules! run_snapshot_store_tests {
    ($store:expr) => {
        use $crate::storage::snapshot_store_tests::*;

        let store = $store;

        // get tests
        test_get_nonexistent(&*store).await;
        println!("  test_get_nonexistent: PASSED");

        test_read_your_write(&*store).await;
        println!("  test_read_your_write: PASSED");

        test_get_preserves_binary_payload(&*store).await;
        println!("  test_get_preserves_binary_payload: PASSED");

        test_get_with_structurally_equal_id(&*store).await;
        println!("  test_get_with_structurally_equal_id: PASSED");

        // write tests
        test_write_once(&*store).await;
        println!("  test_write_once: PASSED");

        test_rewrite_same_payload_reports_exists(&*store).await;
        println!("  test_rewrite_same_payload_reports_exists: PASSED");

        test_empty_payload(&*store).await;
        println!("  test_empty_payload: PASSED");

        // validation tests
        test_delimiter_collision_rejected(&*store).await;
        println!("  test_delimiter_collision_rejected: PASSED");

        test_empty_field_rejected(&*store).await;
        println!("  test_empty_field_rejected: PASSED");

        // isolation tests
        test_id_field_isolation(&*store).await;
        println!("  test_id_field_isolation: PASSED");

        // concurrency tests
        test_concurrent_race(std::sync::Arc::clone(&store)).await;
        println!("  test_concurrent_race: PASSED");
    };
}
