//! Adapter behavior over the in-memory store: the insert/read/update/delete/
//! scan contract, the delete quirk, and the approximate scan ordering.

use redis_bench_adapter::test_utils::InMemoryStore;
use redis_bench_adapter::{AdapterError, FieldMap, StoreAdapter};

const TABLE: &str = "usertable";

fn record(pairs: &[(&str, &str)]) -> FieldMap {
    pairs
        .iter()
        .map(|(field, value)| (field.to_string(), value.as_bytes().to_vec()))
        .collect()
}

fn adapter() -> StoreAdapter<InMemoryStore> {
    StoreAdapter::with_connection(InMemoryStore::new())
}

#[tokio::test]
async fn insert_then_read_returns_the_inserted_field_set() {
    let adapter = adapter();
    let fields = record(&[("field0", "alpha"), ("field1", "beta")]);
    adapter.insert(TABLE, "user1", &fields).await.unwrap();

    let read_back = adapter.read(TABLE, "user1", None).await.unwrap();
    assert_eq!(read_back, fields);
}

#[tokio::test]
async fn filtered_read_omits_fields_absent_in_the_store() {
    let adapter = adapter();
    let fields = record(&[("field0", "alpha")]);
    adapter.insert(TABLE, "user1", &fields).await.unwrap();

    let filter = vec!["field0".to_string(), "missing".to_string()];
    let read_back = adapter.read(TABLE, "user1", Some(&filter)).await.unwrap();
    assert_eq!(read_back, record(&[("field0", "alpha")]));
}

#[tokio::test]
async fn read_resolving_no_fields_fails() {
    let adapter = adapter();
    let err = adapter.read(TABLE, "ghost", None).await.unwrap_err();
    assert!(matches!(err, AdapterError::EmptyRecord { .. }));

    // Same when the filter names only fields the record lacks.
    let fields = record(&[("field0", "alpha")]);
    adapter.insert(TABLE, "user1", &fields).await.unwrap();
    let filter = vec!["missing".to_string()];
    let err = adapter
        .read(TABLE, "user1", Some(&filter))
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::EmptyRecord { .. }));
}

#[tokio::test]
async fn deleting_a_never_inserted_key_fails() {
    let adapter = adapter();
    let err = adapter.delete(TABLE, "ghost").await.unwrap_err();
    assert!(matches!(err, AdapterError::DeleteMiss { .. }));
}

#[tokio::test]
async fn deleting_twice_fails_only_the_second_time() {
    let adapter = adapter();
    let fields = record(&[("field0", "alpha")]);
    adapter.insert(TABLE, "user1", &fields).await.unwrap();

    adapter.delete(TABLE, "user1").await.unwrap();
    let err = adapter.delete(TABLE, "user1").await.unwrap_err();
    assert!(matches!(err, AdapterError::DeleteMiss { .. }));
}

#[tokio::test]
async fn delete_succeeds_while_either_record_or_index_entry_remains() {
    // The failure condition is both removals reporting zero effect, so a key
    // left only in the index still deletes cleanly.
    let store = InMemoryStore::new();
    let adapter = StoreAdapter::with_connection(store.clone());
    let fields = record(&[("field0", "alpha")]);
    adapter.insert(TABLE, "user1", &fields).await.unwrap();

    // Remove the record behind the adapter's back, leaving the index entry.
    let mut raw = store.clone();
    let removed: i64 = redis::cmd("DEL")
        .arg("user1")
        .query_async(&mut raw)
        .await
        .unwrap();
    assert_eq!(removed, 1);

    adapter.delete(TABLE, "user1").await.unwrap();
    let err = adapter.delete(TABLE, "user1").await.unwrap_err();
    assert!(matches!(err, AdapterError::DeleteMiss { .. }));
}

#[tokio::test]
async fn delete_removes_the_index_entry() {
    let adapter = adapter();
    let fields = record(&[("field0", "alpha")]);
    adapter.insert(TABLE, "user1", &fields).await.unwrap();
    adapter.delete(TABLE, "user1").await.unwrap();

    let scanned = adapter.scan(TABLE, "user1", 10, None).await.unwrap();
    assert!(scanned.is_empty());
}

#[tokio::test]
async fn scan_from_a_lower_scored_start_key_includes_the_record() {
    let adapter = adapter();
    let fields = record(&[("field0", "alpha")]);
    adapter.insert(TABLE, "user1", &fields).await.unwrap();

    // Scanning from the key itself satisfies score(start) <= score(key).
    let scanned = adapter.scan(TABLE, "user1", 1, None).await.unwrap();
    assert_eq!(scanned, vec![fields]);
}

#[tokio::test]
async fn scan_order_follows_key_scores_not_lexicographic_order() {
    // "ab" sorts before "z" lexicographically but scores above it, so the
    // scan yields "z" first. The index orders by a scattered hash of the
    // key; approximate ordering is the documented contract.
    let adapter = adapter();
    let z_fields = record(&[("owner", "z")]);
    let ab_fields = record(&[("owner", "ab")]);
    adapter.insert(TABLE, "z", &z_fields).await.unwrap();
    adapter.insert(TABLE, "ab", &ab_fields).await.unwrap();

    let scanned = adapter.scan(TABLE, "z", 10, None).await.unwrap();
    assert_eq!(scanned, vec![z_fields, ab_fields]);
}

#[tokio::test]
async fn scan_honors_the_record_count_limit() {
    let adapter = adapter();
    for i in 0..5 {
        let key = format!("user{i}");
        let fields = record(&[("field0", key.as_str())]);
        adapter.insert(TABLE, &key, &fields).await.unwrap();
    }
    let scanned = adapter.scan(TABLE, "user0", 2, None).await.unwrap();
    assert_eq!(scanned.len(), 2);
}

#[tokio::test]
async fn scan_passes_the_field_filter_through_to_each_read() {
    let adapter = adapter();
    let fields = record(&[("field0", "alpha"), ("field1", "beta")]);
    adapter.insert(TABLE, "user1", &fields).await.unwrap();

    let filter = vec!["field1".to_string()];
    let scanned = adapter.scan(TABLE, "user1", 1, Some(&filter)).await.unwrap();
    assert_eq!(scanned, vec![record(&[("field1", "beta")])]);
}

#[tokio::test]
async fn scan_reports_a_vanished_record_as_an_empty_field_map() {
    let store = InMemoryStore::new();
    let adapter = StoreAdapter::with_connection(store.clone());
    let fields = record(&[("field0", "alpha")]);
    adapter.insert(TABLE, "user1", &fields).await.unwrap();

    // Drop the record but not its index entry, as a concurrent deleter
    // between the two halves of a delete would.
    let mut raw = store.clone();
    let _: i64 = redis::cmd("DEL")
        .arg("user1")
        .query_async(&mut raw)
        .await
        .unwrap();

    let scanned = adapter.scan(TABLE, "user1", 1, None).await.unwrap();
    assert_eq!(scanned, vec![FieldMap::new()]);
}

#[tokio::test]
async fn update_overwrites_previous_field_values() {
    let adapter = adapter();
    let original = record(&[("field0", "before")]);
    adapter.insert(TABLE, "user1", &original).await.unwrap();
    assert_eq!(adapter.read(TABLE, "user1", None).await.unwrap(), original);

    let updated = record(&[("field0", "after")]);
    adapter.update(TABLE, "user1", &updated).await.unwrap();
    assert_eq!(adapter.read(TABLE, "user1", None).await.unwrap(), updated);
}

#[tokio::test]
async fn update_of_a_nonexistent_key_is_not_fatal() {
    // Store-dependent outcome: this store creates the record. Either way the
    // call must return a result, not crash.
    let adapter = adapter();
    let fields = record(&[("field0", "alpha")]);
    let result = adapter.update(TABLE, "ghost", &fields).await;
    assert!(result.is_ok());

    // The key was never indexed, so scans do not resolve it.
    let scanned = adapter.scan(TABLE, "ghost", 10, None).await.unwrap();
    assert!(scanned.is_empty());
}

#[tokio::test]
async fn inserts_and_read_misses_land_in_the_operation_log() {
    let dir = tempfile::tempdir().unwrap();
    let logger = redis_bench_adapter::DataLogger::open(&dir.path().join("oplog")).unwrap();
    let log_path = logger.path().to_path_buf();
    let adapter = StoreAdapter::with_connection(InMemoryStore::new()).with_datalog(logger);

    let fields = record(&[("field0", "alpha")]);
    adapter.insert(TABLE, "user1", &fields).await.unwrap();
    let after_insert = {
        adapter.close().unwrap();
        std::fs::read(&log_path).unwrap().len()
    };
    assert!(after_insert > 0);

    let logger = redis_bench_adapter::DataLogger::open(&dir.path().join("oplog2")).unwrap();
    let log_path = logger.path().to_path_buf();
    let adapter = StoreAdapter::with_connection(InMemoryStore::new()).with_datalog(logger);
    let err = adapter.read(TABLE, "ghost", None).await.unwrap_err();
    assert!(matches!(err, AdapterError::EmptyRecord { .. }));
    adapter.close().unwrap();
    // A miss frame is key plus two length words and an empty payload.
    assert_eq!(std::fs::read(&log_path).unwrap().len(), 8 + "ghost".len());
}

#[tokio::test]
async fn operations_run_concurrently_over_one_adapter() {
    let adapter = std::sync::Arc::new(adapter());
    let mut handles = Vec::new();
    for i in 0..8 {
        let adapter = adapter.clone();
        handles.push(tokio::spawn(async move {
            let key = format!("user{i}");
            let fields = record(&[("field0", key.as_str())]);
            adapter.insert(TABLE, &key, &fields).await.unwrap();
            let read_back = adapter.read(TABLE, &key, None).await.unwrap();
            assert_eq!(read_back, fields);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
}
