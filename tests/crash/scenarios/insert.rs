//! Insert crash scenarios
//!
//! The journal is written before any other file changes, so an insert
//! interrupted at any later point is rolled forward on the next open.

use filedb::crash_point::points;

use crate::crash::{assert_consistent, execute_ok, execute_with_crash_point, CrashStore};

const BOB: &str = r#"{"Name": "Bob", "Age": 30}"#;

fn seeded() -> CrashStore {
    let store = CrashStore::new();
    execute_ok(&store.config_path, &["insert"], Some(r#"{"Name": "Alice", "Age": 20}"#));
    store
}

fn crash_insert_and_recover(point: &str) {
    let store = seeded();
    execute_with_crash_point(&store.config_path, point, &["insert"], Some(BOB));
    assert!(store.journal_exists());

    assert_consistent(&store);

    let db = store.open();
    let bob = db.find_by("Name", "Bob").unwrap().expect("insert rolled forward");
    assert_eq!(bob.id, 2);
    assert_eq!(db.count(), 2);
    assert_eq!(db.peek_next_id(), 3);
    assert_eq!(db.list_index_entries("Age", "30")[0].other("Name"), Some("Bob"));
}

#[test]
fn test_insert_crash_after_journal() {
    crash_insert_and_recover(points::INSERT_AFTER_JOURNAL);
}

#[test]
fn test_insert_crash_after_index() {
    crash_insert_and_recover(points::INSERT_AFTER_INDEX);
}

#[test]
fn test_insert_crash_after_count() {
    crash_insert_and_recover(points::INSERT_AFTER_COUNT);
}

/// After recovery the store keeps accepting inserts with fresh ids.
#[test]
fn test_insert_after_recovery_continues() {
    let store = seeded();
    execute_with_crash_point(&store.config_path, points::INSERT_AFTER_INDEX, &["insert"], Some(BOB));

    let data = execute_ok(&store.config_path, &["insert"], Some(r#"{"Name": "Carol", "Age": 30}"#));
    assert_eq!(data["id"], 3);

    let entries = execute_ok(&store.config_path, &["entries", "--field", "Age", "--value", "30"], None);
    assert_eq!(entries.as_array().map(Vec::len), Some(2));
    assert_consistent(&store);
}

/// A rejected insert never reaches the journal.
#[test]
fn test_rejected_insert_leaves_no_journal() {
    let store = seeded();
    let result = crate::crash::run_filedb(
        &store.config_path,
        &["insert"],
        Some(r#"{"Name": "Alice", "Age": 99}"#),
        Some(points::INSERT_AFTER_JOURNAL),
    );
    assert!(result.crashed);
    assert!(result.stdout.contains("FILEDB_UNIQUE_VIOLATION"));
    assert!(!store.journal_exists());
    assert_consistent(&store);
}
