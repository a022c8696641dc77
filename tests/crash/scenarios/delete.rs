//! Delete crash scenarios

use filedb::crash_point::points;

use crate::crash::{assert_consistent, execute_ok, execute_with_crash_point, CrashStore};

fn crash_delete_and_recover(point: &str) {
    let store = CrashStore::new();
    execute_ok(&store.config_path, &["insert"], Some(r#"{"Name": "Alice", "Age": 20}"#));
    execute_ok(&store.config_path, &["insert"], Some(r#"{"Name": "Bob", "Age": 20}"#));

    execute_with_crash_point(&store.config_path, point, &["delete", "1"], None);

    assert_consistent(&store);

    let db = store.open();
    assert!(db.find_by("Name", "Alice").unwrap().is_none());
    assert_eq!(db.count(), 1);
    assert_eq!(db.peek_next_id(), 3);
    let twenty: Vec<u64> = db.list_index_entries("Age", "20").iter().map(|e| e.id).collect();
    assert_eq!(twenty, vec![2]);
}

#[test]
fn test_delete_crash_after_journal() {
    crash_delete_and_recover(points::DELETE_AFTER_JOURNAL);
}

#[test]
fn test_delete_crash_after_count() {
    crash_delete_and_recover(points::DELETE_AFTER_COUNT);
}

#[test]
fn test_delete_crash_after_index() {
    crash_delete_and_recover(points::DELETE_AFTER_INDEX);
}
