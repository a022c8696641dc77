//! Update crash scenarios

use filedb::crash_point::points;
use filedb::Entity;

use crate::crash::{assert_consistent, execute_ok, execute_with_crash_point, CrashStore};

fn crash_update_and_recover(point: &str) {
    let store = CrashStore::new();
    execute_ok(&store.config_path, &["insert"], Some(r#"{"Name": "Alice", "Age": 20}"#));
    execute_ok(&store.config_path, &["insert"], Some(r#"{"Name": "Peter", "Age": 20}"#));

    execute_with_crash_point(
        &store.config_path,
        point,
        &["update", "1"],
        Some(r#"{"Name": "Alice S", "Age": 21}"#),
    );

    assert_consistent(&store);

    let db = store.open();
    let alice = db.find(1).unwrap();
    assert_eq!(alice.value("Name"), "Alice S");
    assert_eq!(alice.value("Age"), "21");
    assert!(db.find_by("Name", "Alice").unwrap().is_none());
    assert_eq!(db.list_index_entries("Age", "21")[0].other("Name"), Some("Alice S"));
    assert_eq!(db.count(), 2);
    assert_eq!(db.peek_next_id(), 3);
}

#[test]
fn test_update_crash_after_journal() {
    crash_update_and_recover(points::UPDATE_AFTER_JOURNAL);
}

#[test]
fn test_update_crash_after_index() {
    crash_update_and_recover(points::UPDATE_AFTER_INDEX);
}
