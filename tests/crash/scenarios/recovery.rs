//! Crashes during recovery itself
//!
//! Rolling a journal forward is idempotent: a process that dies while
//! recovering leaves the journal in place and the next open finishes
//! the job.

use std::fs;

use filedb::crash_point::points;

use crate::crash::{assert_consistent, execute_ok, execute_with_crash_point, CrashStore};

#[test]
fn test_crash_during_recovery() {
    let store = CrashStore::new();
    execute_ok(&store.config_path, &["insert"], Some(r#"{"Name": "Alice", "Age": 20}"#));
    execute_with_crash_point(
        &store.config_path,
        points::INSERT_AFTER_COUNT,
        &["insert"],
        Some(r#"{"Name": "Bob", "Age": 30}"#),
    );
    execute_with_crash_point(&store.config_path, points::RECOVERY_AFTER_APPLY, &["stat"], None);
    assert!(store.journal_exists());

    let stat = execute_ok(&store.config_path, &["stat"], None);
    assert_eq!(stat["count"], 2);
    assert_eq!(stat["next_id"], 3);
    assert!(!store.journal_exists());
    assert_consistent(&store);
}

/// A journal torn while being written is discarded untouched.
#[test]
fn test_torn_journal_discarded() {
    let store = CrashStore::new();
    execute_ok(&store.config_path, &["insert"], Some(r#"{"Name": "Alice", "Age": 20}"#));
    fs::write(store.data_dir().join("_journal.dat"), "insert 2 0000").unwrap();

    let stat = execute_ok(&store.config_path, &["stat"], None);
    assert_eq!(stat["count"], 1);
    assert!(!store.journal_exists());
    assert_consistent(&store);
}

/// Recovery has its own crash point alongside the mutation ones.
#[test]
fn test_crash_points_listed() {
    assert_eq!(points::all().len(), 9);
    assert!(points::all().contains(&points::RECOVERY_AFTER_APPLY));
}
