//! Crash point injection for durability tests
//!
//! Setting `FILEDB_CRASH_POINT=<name>` makes the process call
//! `std::process::abort()` when execution reaches the named point: no
//! cleanup, no unwinding. Integration tests drive the `filedb` binary with
//! this variable and then reopen the store to check recovery.
//!
//! ```bash
//! FILEDB_CRASH_POINT=insert_after_index filedb insert --config store.json
//! ```

use std::sync::OnceLock;

static CRASH_POINT: OnceLock<Option<String>> = OnceLock::new();

#[inline]
fn configured() -> Option<&'static str> {
    CRASH_POINT
        .get_or_init(|| std::env::var("FILEDB_CRASH_POINT").ok())
        .as_deref()
}

/// True if `FILEDB_CRASH_POINT` names this point
#[inline]
pub fn crash_point_enabled(name: &str) -> bool {
    configured() == Some(name)
}

/// Abort the process if the named crash point is enabled
#[inline]
pub fn maybe_crash(name: &str) {
    if crash_point_enabled(name) {
        eprintln!("[CRASH] Triggering crash at point: {}", name);
        std::process::abort();
    }
}

/// Named crash points, in the order a mutation passes them
pub mod points {
    pub const INSERT_AFTER_JOURNAL: &str = "insert_after_journal";
    pub const INSERT_AFTER_INDEX: &str = "insert_after_index";
    pub const INSERT_AFTER_COUNT: &str = "insert_after_count";

    pub const UPDATE_AFTER_JOURNAL: &str = "update_after_journal";
    pub const UPDATE_AFTER_INDEX: &str = "update_after_index";

    pub const DELETE_AFTER_JOURNAL: &str = "delete_after_journal";
    pub const DELETE_AFTER_COUNT: &str = "delete_after_count";
    pub const DELETE_AFTER_INDEX: &str = "delete_after_index";

    pub const RECOVERY_AFTER_APPLY: &str = "recovery_after_apply";

    /// Get all crash point names
    pub fn all() -> &'static [&'static str] {
        &[
            INSERT_AFTER_JOURNAL,
            INSERT_AFTER_INDEX,
            INSERT_AFTER_COUNT,
            UPDATE_AFTER_JOURNAL,
            UPDATE_AFTER_INDEX,
            DELETE_AFTER_JOURNAL,
            DELETE_AFTER_COUNT,
            DELETE_AFTER_INDEX,
            RECOVERY_AFTER_APPLY,
        ]
    }
}
