//! Store options

/// Tunables for an open store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// fsync record, index, stat and journal writes before returning
    pub sync_writes: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { sync_writes: true }
    }
}

impl StoreOptions {
    /// Options with fsync disabled (tests, scratch stores)
    pub fn unsynced() -> Self {
        Self { sync_writes: false }
    }
}
