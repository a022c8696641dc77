//! Store setup and post-crash validation

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use filedb::storage::ObjectStore;
use filedb::{Document, Entity, FileDb, JsonCodec, StoreConfig};
use tempfile::TempDir;

/// A temporary store plus the config file pointing at it
pub struct CrashStore {
    pub temp: TempDir,
    pub config_path: PathBuf,
    pub config: StoreConfig,
}

impl CrashStore {
    /// Store with a unique `Name` index and an `Age` index caching `Name`
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let data_dir = temp.path().join("data");
        let content = serde_json::json!({
            "data_dir": data_dir,
            "indexes": [
                { "field": "Name", "unique": true },
                { "field": "Age", "include": ["Name"] }
            ],
            "sync_writes": true
        });
        let config_path = temp.path().join("filedb.json");
        fs::write(&config_path, content.to_string()).unwrap();
        let config = StoreConfig::load(&config_path).unwrap();
        Self {
            temp,
            config_path,
            config,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Open in-process, running any pending recovery
    pub fn open(&self) -> FileDb<Document> {
        self.config.open().unwrap()
    }

    pub fn journal_exists(&self) -> bool {
        self.data_dir().join("_journal.dat").exists()
    }
}

/// Check every cross-file invariant of a reopened store.
///
/// - no journal remains
/// - every index holds exactly the ids of the record files
/// - every entry's value matches the record it points to
/// - the ledger count equals the number of record files
/// - the next id lies above every existing id
pub fn validate_post_crash_state(store: &CrashStore) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    let db = store.open();

    if store.journal_exists() {
        errors.push("journal still present after open".to_string());
    }

    let files = ObjectStore::new(store.data_dir(), JsonCodec, false);
    let ids: BTreeSet<u64> = match files.scan_ids() {
        Ok(ids) => ids.into_iter().collect(),
        Err(e) => {
            errors.push(format!("scan failed: {}", e));
            return Err(errors);
        }
    };

    if db.count() != ids.len() as u64 {
        errors.push(format!("count {} but {} record files", db.count(), ids.len()));
    }
    if let Some(max) = ids.last() {
        if db.peek_next_id() <= *max {
            errors.push(format!("next id {} not above max id {}", db.peek_next_id(), max));
        }
    }

    for config in db.index_configs() {
        let entries = db.list_all_index_entries(&config.field);
        let indexed: BTreeSet<u64> = entries.iter().map(|e| e.id).collect();
        if indexed != ids || entries.len() != ids.len() {
            errors.push(format!(
                "index {} holds {:?}, record files {:?}",
                config.field, indexed, ids
            ));
        }
        for entry in &entries {
            match db.find(entry.id) {
                Ok(doc) if doc.value(&config.field) == entry.value => {}
                Ok(doc) => errors.push(format!(
                    "index {} says '{}' for {}, record has '{}'",
                    config.field,
                    entry.value,
                    entry.id,
                    doc.value(&config.field)
                )),
                Err(e) => errors.push(format!("entry {} unreadable: {}", entry.id, e)),
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Panic with every violation if the store is inconsistent
pub fn assert_consistent(store: &CrashStore) {
    if let Err(errors) = validate_post_crash_state(store) {
        panic!("inconsistent store:\n{}", errors.join("\n"));
    }
}
