//! Index engine
//!
//! Keeps one [`Buckets`] map per configured field and mirrors each to
//! `<root>/_<field>.idx`.
//!
//! # Invariants
//!
//! - Every live record has exactly one entry per configured field, keyed
//!   by its current value for that field.
//! - A unique field's bucket holds at most one entry.
//! - Validation runs across all fields before anything is mutated, so a
//!   rejected insert/update leaves memory and files untouched.
//!
//! # Ordering
//!
//! Buckets keep insertion order. An update that keeps the value keeps the
//! entry's position; an update that moves the value appends to the new
//! bucket. Whole-field listings walk buckets in ascending value order.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::config::{validate_configs, IndexConfig};
use super::entry::{include_values, IndexEntry};
use super::file::{self, Buckets};
use crate::entity::{Codec, Entity};
use crate::error::{DbError, DbResult};
use crate::observability::{log_event_with_fields, Event};
use crate::storage::ObjectStore;

/// Source of authoritative records for rebuilds
pub trait RecordScan<T> {
    /// Every live record, in ascending id order
    fn scan_records(&self) -> DbResult<Vec<T>>;
}

impl<T: Entity, C: Codec> RecordScan<T> for ObjectStore<C> {
    fn scan_records(&self) -> DbResult<Vec<T>> {
        self.scan_ids()?
            .into_iter()
            .map(|id| self.get(id))
            .collect()
    }
}

/// Equality indexes over configured fields
#[derive(Debug)]
pub struct IndexEngine {
    root: PathBuf,
    configs: Vec<IndexConfig>,
    indexes: HashMap<String, Buckets>,
    sync_writes: bool,
    initialized: bool,
}

impl IndexEngine {
    /// Create an engine; nothing is read until `init`
    pub fn new(root: &Path, configs: Vec<IndexConfig>, sync_writes: bool) -> DbResult<Self> {
        validate_configs(&configs)?;
        let indexes = configs
            .iter()
            .map(|c| (c.field.clone(), Buckets::new()))
            .collect();
        Ok(Self {
            root: root.to_path_buf(),
            configs,
            indexes,
            sync_writes,
            initialized: false,
        })
    }

    /// Configured indexes, in declaration order
    pub fn configs(&self) -> &[IndexConfig] {
        &self.configs
    }

    /// True once `init` has completed
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Path of the mirror file for `field`
    pub fn index_path(&self, field: &str) -> PathBuf {
        index_path(&self.root, field)
    }

    fn config(&self, field: &str) -> Option<&IndexConfig> {
        self.configs.iter().find(|c| c.field == field)
    }

    /// Load every index from disk, rebuilding any that is missing or
    /// structurally invalid. Records are scanned at most once.
    pub fn init<T: Entity, S: RecordScan<T>>(&mut self, scan: &S) -> DbResult<()> {
        let mut scanned: Option<Vec<T>> = None;

        for config in self.configs.clone() {
            let path = self.index_path(&config.field);
            if path.is_file() {
                match file::load(&path, &config) {
                    Ok(buckets) => {
                        let entries: usize = buckets.values().map(Vec::len).sum();
                        self.indexes.insert(config.field.clone(), buckets);
                        log_event_with_fields(
                            Event::IndexLoaded,
                            &[
                                ("field", config.field.as_str()),
                                ("entries", entries.to_string().as_str()),
                            ],
                        );
                        continue;
                    }
                    Err(e @ DbError::InvalidIndexFile { .. }) => {
                        let reason = e.to_string();
                        log_event_with_fields(
                            Event::IndexInvalid,
                            &[("field", config.field.as_str()), ("reason", reason.as_str())],
                        );
                    }
                    Err(e) => return Err(e),
                }
            }

            if scanned.is_none() {
                scanned = Some(scan.scan_records()?);
            }
            let records = scanned.as_deref().unwrap_or(&[]);
            self.rebuild_from(&config, records)?;
        }

        self.initialized = true;
        Ok(())
    }

    /// Rebuild one field's index by scanning record files, then rewrite
    /// its mirror. Returns the number of entries.
    pub fn rebuild<T: Entity, S: RecordScan<T>>(&mut self, field: &str, scan: &S) -> DbResult<usize> {
        let config = self
            .config(field)
            .cloned()
            .ok_or_else(|| DbError::InvalidConfig(format!("no index on field '{}'", field)))?;
        let records = scan.scan_records()?;
        self.rebuild_from(&config, &records)
    }

    /// Rebuild every index from one scan
    pub fn rebuild_all<T: Entity, S: RecordScan<T>>(&mut self, scan: &S) -> DbResult<()> {
        let records = scan.scan_records()?;
        for config in self.configs.clone() {
            self.rebuild_from(&config, &records)?;
        }
        self.initialized = true;
        Ok(())
    }

    fn rebuild_from<T: Entity>(&mut self, config: &IndexConfig, records: &[T]) -> DbResult<usize> {
        let mut buckets = Buckets::new();
        for record in records {
            let entry = IndexEntry::for_record(record, config);
            buckets.entry(entry.value.clone()).or_default().push(entry);
        }
        file::save(&self.index_path(&config.field), &buckets, config, self.sync_writes)?;
        self.indexes.insert(config.field.clone(), buckets);

        log_event_with_fields(
            Event::IndexRebuilt,
            &[
                ("field", config.field.as_str()),
                ("entries", records.len().to_string().as_str()),
            ],
        );
        Ok(records.len())
    }

    fn bucket_taken(&self, field: &str, value: &str) -> bool {
        self.indexes
            .get(field)
            .and_then(|b| b.get(value))
            .is_some_and(|entries| !entries.is_empty())
    }

    /// Check unique constraints for a new record
    pub fn validate_insert<T: Entity>(&self, record: &T) -> DbResult<()> {
        for config in self.configs.iter().filter(|c| c.unique) {
            if self.bucket_taken(&config.field, &record.value(&config.field)) {
                return Err(DbError::unique_violation(&config.field));
            }
        }
        Ok(())
    }

    /// Add a record to every index, appending one line per mirror file.
    /// Callers must have validated first.
    pub fn apply_insert<T: Entity>(&mut self, record: &T) -> DbResult<()> {
        for config in &self.configs {
            let entry = IndexEntry::for_record(record, config);
            file::append(
                &index_path(&self.root, &config.field),
                &entry,
                config,
                self.sync_writes,
            )?;
            self.indexes
                .entry(config.field.clone())
                .or_default()
                .entry(entry.value.clone())
                .or_default()
                .push(entry);
        }
        Ok(())
    }

    /// Validate then add a record to every index
    pub fn insert<T: Entity>(&mut self, record: &T) -> DbResult<()> {
        self.validate_insert(record)?;
        self.apply_insert(record)
    }

    /// Check unique constraints for fields whose value changes
    pub fn validate_update<T: Entity>(&self, record: &T, previous: &T) -> DbResult<()> {
        for config in self.configs.iter().filter(|c| c.unique) {
            let value = record.value(&config.field);
            if value == previous.value(&config.field) {
                continue;
            }
            if self.bucket_taken(&config.field, &value) {
                return Err(DbError::unique_violation(&config.field));
            }
        }
        Ok(())
    }

    /// Move or refresh a record's entries. Callers must have validated.
    pub fn apply_update<T: Entity>(&mut self, record: &T, previous: &T) -> DbResult<()> {
        let id = previous.id();
        for config in &self.configs {
            let buckets = self.indexes.entry(config.field.clone()).or_default();
            let new_value = record.value(&config.field);
            let old_value = previous.value(&config.field);

            let changed = if new_value == old_value {
                refresh_includes(buckets, record, config, id)
            } else {
                remove_entry(buckets, &old_value, id);
                let entry = IndexEntry::for_record(record, config);
                buckets.entry(new_value).or_default().push(entry);
                true
            };

            if changed {
                file::save(
                    &index_path(&self.root, &config.field),
                    buckets,
                    config,
                    self.sync_writes,
                )?;
            }
        }
        Ok(())
    }

    /// Validate then update a record's entries
    pub fn update<T: Entity>(&mut self, record: &T, previous: &T) -> DbResult<()> {
        self.validate_update(record, previous)?;
        self.apply_update(record, previous)
    }

    /// Remove a record from every index and rewrite each mirror
    pub fn delete<T: Entity>(&mut self, previous: &T) -> DbResult<()> {
        let id = previous.id();
        for config in &self.configs {
            let buckets = self.indexes.entry(config.field.clone()).or_default();
            remove_entry(buckets, &previous.value(&config.field), id);
            file::save(
                &index_path(&self.root, &config.field),
                buckets,
                config,
                self.sync_writes,
            )?;
        }
        Ok(())
    }

    /// First identifier in the bucket, if any
    pub fn find_id(&self, field: &str, value: &str) -> Option<u64> {
        self.bucket(field, value)?.first().map(|e| e.id)
    }

    /// All identifiers in the bucket, in bucket order
    pub fn search_ids(&self, field: &str, value: &str) -> Vec<u64> {
        self.bucket(field, value)
            .map(|entries| entries.iter().map(|e| e.id).collect())
            .unwrap_or_default()
    }

    /// Entries of one bucket
    pub fn search_entries(&self, field: &str, value: &str) -> Vec<IndexEntry> {
        self.bucket(field, value).map(<[_]>::to_vec).unwrap_or_default()
    }

    /// Every entry of a field, buckets in ascending value order
    pub fn search_all_entries(&self, field: &str) -> Vec<IndexEntry> {
        self.indexes
            .get(field)
            .map(|b| b.values().flatten().cloned().collect())
            .unwrap_or_default()
    }

    /// Highest identifier and entry count of the first configured index
    pub fn max_id_and_count(&self) -> (u64, u64) {
        let Some(buckets) = self.first_index() else {
            return (0, 0);
        };
        buckets.values().flatten().fold((0, 0), |(max, count), e| {
            (max.max(e.id), count + 1)
        })
    }

    /// Identifiers present in the first configured index
    pub fn all_ids(&self) -> Vec<u64> {
        self.first_index()
            .map(|b| b.values().flatten().map(|e| e.id).collect())
            .unwrap_or_default()
    }

    fn first_index(&self) -> Option<&Buckets> {
        self.configs.first().and_then(|c| self.indexes.get(&c.field))
    }

    fn bucket(&self, field: &str, value: &str) -> Option<&[IndexEntry]> {
        self.indexes.get(field)?.get(value).map(Vec::as_slice)
    }
}

/// Mirror file path for `field` under `root`
pub fn index_path(root: &Path, field: &str) -> PathBuf {
    root.join(format!("_{}.idx", field))
}

fn remove_entry(buckets: &mut Buckets, value: &str, id: u64) {
    if let Some(entries) = buckets.get_mut(value) {
        entries.retain(|e| e.id != id);
        if entries.is_empty() {
            buckets.remove(value);
        }
    }
}

/// Update cached include columns in place. Returns whether anything
/// changed. A missing entry is re-added at the end of its bucket.
fn refresh_includes<T: Entity>(
    buckets: &mut Buckets,
    record: &T,
    config: &IndexConfig,
    id: u64,
) -> bool {
    let value = record.value(&config.field);
    let entries = buckets.entry(value).or_default();
    match entries.iter_mut().find(|e| e.id == id) {
        Some(entry) => {
            let fresh = include_values(record, &config.include);
            if entry.others == fresh {
                false
            } else {
                entry.others = fresh;
                true
            }
        }
        None => {
            entries.push(IndexEntry::for_record(record, config));
            true
        }
    }
}
