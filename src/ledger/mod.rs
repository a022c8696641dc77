//! Identifier and count ledger
//!
//! Persists the next identifier to hand out and the live record count as
//! two decimal lines in `<root>/_stat.dat`:
//!
//! ```text
//! 4
//! 3
//! ```
//!
//! # Invariants
//!
//! - Every identifier ever returned by `next_id(false)` is `< next_id`
//!   in every later state, across restarts.
//! - After `next_id(false)`, `add_count` or `reconcile` return `Ok`, the
//!   stat file holds the new pair.
//! - The stat file is replaced by rename, so a crash leaves either the
//!   previous pair or the new one on disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{DbError, DbResult};
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::storage::fsutil;

/// Name of the stat file under the store root
pub const STAT_FILE: &str = "_stat.dat";

/// Durable next-id / count pair
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    next_id: u64,
    count: u64,
    sync_writes: bool,
}

impl Ledger {
    /// Ledger for the store at `root`; call `init` before use
    pub fn new(root: &Path, sync_writes: bool) -> Self {
        Self {
            path: root.join(STAT_FILE),
            next_id: 1,
            count: 0,
            sync_writes,
        }
    }

    /// Path of the stat file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stat file, or create it when absent.
    ///
    /// When the file is missing or empty, `bootstrap` is asked for the highest
    /// identifier and the record count observed in existing data; the
    /// ledger starts at `max_id + 1`. `bootstrap` is not called otherwise.
    pub fn init<F>(&mut self, bootstrap: F) -> DbResult<()>
    where
        F: FnOnce() -> DbResult<(u64, u64)>,
    {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => {
                let shown = self.path.display().to_string();
                Logger::warn("STAT_FILE_EMPTY", &[("path", shown.as_str())]);
                self.bootstrap(bootstrap)
            }
            Ok(content) => {
                let (next_id, count) = parse_stat(&content).map_err(|reason| {
                    DbError::InvalidStatFile {
                        path: self.path.clone(),
                        reason,
                    }
                })?;
                self.next_id = next_id;
                self.count = count;
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => self.bootstrap(bootstrap),
            Err(e) => Err(DbError::io(
                format!("failed to read {}", self.path.display()),
                e,
            )),
        }
    }

    fn bootstrap<F>(&mut self, bootstrap: F) -> DbResult<()>
    where
        F: FnOnce() -> DbResult<(u64, u64)>,
    {
        let (max_id, count) = bootstrap()?;
        self.next_id = self.after(max_id)?;
        self.count = count;
        log_event_with_fields(
            Event::LedgerBootstrap,
            &[
                ("next_id", self.next_id.to_string().as_str()),
                ("count", self.count.to_string().as_str()),
            ],
        );
        self.save()
    }

    /// Identifier following `max_id`; the id space is not allowed to wrap
    fn after(&self, max_id: u64) -> DbResult<u64> {
        max_id.checked_add(1).ok_or_else(|| DbError::InvalidStatFile {
            path: self.path.clone(),
            reason: format!("identifier space exhausted at {}", max_id),
        })
    }

    /// Next identifier.
    ///
    /// With `peek` the counter is left untouched. Otherwise the returned
    /// identifier is consumed and the incremented counter is persisted
    /// before returning; on a persistence failure nothing is consumed.
    pub fn next_id(&mut self, peek: bool) -> DbResult<u64> {
        let id = self.next_id;
        if peek {
            return Ok(id);
        }
        self.next_id = self.after(id)?;
        if let Err(e) = self.save() {
            self.next_id = id;
            return Err(e);
        }
        Ok(id)
    }

    /// Next identifier without consuming it
    pub fn peek_next_id(&self) -> u64 {
        self.next_id
    }

    /// Live record count
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Apply a signed delta to the count and persist it
    pub fn add_count(&mut self, delta: i64) -> DbResult<()> {
        let previous = self.count;
        self.count = if delta >= 0 {
            self.count.saturating_add(delta as u64)
        } else {
            self.count.saturating_sub(delta.unsigned_abs())
        };
        if let Err(e) = self.save() {
            self.count = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Align the counters with data observed after recovery.
    ///
    /// `next_id` only ever moves forward.
    pub fn reconcile(&mut self, max_id: u64, count: u64) -> DbResult<()> {
        self.next_id = self.next_id.max(self.after(max_id)?);
        self.count = count;
        log_event_with_fields(
            Event::LedgerReconciled,
            &[
                ("next_id", self.next_id.to_string().as_str()),
                ("count", self.count.to_string().as_str()),
            ],
        );
        self.save()
    }

    fn save(&self) -> DbResult<()> {
        let content = format!("{}\n{}\n", self.next_id, self.count);
        fsutil::write_atomic(&self.path, content.as_bytes(), self.sync_writes)
            .map_err(|e| DbError::io(format!("failed to write {}", self.path.display()), e))
    }
}

fn parse_stat(content: &str) -> Result<(u64, u64), String> {
    let mut lines = content.lines().map(str::trim).filter(|l| !l.is_empty());
    let next_id = lines
        .next()
        .ok_or_else(|| "missing next id".to_string())?
        .parse::<u64>()
        .map_err(|e| format!("bad next id: {}", e))?;
    let count = lines
        .next()
        .ok_or_else(|| "missing count".to_string())?
        .parse::<u64>()
        .map_err(|e| format!("bad count: {}", e))?;
    if next_id == 0 {
        return Err("next id must be at least 1".to_string());
    }
    Ok((next_id, count))
}
