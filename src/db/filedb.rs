//! File-backed record store with secondary indexes

use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::options::StoreOptions;
use crate::crash_point::{maybe_crash, points};
use crate::entity::{Codec, Entity, JsonCodec};
use crate::error::{DbError, DbResult};
use crate::index::{IndexConfig, IndexEngine, IndexEntry};
use crate::journal::{Intent, Journal, JournalOp};
use crate::ledger::Ledger;
use crate::observability::{log_event_with_fields, Event};
use crate::storage::{fsutil, ObjectStore};

/// Embedded record store.
///
/// All methods take `&self`; the handle can be shared across threads
/// behind an `Arc`. Mutations are serialized by one lock held across all
/// of their steps, so a uniqueness check and the write it guards cannot
/// interleave with another mutation. Reads share the index lock and never
/// observe a half-applied mutation.
///
/// Only one `FileDb` may be open on a root at a time.
pub struct FileDb<T, C = JsonCodec> {
    store: ObjectStore<C>,
    journal: Journal,
    ledger: Mutex<Ledger>,
    index: RwLock<IndexEngine>,
    writes: Mutex<()>,
    failed: Mutex<Option<String>>,
    options: StoreOptions,
    _record: PhantomData<fn() -> T>,
}

impl<T: Entity> FileDb<T, JsonCodec> {
    /// Open (creating if needed) a JSON store at `root` with fsync enabled
    pub fn open(root: impl Into<PathBuf>, indexes: Vec<IndexConfig>) -> DbResult<Self> {
        Self::open_with(root, indexes, StoreOptions::default(), JsonCodec)
    }
}

impl<T: Entity, C: Codec> FileDb<T, C> {
    /// Build a handle without touching the filesystem; call `init` next
    pub fn new(
        root: impl Into<PathBuf>,
        indexes: Vec<IndexConfig>,
        options: StoreOptions,
        codec: C,
    ) -> DbResult<Self> {
        let root = root.into();
        let index = IndexEngine::new(&root, indexes, options.sync_writes)?;
        Ok(Self {
            journal: Journal::new(&root, options.sync_writes),
            ledger: Mutex::new(Ledger::new(&root, options.sync_writes)),
            index: RwLock::new(index),
            store: ObjectStore::new(root, codec, options.sync_writes),
            writes: Mutex::new(()),
            failed: Mutex::new(None),
            options,
            _record: PhantomData,
        })
    }

    /// `new` followed by `init`
    pub fn open_with(
        root: impl Into<PathBuf>,
        indexes: Vec<IndexConfig>,
        options: StoreOptions,
        codec: C,
    ) -> DbResult<Self> {
        let db = Self::new(root, indexes, options, codec)?;
        db.init()?;
        Ok(db)
    }

    /// Bring the handle in line with what is on disk.
    ///
    /// Creates the root if needed, rolls forward an interrupted mutation,
    /// then loads the ledger and the indexes. A missing stat file is
    /// derived from the indexes (or from a record scan when no index is
    /// configured); missing or malformed index files are rebuilt.
    pub fn init(&self) -> DbResult<()> {
        let root = self.store.root().to_path_buf();
        let root_str = root.display().to_string();
        log_event_with_fields(Event::OpenBegin, &[("root", root_str.as_str())]);

        let _writes = self.lock_writes();
        fsutil::ensure_dir(&root)
            .map_err(|e| DbError::io(format!("failed to create {}", root.display()), e))?;

        let mut ledger = self.lock_ledger();
        let mut index = self.write_index();
        *index = IndexEngine::new(&root, index.configs().to_vec(), self.options.sync_writes)?;
        *ledger = Ledger::new(&root, self.options.sync_writes);

        let recovered = self.recover_journal(&mut index)?;

        let store = &self.store;
        let engine = &mut *index;
        ledger.init(|| {
            if !engine.is_initialized() {
                engine.init::<T, _>(store)?;
            }
            observed_extent(engine, store)
        })?;

        if !index.is_initialized() {
            index.init::<T, _>(&self.store)?;
        }

        if recovered {
            let (max_id, count) = observed_extent(&index, &self.store)?;
            ledger.reconcile(max_id, count)?;
            self.journal.commit()?;
            log_event_with_fields(
                Event::JournalRecoveryComplete,
                &[("count", count.to_string().as_str())],
            );
        }

        *self
            .failed
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;

        log_event_with_fields(
            Event::OpenComplete,
            &[
                ("root", root_str.as_str()),
                ("count", ledger.count().to_string().as_str()),
                ("next_id", ledger.peek_next_id().to_string().as_str()),
            ],
        );
        Ok(())
    }

    /// Roll an interrupted mutation forward onto the record files and
    /// rebuild every index from them. The ledger is reconciled by the
    /// caller once it is loaded.
    fn recover_journal(&self, index: &mut IndexEngine) -> DbResult<bool> {
        let Some(intent) = self.journal.pending()? else {
            return Ok(false);
        };
        let id = intent.id.to_string();
        log_event_with_fields(
            Event::JournalRecoveryBegin,
            &[("op", intent.op.as_str()), ("id", id.as_str())],
        );

        match intent.op {
            JournalOp::Insert | JournalOp::Update => {
                self.store.write(intent.id, &intent.payload)?;
            }
            JournalOp::Delete => match self.store.delete(intent.id) {
                Ok(()) | Err(DbError::NotFound(_)) => {}
                Err(e) => return Err(e),
            },
        }
        maybe_crash(points::RECOVERY_AFTER_APPLY);

        index.rebuild_all::<T, _>(&self.store)?;
        Ok(true)
    }

    /// Insert a new record.
    ///
    /// Assigns the next identifier (written back into `record`) and
    /// returns it. The identifier is consumed even when the insert is
    /// rejected by a unique index.
    pub fn insert(&self, record: &mut T) -> DbResult<u64> {
        let _writes = self.lock_writes();
        self.ensure_writable()?;

        let mut ledger = self.lock_ledger();
        let id = ledger.next_id(false)?;
        record.set_id(id);
        let record = &*record;

        let mut index = self.write_index();
        if let Err(e) = index.validate_insert(record) {
            return Err(rejected(JournalOp::Insert, id, e));
        }
        let payload = self.store.encode(id, record)?;
        self.journal.begin(&Intent::insert(id, payload.clone()))?;
        maybe_crash(points::INSERT_AFTER_JOURNAL);

        let result = self.apply_insert(&mut index, &mut ledger, record, &payload);
        self.settle(JournalOp::Insert, id, result)?;
        Ok(id)
    }

    /// Replace an existing record (matched by its identifier)
    pub fn update(&self, record: &T) -> DbResult<()> {
        let _writes = self.lock_writes();
        self.ensure_writable()?;

        let id = record.id();
        let previous = match self.load(id) {
            Ok(previous) => previous,
            Err(e) => return Err(rejected(JournalOp::Update, id, e)),
        };

        let mut index = self.write_index();
        if let Err(e) = index.validate_update(record, &previous) {
            return Err(rejected(JournalOp::Update, id, e));
        }
        let payload = self.store.encode(id, record)?;
        self.journal.begin(&Intent::update(id, payload.clone()))?;
        maybe_crash(points::UPDATE_AFTER_JOURNAL);

        let result = self.apply_update(&mut index, record, &previous, &payload);
        self.settle(JournalOp::Update, id, result)
    }

    /// Remove a record
    pub fn delete(&self, id: u64) -> DbResult<()> {
        let _writes = self.lock_writes();
        self.ensure_writable()?;

        let previous = match self.load(id) {
            Ok(previous) => previous,
            Err(e) => return Err(rejected(JournalOp::Delete, id, e)),
        };

        let mut ledger = self.lock_ledger();
        let mut index = self.write_index();
        self.journal.begin(&Intent::delete(id))?;
        maybe_crash(points::DELETE_AFTER_JOURNAL);

        let result = self.apply_delete(&mut index, &mut ledger, &previous);
        self.settle(JournalOp::Delete, id, result)
    }

    /// Load a record by identifier
    pub fn find(&self, id: u64) -> DbResult<T> {
        let _index = self.read_index();
        self.load(id)
    }

    /// First record whose `field` equals `value`
    pub fn find_by(&self, field: &str, value: &str) -> DbResult<Option<T>> {
        let index = self.read_index();
        index.find_id(field, value).map(|id| self.load(id)).transpose()
    }

    /// All records whose `field` equals `value`, in bucket order.
    ///
    /// Fails if the index names a record that cannot be loaded. Fields
    /// without an index yield no records.
    pub fn list(&self, field: &str, value: &str) -> DbResult<Vec<T>> {
        let index = self.read_index();
        index
            .search_ids(field, value)
            .into_iter()
            .map(|id| self.load(id))
            .collect()
    }

    /// Index entries for one value, including cached include fields
    pub fn list_index_entries(&self, field: &str, value: &str) -> Vec<IndexEntry> {
        self.read_index().search_entries(field, value)
    }

    /// Every index entry of a field
    pub fn list_all_index_entries(&self, field: &str) -> Vec<IndexEntry> {
        self.read_index().search_all_entries(field)
    }

    /// Identifiers of all live records, per the first configured index
    pub fn all_ids(&self) -> Vec<u64> {
        self.read_index().all_ids()
    }

    /// Live record count
    pub fn count(&self) -> u64 {
        self.lock_ledger().count()
    }

    /// Identifier the next insert will receive
    pub fn peek_next_id(&self) -> u64 {
        self.lock_ledger().peek_next_id()
    }

    /// Force a rebuild of one index from the record files
    pub fn rebuild_index(&self, field: &str) -> DbResult<usize> {
        let _writes = self.lock_writes();
        self.write_index().rebuild::<T, _>(field, &self.store)
    }

    /// Store root directory
    pub fn root(&self) -> &Path {
        self.store.root()
    }

    /// Configured indexes
    pub fn index_configs(&self) -> Vec<IndexConfig> {
        self.read_index().configs().to_vec()
    }

    /// Delete the whole store directory. Intended for test harnesses.
    pub fn drop_store(&self) -> DbResult<()> {
        let _writes = self.lock_writes();
        self.store.drop_all()
    }

    fn apply_insert(
        &self,
        index: &mut IndexEngine,
        ledger: &mut Ledger,
        record: &T,
        payload: &[u8],
    ) -> DbResult<()> {
        index.apply_insert(record)?;
        maybe_crash(points::INSERT_AFTER_INDEX);
        ledger.add_count(1)?;
        maybe_crash(points::INSERT_AFTER_COUNT);
        self.store.write(record.id(), payload)?;
        self.journal.commit()
    }

    fn apply_update(
        &self,
        index: &mut IndexEngine,
        record: &T,
        previous: &T,
        payload: &[u8],
    ) -> DbResult<()> {
        index.apply_update(record, previous)?;
        maybe_crash(points::UPDATE_AFTER_INDEX);
        self.store.write(record.id(), payload)?;
        self.journal.commit()
    }

    fn apply_delete(&self, index: &mut IndexEngine, ledger: &mut Ledger, previous: &T) -> DbResult<()> {
        ledger.add_count(-1)?;
        maybe_crash(points::DELETE_AFTER_COUNT);
        index.delete(previous)?;
        maybe_crash(points::DELETE_AFTER_INDEX);
        self.store.delete(previous.id())?;
        self.journal.commit()
    }

    fn load(&self, id: u64) -> DbResult<T> {
        self.store.get(id)
    }

    fn ensure_writable(&self) -> DbResult<()> {
        match &*self.failed.lock().unwrap_or_else(PoisonError::into_inner) {
            Some(reason) => Err(DbError::RecoveryRequired(reason.clone())),
            None => Ok(()),
        }
    }

    /// Record the outcome of a journaled mutation. A failure after the
    /// journal was written leaves the files diverged until the journal is
    /// rolled forward, so the handle stops accepting writes.
    fn settle(&self, op: JournalOp, id: u64, result: DbResult<()>) -> DbResult<()> {
        let id_str = id.to_string();
        match result {
            Ok(()) => {
                let event = match op {
                    JournalOp::Insert => Event::RecordInserted,
                    JournalOp::Update => Event::RecordUpdated,
                    JournalOp::Delete => Event::RecordDeleted,
                };
                log_event_with_fields(event, &[("id", id_str.as_str())]);
                Ok(())
            }
            Err(e) => {
                let reason = format!("{} of record {} failed: {}", op, id, e);
                log_event_with_fields(
                    Event::MutationFailed,
                    &[("op", op.as_str()), ("id", id_str.as_str()), ("error", reason.as_str())],
                );
                *self.failed.lock().unwrap_or_else(PoisonError::into_inner) = Some(reason);
                Err(e)
            }
        }
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_index(&self) -> RwLockReadGuard<'_, IndexEngine> {
        self.index.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_index(&self) -> RwLockWriteGuard<'_, IndexEngine> {
        self.index.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Highest id and population, from the first index or, with no index
/// configured, from the record files themselves
fn observed_extent<C: Codec>(index: &IndexEngine, store: &ObjectStore<C>) -> DbResult<(u64, u64)> {
    if !index.configs().is_empty() {
        return Ok(index.max_id_and_count());
    }
    let ids = store.scan_ids()?;
    Ok((ids.last().copied().unwrap_or(0), ids.len() as u64))
}

fn rejected(op: JournalOp, id: u64, err: DbError) -> DbError {
    let id = id.to_string();
    let code = err.code();
    log_event_with_fields(
        Event::MutationRejected,
        &[("op", op.as_str()), ("id", id.as_str()), ("code", code)],
    );
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Document;
    use serde_json::json;
    use std::fs;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn doc(value: serde_json::Value) -> Document {
        Document::from_value(value).unwrap()
    }

    fn open(root: &Path) -> FileDb<Document> {
        FileDb::open_with(
            root,
            vec![
                IndexConfig::unique("Name"),
                IndexConfig::new("Age").with_include(["Name"]),
            ],
            StoreOptions::unsynced(),
            JsonCodec,
        )
        .unwrap()
    }

    #[test]
    fn test_open_creates_layout() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("db");
        let db = open(&root);
        assert!(root.join("_stat.dat").is_file());
        assert!(root.join("_Name.idx").is_file());
        assert!(root.join("_Age.idx").is_file());
        assert_eq!(db.count(), 0);
        assert_eq!(db.peek_next_id(), 1);
    }

    #[test]
    fn test_insert_assigns_id() {
        let temp = TempDir::new().unwrap();
        let db = open(temp.path());
        let mut alice = doc(json!({"Name": "Alice", "Age": 20}));
        let id = db.insert(&mut alice).unwrap();
        assert_eq!(id, 1);
        assert_eq!(alice.id, 1);
        assert_eq!(db.find(1).unwrap(), alice);
        assert!(!db.journal.path().exists());
    }

    #[test]
    fn test_rejected_insert_spends_id_only() {
        let temp = TempDir::new().unwrap();
        let db = open(temp.path());
        db.insert(&mut doc(json!({"Name": "Alice", "Age": 20}))).unwrap();

        let err = db
            .insert(&mut doc(json!({"Name": "Alice", "Age": 30})))
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(db.count(), 1);
        assert_eq!(db.peek_next_id(), 3);
        assert!(!db.store.exists(2));
        assert!(db.list("Age", "30").unwrap().is_empty());

        // Rejections do not block later writes
        db.insert(&mut doc(json!({"Name": "Bob", "Age": 30}))).unwrap();
    }

    #[test]
    fn test_update_and_delete_missing() {
        let temp = TempDir::new().unwrap();
        let db = open(temp.path());
        let mut ghost = doc(json!({"Name": "Ghost"}));
        ghost.id = 5;
        assert!(matches!(db.update(&ghost), Err(DbError::NotFound(5))));
        assert!(matches!(db.delete(5), Err(DbError::NotFound(5))));
    }

    #[test]
    fn test_find_by() {
        let temp = TempDir::new().unwrap();
        let db = open(temp.path());
        db.insert(&mut doc(json!({"Name": "Alice", "Age": 20}))).unwrap();
        let found = db.find_by("Name", "Alice").unwrap().unwrap();
        assert_eq!(found.value("Age"), "20");
        assert!(db.find_by("Name", "Bob").unwrap().is_none());
    }

    #[test]
    fn test_list_surfaces_missing_record() {
        let temp = TempDir::new().unwrap();
        let db = open(temp.path());
        db.insert(&mut doc(json!({"Name": "Alice", "Age": 20}))).unwrap();
        fs::remove_file(temp.path().join("1.dat")).unwrap();
        assert!(matches!(db.list("Age", "20"), Err(DbError::NotFound(1))));
    }

    #[test]
    fn test_failed_step_blocks_writes_until_reopen() {
        let temp = TempDir::new().unwrap();
        let db = open(temp.path());
        db.insert(&mut doc(json!({"Name": "Alice", "Age": 20}))).unwrap();

        // A directory where the index mirror should be makes the rewrite fail
        let age_idx = temp.path().join("_Age.idx");
        fs::remove_file(&age_idx).unwrap();
        fs::create_dir(&age_idx).unwrap();

        let err = db.delete(1).unwrap_err();
        assert!(matches!(err, DbError::Io { .. }));
        assert!(db.journal.path().exists());
        let err = db
            .insert(&mut doc(json!({"Name": "Bob", "Age": 30})))
            .unwrap_err();
        assert!(matches!(err, DbError::RecoveryRequired(_)));

        fs::remove_dir(&age_idx).unwrap();
        db.init().unwrap();
        assert_eq!(db.count(), 0);
        assert!(db.all_ids().is_empty());
        assert!(!temp.path().join("1.dat").exists());
        db.insert(&mut doc(json!({"Name": "Bob", "Age": 30}))).unwrap();
    }

    #[test]
    fn test_concurrent_unique_inserts_single_winner() {
        let temp = TempDir::new().unwrap();
        let db = Arc::new(open(temp.path()));

        let handles: Vec<_> = (0..8)
            .map(|age| {
                let db = Arc::clone(&db);
                thread::spawn(move || db.insert(&mut doc(json!({"Name": "Same", "Age": age}))))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(db.count(), 1);
        assert_eq!(db.list_all_index_entries("Name").len(), 1);
        assert_eq!(db.peek_next_id(), 9);
    }

    #[test]
    fn test_drop_store() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("db");
        let db = open(&root);
        db.insert(&mut doc(json!({"Name": "Alice", "Age": 20}))).unwrap();
        db.drop_store().unwrap();
        assert!(!root.exists());
    }
}
