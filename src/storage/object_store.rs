//! Record file store
//!
//! Maps an identifier to its sharded path and performs whole-file
//! create/read/overwrite/delete. Encoding is delegated to a [`Codec`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::fsutil;
use super::paths;
use crate::entity::{Codec, JsonCodec};
use crate::error::{DbError, DbResult};
use crate::observability::Logger;

/// One-file-per-record store rooted at a directory
#[derive(Debug)]
pub struct ObjectStore<C = JsonCodec> {
    root: PathBuf,
    codec: C,
    sync_writes: bool,
}

impl<C: Codec> ObjectStore<C> {
    /// Create a store over `root`. Nothing is touched on disk.
    pub fn new(root: impl Into<PathBuf>, codec: C, sync_writes: bool) -> Self {
        Self {
            root: root.into(),
            codec,
            sync_writes,
        }
    }

    /// Store root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the record file for `id`
    pub fn path_for(&self, id: u64) -> PathBuf {
        paths::record_path(&self.root, id)
    }

    /// True if a record file exists for `id`
    pub fn exists(&self, id: u64) -> bool {
        self.path_for(id).is_file()
    }

    /// Write raw record bytes, creating shard directories as needed
    pub fn write(&self, id: u64, bytes: &[u8]) -> DbResult<()> {
        let dir = paths::shard_dir(&self.root, id);
        fsutil::ensure_dir(&dir).map_err(|e| {
            DbError::io(format!("failed to create shard directory {}", dir.display()), e)
        })?;
        let path = self.path_for(id);
        fsutil::write_file(&path, bytes, self.sync_writes)
            .map_err(|e| DbError::io(format!("failed to write record {}", path.display()), e))
    }

    /// Read raw record bytes
    pub fn read(&self, id: u64) -> DbResult<Vec<u8>> {
        let path = self.path_for(id);
        fs::read(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                DbError::NotFound(id)
            } else {
                DbError::io(format!("failed to read record {}", path.display()), e)
            }
        })
    }

    /// Remove a record file
    pub fn delete(&self, id: u64) -> DbResult<()> {
        let path = self.path_for(id);
        fs::remove_file(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                DbError::NotFound(id)
            } else {
                DbError::io(format!("failed to delete record {}", path.display()), e)
            }
        })
    }

    /// Encode `record` into bytes
    pub fn encode<T: Serialize>(&self, id: u64, record: &T) -> DbResult<Vec<u8>> {
        self.codec
            .encode(record)
            .map_err(|message| DbError::Encode { id, message })
    }

    /// Decode bytes read from the file of `id`
    pub fn decode<T: DeserializeOwned>(&self, id: u64, bytes: &[u8]) -> DbResult<T> {
        self.codec.decode(bytes).map_err(|message| DbError::Decode {
            path: self.path_for(id),
            message,
        })
    }

    /// Read and decode a record
    pub fn get<T: DeserializeOwned>(&self, id: u64) -> DbResult<T> {
        let bytes = self.read(id)?;
        self.decode(id, &bytes)
    }

    /// Identifiers of every record file under the root, ascending.
    ///
    /// Only digit-named shard directories are descended into and only
    /// `<id>.dat` files sitting at their canonical path are reported.
    /// Bookkeeping files (`_stat.dat`, `_<field>.idx`, `_journal.dat`)
    /// never qualify.
    pub fn scan_ids(&self) -> DbResult<Vec<u64>> {
        let mut ids = Vec::new();
        if self.root.is_dir() {
            self.scan_dir(&self.root, &mut ids)?;
        }
        ids.sort_unstable();
        Ok(ids)
    }

    fn scan_dir(&self, dir: &Path, ids: &mut Vec<u64>) -> DbResult<()> {
        let entries = fs::read_dir(dir)
            .map_err(|e| DbError::io(format!("failed to list {}", dir.display()), e))?;
        for entry in entries {
            let entry =
                entry.map_err(|e| DbError::io(format!("failed to list {}", dir.display()), e))?;
            let file_type = entry
                .file_type()
                .map_err(|e| DbError::io("failed to stat directory entry", e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let path = entry.path();

            if file_type.is_dir() {
                if paths::is_shard_dir_name(name) {
                    self.scan_dir(&path, ids)?;
                }
            } else if let Some(id) = paths::parse_record_name(name) {
                if path == self.path_for(id) {
                    ids.push(id);
                } else {
                    let shown = path.display().to_string();
                    Logger::warn("RECORD_MISPLACED", &[("path", shown.as_str())]);
                }
            }
        }
        Ok(())
    }

    /// Remove the whole store directory
    pub fn drop_all(&self) -> DbResult<()> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DbError::io(
                format!("failed to remove {}", self.root.display()),
                e,
            )),
        }
    }
}
