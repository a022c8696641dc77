//! Single-slot mutation journal
//!
//! A record mutation touches up to four files (stat, one or more index
//! mirrors, the record itself). Before the first of those writes the
//! coordinator stores its intent in `<root>/_journal.dat`; after the last
//! one it removes the journal. A journal found on open therefore means a
//! mutation was interrupted, and it carries enough to roll it forward.
//!
//! Layout:
//!
//! ```text
//! <op> <id> <crc32 hex> <payload len>\n
//! <payload bytes>
//! ```
//!
//! `payload` is the encoded record for `insert`/`update` and empty for
//! `delete`. A journal whose header or checksum does not verify was torn
//! while being written, before any other file changed, and is discarded.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{DbError, DbResult};
use crate::observability::{log_event_with_fields, Event};
use crate::storage::fsutil;

/// Name of the journal file under the store root
pub const JOURNAL_FILE: &str = "_journal.dat";

/// Mutation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalOp {
    Insert,
    Update,
    Delete,
}

impl JournalOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            JournalOp::Insert => "insert",
            JournalOp::Update => "update",
            JournalOp::Delete => "delete",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "insert" => Some(JournalOp::Insert),
            "update" => Some(JournalOp::Update),
            "delete" => Some(JournalOp::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for JournalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An in-flight mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    pub op: JournalOp,
    pub id: u64,
    pub payload: Vec<u8>,
}

impl Intent {
    pub fn insert(id: u64, payload: Vec<u8>) -> Self {
        Self {
            op: JournalOp::Insert,
            id,
            payload,
        }
    }

    pub fn update(id: u64, payload: Vec<u8>) -> Self {
        Self {
            op: JournalOp::Update,
            id,
            payload,
        }
    }

    pub fn delete(id: u64) -> Self {
        Self {
            op: JournalOp::Delete,
            id,
            payload: Vec::new(),
        }
    }

    /// Serialize header and payload
    pub fn encode(&self) -> Vec<u8> {
        let header = format!(
            "{} {} {:08x} {}\n",
            self.op,
            self.id,
            crc32fast::hash(&self.payload),
            self.payload.len()
        );
        let mut bytes = Vec::with_capacity(header.len() + self.payload.len());
        bytes.extend_from_slice(header.as_bytes());
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    /// Parse and verify a journal image
    pub fn decode(bytes: &[u8]) -> Result<Self, String> {
        let newline = bytes
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| "missing header terminator".to_string())?;
        let header = std::str::from_utf8(&bytes[..newline])
            .map_err(|_| "header is not UTF-8".to_string())?;
        let payload = &bytes[newline + 1..];

        let parts: Vec<&str> = header.split(' ').collect();
        let [op, id, crc, len] = parts.as_slice() else {
            return Err(format!("malformed header '{}'", header));
        };
        let op = JournalOp::parse(op).ok_or_else(|| format!("unknown op '{}'", op))?;
        let id = id.parse::<u64>().map_err(|e| format!("bad id: {}", e))?;
        let crc = u32::from_str_radix(crc, 16).map_err(|e| format!("bad checksum: {}", e))?;
        let len = len.parse::<usize>().map_err(|e| format!("bad length: {}", e))?;

        if payload.len() != len {
            return Err(format!("payload is {} bytes, header says {}", payload.len(), len));
        }
        if crc32fast::hash(payload) != crc {
            return Err("payload checksum mismatch".to_string());
        }
        Ok(Self {
            op,
            id,
            payload: payload.to_vec(),
        })
    }
}

/// Journal file handle
#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
    sync_writes: bool,
}

impl Journal {
    pub fn new(root: &Path, sync_writes: bool) -> Self {
        Self {
            path: root.join(JOURNAL_FILE),
            sync_writes,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record an intent before applying it
    pub fn begin(&self, intent: &Intent) -> DbResult<()> {
        fsutil::write_file(&self.path, &intent.encode(), self.sync_writes)
            .map_err(|e| DbError::io(format!("failed to write {}", self.path.display()), e))
    }

    /// Clear the journal once every step has been applied
    pub fn commit(&self) -> DbResult<()> {
        fsutil::remove_if_exists(&self.path)
            .map_err(|e| DbError::io(format!("failed to remove {}", self.path.display()), e))
    }

    /// Interrupted mutation left by a previous process, if any.
    ///
    /// A torn journal is logged, removed and reported as `None`.
    pub fn pending(&self) -> DbResult<Option<Intent>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(DbError::io(
                    format!("failed to read {}", self.path.display()),
                    e,
                ))
            }
        };
        match Intent::decode(&bytes) {
            Ok(intent) => Ok(Some(intent)),
            Err(reason) => {
                log_event_with_fields(Event::JournalDiscarded, &[("reason", reason.as_str())]);
                self.commit()?;
                Ok(None)
            }
        }
    }
}
