//! Secondary index subsystem for filedb
//!
//! Equality indexes over record fields. Each index lives in memory and is
//! mirrored to `<root>/_<field>.idx`. The mirror is derived state: when it
//! is missing or malformed it is rebuilt by scanning the record files,
//! which stay the source of truth.
//!
//! Inserts append one line per index; updates and deletes rewrite the
//! affected files.

mod config;
mod engine;
mod entry;
pub mod file;

pub use config::{validate_configs, IndexConfig};
pub use engine::{index_path, IndexEngine, RecordScan};
pub use entry::IndexEntry;
