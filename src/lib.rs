//! filedb - an embedded, file-backed record store with secondary indexes
//!
//! Each record is one file under the store root, addressed by an
//! engine-assigned integer identifier. Records can also be looked up by
//! equality on any configured index field.
//!
//! ```ignore
//! use filedb::{Document, FileDb, IndexConfig};
//!
//! let db: FileDb<Document> = FileDb::open(
//!     "./people",
//!     vec![IndexConfig::unique("Name"), IndexConfig::new("Age").with_include(["Name"])],
//! )?;
//! let mut alice = Document::from_value(serde_json::json!({"Name": "Alice", "Age": 20})).unwrap();
//! let id = db.insert(&mut alice)?;
//! let twenty = db.list("Age", "20")?;
//! ```
//!
//! # On-disk layout
//!
//! - `_stat.dat`: next identifier and live record count
//! - `_<field>.idx`: one tab-separated mirror per index
//! - `_journal.dat`: present only while a mutation is in flight
//! - `<shard dirs>/<id>.dat`: the records

pub mod cli;
pub mod config;
pub mod crash_point;
pub mod db;
pub mod entity;
pub mod error;
pub mod index;
pub mod journal;
pub mod ledger;
pub mod observability;
pub mod storage;

pub use config::StoreConfig;
pub use db::{FileDb, StoreOptions};
pub use entity::{Codec, Document, Entity, JsonCodec};
pub use error::{DbError, DbResult};
pub use index::{IndexConfig, IndexEntry};
