//! Record storage for filedb
//!
//! Each live record is one file, `<root>/<shard dirs>/<id>.dat`. Files are
//! overwritten in place; the journal (see `crate::journal`) covers the
//! window where an overwrite is torn by a crash.

pub mod fsutil;
mod object_store;
pub mod paths;

pub use object_store::ObjectStore;
