//! Storage engine facade
//!
//! [`FileDb`] is the only entry point callers use. It sequences the
//! ledger, the index engine and the object store for every mutation and
//! defines the order of side effects:
//!
//! | op     | steps                                                        |
//! |--------|--------------------------------------------------------------|
//! | insert | allocate id, validate, journal, index, count +1, write file  |
//! | update | load previous, validate, journal, index, overwrite file      |
//! | delete | load previous, journal, count -1, index, remove file         |
//!
//! Every step before the journal write is a pure check (apart from the
//! allocated id, which stays spent). Every step after it is rolled
//! forward on the next open if the process dies part-way.

mod filedb;
mod options;

pub use filedb::FileDb;
pub use options::StoreOptions;
