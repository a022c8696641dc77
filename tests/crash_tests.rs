//! Crash recovery tests for filedb
//!
//! Each test drives the `filedb` binary with `FILEDB_CRASH_POINT` set so
//! that the process aborts part-way through a mutation, then reopens the
//! store in-process and checks that it is consistent.
//!
//! - Real filesystem (no mocks)
//! - Real process aborts (no simulated failures)

mod crash;
