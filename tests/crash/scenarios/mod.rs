//! Crash scenarios, one module per mutation kind

pub mod delete;
pub mod insert;
pub mod recovery;
pub mod update;
