//! Crash testing framework for filedb
//!
//! - `harness`: runs the binary with a crash point enabled
//! - `utils`: store setup and post-crash validation
//! - `scenarios`: one module per mutation kind

pub mod harness;
pub mod scenarios;
pub mod utils;

pub use harness::*;
pub use utils::*;
