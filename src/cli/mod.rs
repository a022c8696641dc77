//! Command-line front end
//!
//! ```text
//! filedb --config store.json init
//! echo '{"Name": "Alice", "Age": 20}' | filedb --config store.json insert
//! filedb --config store.json list --field Age --value 20
//! ```

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{run, run_command};
pub use errors::{CliError, CliResult};
pub use io::{read_request, write_error, write_response};
