//! filedb CLI entry point
//!
//! Parsing, dispatch and output all live in `filedb::cli`; this only
//! maps failures to an error response and a non-zero exit status.

use filedb::cli;

fn main() {
    if let Err(e) = cli::run() {
        let _ = cli::write_error(e.code(), &e.to_string());
        std::process::exit(1);
    }
}
