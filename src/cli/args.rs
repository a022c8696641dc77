//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// filedb - an embedded file-backed record store
#[derive(Parser, Debug)]
#[command(name = "filedb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, default_value = "./filedb.json")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the store directory, ledger and index files
    Init,

    /// Insert the JSON object read from stdin
    Insert,

    /// Print one record
    Get {
        /// Record identifier
        id: u64,
    },

    /// Replace a record with the JSON object read from stdin
    Update {
        /// Record identifier
        id: u64,
    },

    /// Delete a record
    Delete {
        /// Record identifier
        id: u64,
    },

    /// Print every record whose field equals a value
    List {
        /// Indexed field
        #[arg(long)]
        field: String,
        /// Value to match
        #[arg(long)]
        value: String,
    },

    /// Print index entries without loading records
    Entries {
        /// Indexed field
        #[arg(long)]
        field: String,
        /// Restrict to one value
        #[arg(long)]
        value: Option<String>,
    },

    /// Rebuild one index from the record files
    Rebuild {
        /// Indexed field
        #[arg(long)]
        field: String,
    },

    /// Print the record count and next identifier
    Stat,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
