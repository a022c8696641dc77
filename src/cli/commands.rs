//! CLI command implementations
//!
//! Every command loads the configuration, opens the store (running
//! recovery if needed), performs one operation and prints one response.

use serde_json::{json, Value};

use crate::config::StoreConfig;
use crate::db::FileDb;
use crate::entity::Document;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_response};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let config = StoreConfig::load(&cli.config)?;
    let data = run_command(&config, cli.command)?;
    write_response(data)
}

/// Execute one command against the configured store
pub fn run_command(config: &StoreConfig, command: Command) -> CliResult<Value> {
    let db: FileDb<Document> = config.open()?;

    match command {
        Command::Init => Ok(json!({
            "root": db.root().display().to_string(),
            "count": db.count(),
            "next_id": db.peek_next_id(),
            "indexes": db.index_configs(),
        })),
        Command::Insert => {
            let mut doc = document_from_stdin()?;
            let id = db.insert(&mut doc)?;
            Ok(json!({ "id": id }))
        }
        Command::Get { id } => Ok(db.find(id)?.to_value()),
        Command::Update { id } => {
            let mut doc = document_from_stdin()?;
            doc.id = id;
            db.update(&doc)?;
            Ok(json!({ "id": id }))
        }
        Command::Delete { id } => {
            db.delete(id)?;
            Ok(json!({ "id": id }))
        }
        Command::List { field, value } => {
            let docs: Vec<Value> = db
                .list(&field, &value)?
                .iter()
                .map(Document::to_value)
                .collect();
            Ok(Value::Array(docs))
        }
        Command::Entries { field, value } => {
            let entries = match value {
                Some(value) => db.list_index_entries(&field, &value),
                None => db.list_all_index_entries(&field),
            };
            Ok(serde_json::to_value(entries)?)
        }
        Command::Rebuild { field } => {
            let entries = db.rebuild_index(&field)?;
            Ok(json!({ "field": field, "entries": entries }))
        }
        Command::Stat => Ok(json!({
            "count": db.count(),
            "next_id": db.peek_next_id(),
        })),
    }
}

fn document_from_stdin() -> CliResult<Document> {
    Document::from_value(read_request()?)
        .ok_or_else(|| CliError::input("expected a JSON object"))
}
