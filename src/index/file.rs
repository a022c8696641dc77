//! On-disk index mirror
//!
//! One line per entry, tab-separated:
//!
//! ```text
//! value \t id [\t include_1 ... \t include_n]
//! ```
//!
//! Include columns follow the configured order. Backslash, tab, newline
//! and carriage return inside values are written as `\\`, `\t`, `\n` and
//! `\r` so that any string survives a save/load cycle.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::config::IndexConfig;
use super::entry::IndexEntry;
use crate::error::{DbError, DbResult};
use crate::storage::fsutil;

/// value -> entries in insertion order
pub type Buckets = BTreeMap<String, Vec<IndexEntry>>;

fn escape(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Render one entry as a newline-terminated line
pub fn format_entry(entry: &IndexEntry, config: &IndexConfig) -> String {
    let mut line = String::new();
    escape(&entry.value, &mut line);
    line.push('\t');
    line.push_str(&entry.id.to_string());
    for field in &config.include {
        line.push('\t');
        escape(entry.other(field).unwrap_or(""), &mut line);
    }
    line.push('\n');
    line
}

/// Parse one line (without its newline)
pub fn parse_line(line: &str, config: &IndexConfig, line_no: usize) -> DbResult<IndexEntry> {
    let invalid = |reason: String| DbError::InvalidIndexFile {
        field: config.field.clone(),
        line: line_no,
        reason,
    };

    let parts: Vec<&str> = line.split('\t').collect();
    let expected = config.include.len() + 2;
    if parts.len() != expected {
        return Err(invalid(format!(
            "expected {} columns, found {}",
            expected,
            parts.len()
        )));
    }
    let id = parts[1]
        .parse::<u64>()
        .map_err(|e| invalid(format!("bad id '{}': {}", parts[1], e)))?;

    let others = config
        .include
        .iter()
        .zip(&parts[2..])
        .map(|(field, raw)| (field.clone(), unescape(raw)))
        .collect();

    Ok(IndexEntry {
        value: unescape(parts[0]),
        id,
        others,
    })
}

/// Load an index file into buckets. Blank lines are ignored; bytes that
/// are not UTF-8 make the file invalid.
pub fn load(path: &Path, config: &IndexConfig) -> DbResult<Buckets> {
    let bytes = fs::read(path)
        .map_err(|e| DbError::io(format!("failed to read index {}", path.display()), e))?;
    let content = String::from_utf8(bytes).map_err(|e| {
        let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
        DbError::InvalidIndexFile {
            field: config.field.clone(),
            line: valid.iter().filter(|&&b| b == b'\n').count() + 1,
            reason: "invalid UTF-8".to_string(),
        }
    })?;

    let mut buckets = Buckets::new();
    for (i, line) in content.lines().enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            continue;
        }
        let entry = parse_line(line, config, i + 1)?;
        buckets.entry(entry.value.clone()).or_default().push(entry);
    }
    Ok(buckets)
}

/// Rewrite an index file from buckets, replacing it by rename
pub fn save(path: &Path, buckets: &Buckets, config: &IndexConfig, sync: bool) -> DbResult<()> {
    let mut content = String::new();
    for entry in buckets.values().flatten() {
        content.push_str(&format_entry(entry, config));
    }
    fsutil::write_atomic(path, content.as_bytes(), sync)
        .map_err(|e| DbError::io(format!("failed to write index {}", path.display()), e))
}

/// Append a single entry to an index file
pub fn append(path: &Path, entry: &IndexEntry, config: &IndexConfig, sync: bool) -> DbResult<()> {
    let line = format_entry(entry, config);
    fsutil::append_file(path, line.as_bytes(), sync)
        .map_err(|e| DbError::io(format!("failed to append to index {}", path.display()), e))
}
