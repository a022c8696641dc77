//! Index configuration

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{DbError, DbResult};

/// One secondary index, declared when the store is opened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Indexed field name
    pub field: String,
    /// At most one live record per value
    #[serde(default)]
    pub unique: bool,
    /// Fields cached alongside each entry, in column order
    #[serde(default)]
    pub include: Vec<String>,
}

impl IndexConfig {
    /// Non-unique index on `field`
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            unique: false,
            include: Vec::new(),
        }
    }

    /// Unique index on `field`
    pub fn unique(field: impl Into<String>) -> Self {
        Self {
            unique: true,
            ..Self::new(field)
        }
    }

    /// Cache `fields` in every entry of this index
    pub fn with_include<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = fields.into_iter().map(Into::into).collect();
        self
    }
}

/// Reject configurations the on-disk layout cannot represent.
///
/// Field names become part of a file name (`_<field>.idx`) and include
/// names are only ever looked up, so both must be non-empty and free of
/// path separators and control characters; index fields must be distinct.
pub fn validate_configs(configs: &[IndexConfig]) -> DbResult<()> {
    let mut seen = HashSet::new();
    for config in configs {
        check_name(&config.field)?;
        if !seen.insert(config.field.as_str()) {
            return Err(DbError::InvalidConfig(format!(
                "duplicate index field '{}'",
                config.field
            )));
        }
        for include in &config.include {
            check_name(include)?;
        }
    }
    Ok(())
}

fn check_name(name: &str) -> DbResult<()> {
    if name.is_empty() {
        return Err(DbError::InvalidConfig("empty field name".to_string()));
    }
    if name
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_control())
    {
        return Err(DbError::InvalidConfig(format!(
            "field name '{}' contains a path separator or control character",
            name.escape_debug()
        )));
    }
    Ok(())
}
