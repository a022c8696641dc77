//! Store configuration file
//!
//! ```json
//! {
//!   "data_dir": "./people",
//!   "indexes": [
//!     { "field": "Name", "unique": true },
//!     { "field": "Age", "include": ["Name"] }
//!   ],
//!   "sync_writes": true
//! }
//! ```
//!
//! A relative `data_dir` is resolved against the directory holding the
//! configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::db::{FileDb, StoreOptions};
use crate::entity::{Entity, JsonCodec};
use crate::error::{DbError, DbResult};
use crate::index::{validate_configs, IndexConfig};
use crate::observability::{log_event_with_fields, Event};

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Store root directory (required)
    pub data_dir: PathBuf,

    /// Secondary indexes (optional, default none)
    #[serde(default)]
    pub indexes: Vec<IndexConfig>,

    /// fsync every write (optional, default true)
    #[serde(default = "default_sync_writes")]
    pub sync_writes: bool,
}

fn default_sync_writes() -> bool {
    true
}

impl StoreConfig {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> DbResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DbError::InvalidConfig(format!("failed to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_json(&content)?;

        if config.data_dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.data_dir = parent.join(&config.data_dir);
            }
        }

        let shown = path.display().to_string();
        log_event_with_fields(Event::ConfigLoaded, &[("path", shown.as_str())]);
        Ok(config)
    }

    /// Parse and validate configuration JSON
    pub fn from_json(content: &str) -> DbResult<Self> {
        let config: StoreConfig = serde_json::from_str(content)
            .map_err(|e| DbError::InvalidConfig(format!("invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> DbResult<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(DbError::InvalidConfig("data_dir must not be empty".to_string()));
        }
        validate_configs(&self.indexes)
    }

    /// Store options derived from this configuration
    pub fn options(&self) -> StoreOptions {
        StoreOptions {
            sync_writes: self.sync_writes,
        }
    }

    /// Open the configured store
    pub fn open<T: Entity>(&self) -> DbResult<FileDb<T>> {
        FileDb::open_with(
            self.data_dir.clone(),
            self.indexes.clone(),
            self.options(),
            JsonCodec,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::from_json(r#"{"data_dir": "/tmp/x"}"#).unwrap();
        assert!(config.indexes.is_empty());
        assert!(config.sync_writes);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = StoreConfig::from_json(r#"{"data_dir": "/tmp/x", "wal": true}"#).unwrap_err();
        assert!(matches!(err, DbError::InvalidConfig(_)));
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let err = StoreConfig::from_json(
            r#"{"data_dir": "d", "indexes": [{"field": "A"}, {"field": "A", "unique": true}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_relative_data_dir_resolved() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("store.json");
        fs::write(
            &path,
            r#"{"data_dir": "data", "indexes": [{"field": "Name", "unique": true}]}"#,
        )
        .unwrap();

        let config = StoreConfig::load(&path).unwrap();
        assert_eq!(config.data_dir, temp.path().join("data"));
        assert_eq!(config.indexes, vec![IndexConfig::unique("Name")]);
    }

    #[test]
    fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = StoreConfig::load(&temp.path().join("nope.json")).unwrap_err();
        assert_eq!(err.code(), "FILEDB_INVALID_CONFIG");
    }
}
