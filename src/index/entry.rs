//! Index entries

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::config::IndexConfig;
use crate::entity::Entity;

/// One record's membership in one bucket of a field index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Bucket key: the record's value for the indexed field
    pub value: String,
    /// Record identifier
    pub id: u64,
    /// Cached include fields as of the last write
    pub others: BTreeMap<String, String>,
}

impl IndexEntry {
    /// Entry for `record` under `config`
    pub fn for_record<T: Entity>(record: &T, config: &IndexConfig) -> Self {
        Self {
            value: record.value(&config.field),
            id: record.id(),
            others: include_values(record, &config.include),
        }
    }

    /// Cached value of an include field
    pub fn other(&self, field: &str) -> Option<&str> {
        self.others.get(field).map(String::as_str)
    }
}

/// Current values of `include` fields on `record`
pub fn include_values<T: Entity>(record: &T, include: &[String]) -> BTreeMap<String, String> {
    include
        .iter()
        .map(|field| (field.clone(), record.value(field)))
        .collect()
}
