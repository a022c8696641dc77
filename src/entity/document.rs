//! Schemaless JSON document entity
//!
//! Used by the CLI and by callers that do not want a dedicated record type.
//! The identifier lives beside the fields rather than inside them, so a
//! field named `id` is just another field.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Entity;

/// A JSON object with an engine-assigned identifier
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    /// Identifier (0 until inserted)
    #[serde(rename = "_id", default)]
    pub id: u64,
    /// Document body
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    /// Create a document from a JSON object body
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { id: 0, fields }
    }

    /// Build a document from an arbitrary JSON value.
    ///
    /// Returns `None` unless the value is an object. A `_id` key in the
    /// object is honoured; any other shape of `_id` is treated as unset.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(mut fields) => {
                let id = fields
                    .remove("_id")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0);
                Some(Self { id, fields })
            }
            _ => None,
        }
    }

    /// Render back to a JSON object including `_id`
    pub fn to_value(&self) -> Value {
        let mut out = Map::with_capacity(self.fields.len() + 1);
        out.insert("_id".to_string(), Value::from(self.id));
        for (k, v) in &self.fields {
            out.insert(k.clone(), v.clone());
        }
        Value::Object(out)
    }
}

impl Entity for Document {
    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn value(&self, field: &str) -> String {
        match self.fields.get(field) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}
