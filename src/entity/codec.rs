//! Record serialization

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Bidirectional record encoding.
///
/// Errors are returned as plain messages; the object store attaches the
/// record path when turning them into `DbError::Decode`/`DbError::Encode`.
pub trait Codec: Send + Sync {
    /// Encode a record to bytes
    fn encode<T: Serialize>(&self, record: &T) -> Result<Vec<u8>, String>;

    /// Decode a record from bytes
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, String>;
}

/// serde_json codec. Records are stored as compact JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, record: &T) -> Result<Vec<u8>, String> {
        serde_json::to_vec(record).map_err(|e| e.to_string())
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, String> {
        serde_json::from_slice(bytes).map_err(|e| e.to_string())
    }
}
