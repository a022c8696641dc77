//! Record contract for filedb
//!
//! The engine knows three things about a record: its identifier, how to
//! overwrite that identifier, and the string form of a named field. Any
//! serde-serializable type implementing [`Entity`] can be stored.

mod codec;
mod document;

pub use codec::{Codec, JsonCodec};
pub use document::Document;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Minimal capability set a stored record must provide.
///
/// An identifier of `0` means "not yet assigned"; `FileDb::insert`
/// overwrites it with a freshly issued id.
pub trait Entity: Serialize + DeserializeOwned {
    /// Record identifier
    fn id(&self) -> u64;

    /// Replace the record identifier
    fn set_id(&mut self, id: u64);

    /// String representation of `field`, used as an index key and for
    /// denormalized include columns. Unknown fields yield an empty string.
    fn value(&self, field: &str) -> String;
}
