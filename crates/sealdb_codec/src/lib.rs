//! # SealDB Codec
//!
//! Record value model and the JSON text codec for SealDB.
//!
//! Collections are persisted as an encrypted blob whose plaintext is a
//! UTF-8 JSON array of records. This crate owns that plaintext format:
//!
//! - [`Value`] - dynamic value type (null, bool, int, float, text,
//!   array, object)
//! - [`Map`] - insertion-ordered string-keyed map; a record is a `Map`
//! - [`encode_records`] / [`decode_records`] - the collection plaintext
//!   encoding
//!
//! ## Design Principles
//!
//! - Insertion order of object keys is preserved through a round-trip;
//!   equality between maps ignores it.
//! - An empty or `null` plaintext decodes to an empty record sequence,
//!   never an error. A created-but-empty collection is a valid
//!   collection.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod map;
mod text;
mod value;

pub use error::{CodecError, CodecResult};
pub use map::Map;
pub use text::{decode_records, encode_records};
pub use value::Value;

/// A schema-less record: an insertion-ordered field-name to value map.
pub type Record = Map;
