//! Collection plaintext encoding.
//!
//! A collection's plaintext is a UTF-8 JSON array of records. Decoding
//! is deliberately tolerant at the top level: empty text, whitespace,
//! and a literal `null` all decode to an empty record sequence, so a
//! freshly created (truncated) collection file reads as empty rather
//! than failing.

use crate::error::{CodecError, CodecResult};
use crate::map::Map;
use crate::value::Value;

/// Serializes a record sequence to collection plaintext.
///
/// An empty sequence encodes as `[]`, never as absent bytes.
///
/// # Errors
///
/// Returns an error if a value cannot be represented as JSON
/// (non-finite floats).
pub fn encode_records(records: &[Map]) -> CodecResult<String> {
    Ok(serde_json::to_string(records)?)
}

/// Parses collection plaintext back into a record sequence.
///
/// # Errors
///
/// Returns an error if the text is neither empty, `null`, nor a JSON
/// array of objects.
pub fn decode_records(text: &str) -> CodecResult<Vec<Map>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(text)?;
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => {
            let mut records = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                match item {
                    Value::Object(map) => records.push(map),
                    other => {
                        return Err(CodecError::invalid_shape(format!(
                            "element {index} is not an object: {other:?}"
                        )));
                    }
                }
            }
            Ok(records)
        }
        other => Err(CodecError::invalid_shape(format!(
            "top level is not an array: {other:?}"
        ))),
    }
}
