//! CLI command implementations.

pub mod agg;
pub mod backup;
pub mod create;
pub mod delete;
pub mod insert;
pub mod keys;
pub mod rm;
pub mod select;
pub mod transfer;
pub mod update;
pub mod verify;

use sealdb_core::Predicate;

/// Parses a predicate from its JSON surface form.
///
/// `None` matches every record.
pub(crate) fn parse_predicate(
    raw: Option<&str>,
) -> Result<Predicate, Box<dyn std::error::Error>> {
    match raw {
        Some(text) => Ok(serde_json::from_str(text)?),
        None => Ok(Predicate::all(Vec::new())),
    }
}
