//! Select command implementation.

use crate::commands::parse_predicate;
use sealdb_core::{project, FieldSpec, RecordStore, SelectOrder};

/// Runs the select command.
///
/// Prints matching records as pretty JSON; an optional projection
/// spec reshapes each record before printing.
pub fn run(
    store: &RecordStore,
    collection: &str,
    r#where: Option<&str>,
    fields: Option<&str>,
    reverse: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let predicate = parse_predicate(r#where)?;
    let order = if reverse {
        SelectOrder::Reversed
    } else {
        SelectOrder::Stored
    };

    let mut records = store.select_where(collection, &predicate, order)?;
    if let Some(spec) = fields {
        let spec: FieldSpec = serde_json::from_str(spec)?;
        records = project(&records, &spec);
    }

    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
