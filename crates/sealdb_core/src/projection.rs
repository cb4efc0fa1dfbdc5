//! Projection/transform engine.
//!
//! A [`FieldSpec`] maps output field names to either a direct source
//! field reference or a named transform. The structural surface form:
//!
//! ```text
//! {"name": "name"}                              direct copy
//! {"full": {"concat": ["s::Mr. ", "name"]}}     transform
//! {"born": {"date_format": ["dob", "%d/%m/%Y"]}}
//! ```
//!
//! Transform parameters prefixed with the `s::` literal marker are
//! used verbatim (marker stripped); anything else is resolved as a
//! field name against the record, defaulting to `""` for string
//! transforms and `0` for numeric ones.
//!
//! Unknown transform names are rejected when the field spec is
//! constructed. The dynamic entry point [`project_value`] never
//! produces partial rows: any malformed spec aborts the whole
//! projection and yields an empty sequence.

use crate::condition::numeric_value;
use crate::error::{CoreError, CoreResult};
use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use sealdb_codec::{Map, Record, Value};
use serde::de::{Deserialize, Deserializer};
use std::fmt::Write as _;

/// Prefix marking a transform parameter as a verbatim constant.
pub const LITERAL_MARKER: &str = "s::";

/// Candidate input patterns for `date_format`, tried in order.
const DATE_PATTERNS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%b %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
    "%B %d, %Y",
];

/// A resolved-per-record transform parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    /// A verbatim constant (the literal marker already stripped).
    Literal(String),
    /// A field name looked up against each record.
    Field(String),
}

impl Param {
    /// Parses a raw parameter string, honoring the literal marker.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix(LITERAL_MARKER) {
            Some(literal) => Param::Literal(literal.to_string()),
            None => Param::Field(raw.to_string()),
        }
    }

    /// Resolves to text; an absent field defaults to `""`.
    fn resolve_text(&self, record: &Record) -> String {
        match self {
            Param::Literal(text) => text.clone(),
            Param::Field(name) => record.get(name).map(value_to_text).unwrap_or_default(),
        }
    }

    /// Resolves to a number; absent fields and non-numeric values
    /// default to `0`.
    fn resolve_number(&self, record: &Record) -> f64 {
        match self {
            Param::Literal(text) => text.trim().parse().unwrap_or(0.0),
            Param::Field(name) => record
                .get(name)
                .and_then(numeric_value)
                .unwrap_or(0.0),
        }
    }
}

/// How one output field is derived.
#[derive(Debug, Clone, PartialEq)]
enum FieldSource {
    /// Copy a source field as-is; omit the output field when absent.
    Copy(String),
    /// Join all parameters as text, no separator.
    Concat(Vec<Param>),
    /// Upper-case the single parameter.
    Uppercase(Param),
    /// Lower-case the single parameter.
    Lowercase(Param),
    /// Numeric sum of all parameters.
    Sum(Vec<Param>),
    /// Left fold: first parameter minus each subsequent one.
    Difference(Vec<Param>),
    /// Reformat a date; the second element is the target pattern.
    DateFormat { source: Param, target: String },
}

/// Declarative mapping from a source record to an output record.
///
/// Output fields are emitted in spec order, one output record per
/// input record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    fields: Vec<(String, FieldSource)>,
}

impl FieldSpec {
    /// Builds a field spec from the structural surface form.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownTransform`] for an unrecognized
    /// transform name and [`CoreError::MalformedSpec`] for any other
    /// shape problem.
    pub fn from_value(value: &Value) -> CoreResult<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| CoreError::malformed_spec("field spec must be an object"))?;

        let mut fields = Vec::with_capacity(map.len());
        for (output, source) in map.iter() {
            let source = match source {
                Value::Text(field) => FieldSource::Copy(field.clone()),
                Value::Object(transform) => Self::transform_from_map(output, transform)?,
                other => {
                    return Err(CoreError::malformed_spec(format!(
                        "field {output:?} must be a source name or a transform, got {other:?}"
                    )));
                }
            };
            fields.push((output.to_string(), source));
        }
        Ok(Self { fields })
    }

    fn transform_from_map(output: &str, transform: &Map) -> CoreResult<FieldSource> {
        let (name, params) = match transform.iter().next() {
            Some(entry) if transform.len() == 1 => entry,
            _ => {
                return Err(CoreError::malformed_spec(format!(
                    "field {output:?} must name exactly one transform"
                )));
            }
        };

        match name {
            "concat" => Ok(FieldSource::Concat(param_list(output, params)?)),
            "uppercase" => Ok(FieldSource::Uppercase(single_param(output, params)?)),
            "lowercase" => Ok(FieldSource::Lowercase(single_param(output, params)?)),
            "sum" => Ok(FieldSource::Sum(param_list(output, params)?)),
            "difference" => Ok(FieldSource::Difference(param_list(output, params)?)),
            "date_format" => {
                let raw = param_strings(output, params)?;
                let [source, target] = raw.as_slice() else {
                    return Err(CoreError::malformed_spec(format!(
                        "date_format for {output:?} takes [source, target pattern]"
                    )));
                };
                Ok(FieldSource::DateFormat {
                    source: Param::parse(source),
                    // The target pattern is used verbatim, never
                    // resolved as a field.
                    target: target.clone(),
                })
            }
            other => Err(CoreError::unknown_transform(other)),
        }
    }

    /// Derives one output record from `record`.
    #[must_use]
    pub fn apply(&self, record: &Record) -> Record {
        let mut out = Record::with_capacity(self.fields.len());
        for (output, source) in &self.fields {
            match source {
                FieldSource::Copy(field) => {
                    if let Some(value) = record.get(field) {
                        out.insert(output.clone(), value.clone());
                    }
                }
                FieldSource::Concat(params) => {
                    let text: String =
                        params.iter().map(|p| p.resolve_text(record)).collect();
                    out.insert(output.clone(), Value::Text(text));
                }
                FieldSource::Uppercase(param) => {
                    out.insert(
                        output.clone(),
                        Value::Text(param.resolve_text(record).to_uppercase()),
                    );
                }
                FieldSource::Lowercase(param) => {
                    out.insert(
                        output.clone(),
                        Value::Text(param.resolve_text(record).to_lowercase()),
                    );
                }
                FieldSource::Sum(params) => {
                    let total = params.iter().map(|p| p.resolve_number(record)).sum();
                    out.insert(output.clone(), number_value(total));
                }
                FieldSource::Difference(params) => {
                    let mut iter = params.iter().map(|p| p.resolve_number(record));
                    let first = iter.next().unwrap_or(0.0);
                    let result = iter.fold(first, |acc, n| acc - n);
                    out.insert(output.clone(), number_value(result));
                }
                FieldSource::DateFormat { source, target } => {
                    let raw = source.resolve_text(record);
                    // An empty source omits the output field entirely.
                    if !raw.is_empty() {
                        out.insert(output.clone(), Value::Text(format_date(&raw, target)));
                    }
                }
            }
        }
        out
    }
}

impl<'de> Deserialize<'de> for FieldSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let surface = Value::deserialize(deserializer)?;
        FieldSpec::from_value(&surface).map_err(serde::de::Error::custom)
    }
}

/// Derives output records from `records` according to `spec`.
#[must_use]
pub fn project(records: &[Record], spec: &FieldSpec) -> Vec<Record> {
    records.iter().map(|record| spec.apply(record)).collect()
}

/// Dynamic-surface projection.
///
/// Parses `spec` from its structural form and projects; a malformed
/// spec (including an unknown transform name) aborts the whole
/// projection and returns an empty sequence rather than partial rows.
#[must_use]
pub fn project_value(records: &[Record], spec: &Value) -> Vec<Record> {
    match FieldSpec::from_value(spec) {
        Ok(spec) => project(records, &spec),
        Err(error) => {
            tracing::warn!(%error, "projection aborted");
            Vec::new()
        }
    }
}

fn param_strings(output: &str, params: &Value) -> CoreResult<Vec<String>> {
    let items = params.as_array().ok_or_else(|| {
        CoreError::malformed_spec(format!("parameters for {output:?} must be an array"))
    })?;
    items
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                CoreError::malformed_spec(format!(
                    "parameters for {output:?} must be strings"
                ))
            })
        })
        .collect()
}

fn param_list(output: &str, params: &Value) -> CoreResult<Vec<Param>> {
    Ok(param_strings(output, params)?
        .iter()
        .map(|raw| Param::parse(raw))
        .collect())
}

fn single_param(output: &str, params: &Value) -> CoreResult<Param> {
    let raw = params.as_str().ok_or_else(|| {
        CoreError::malformed_spec(format!(
            "transform for {output:?} takes a single string parameter"
        ))
    })?;
    Ok(Param::parse(raw))
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Float(n) => n.to_string(),
        Value::Text(s) => s.clone(),
        // Structured values stringify as their JSON text.
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// Collapses a whole-number float back to an integer value.
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::Int(n as i64)
    } else {
        Value::Float(n)
    }
}

fn format_date(raw: &str, target: &str) -> String {
    for pattern in DATE_PATTERNS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, pattern) {
            return reformat(date, target).unwrap_or_else(|| raw.to_string());
        }
    }
    // No candidate pattern matched; pass the raw value through.
    raw.to_string()
}

fn reformat(date: NaiveDate, target: &str) -> Option<String> {
    let items: Vec<Item<'_>> = StrftimeItems::new(target).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return None;
    }
    let mut out = String::new();
    write!(out, "{}", date.format_with_items(items.into_iter())).ok()?;
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[(&str, Value)]) -> Record {
        fields.iter().cloned().collect()
    }

    fn spec(text: &str) -> FieldSpec {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn direct_copy_skips_absent_fields() {
        let s = spec(r#"{"name":"name","age":"age"}"#);
        let out = project(&[record(&[("name", Value::from("a"))])], &s);
        assert_eq!(out, vec![record(&[("name", Value::from("a"))])]);
    }

    #[test]
    fn concat_with_literal_marker() {
        let s = spec(r#"{"full":{"concat":["s::Mr. ","name"]}}"#);
        let out = project(&[record(&[("name", Value::from("Lee"))])], &s);
        assert_eq!(out, vec![record(&[("full", Value::from("Mr. Lee"))])]);
    }

    #[test]
    fn concat_defaults_absent_fields_to_empty() {
        let s = spec(r#"{"full":{"concat":["name","s::!"]}}"#);
        let out = project(&[record(&[])], &s);
        assert_eq!(out, vec![record(&[("full", Value::from("!"))])]);
    }

    #[test]
    fn case_transforms() {
        let r = record(&[("name", Value::from("Lee"))]);
        assert_eq!(
            project(&[r.clone()], &spec(r#"{"up":{"uppercase":"name"}}"#)),
            vec![record(&[("up", Value::from("LEE"))])]
        );
        assert_eq!(
            project(&[r], &spec(r#"{"down":{"lowercase":"name"}}"#)),
            vec![record(&[("down", Value::from("lee"))])]
        );
        assert_eq!(
            project(&[record(&[])], &spec(r#"{"up":{"uppercase":"s::hi"}}"#)),
            vec![record(&[("up", Value::from("HI"))])]
        );
    }

    #[test]
    fn sum_over_fields_and_literals() {
        let r = record(&[("a", Value::from(2)), ("b", Value::from("3.5"))]);
        let out = project(&[r], &spec(r#"{"total":{"sum":["a","b","s::4"]}}"#));
        assert_eq!(out, vec![record(&[("total", Value::from(9.5))])]);
    }

    #[test]
    fn sum_defaults_absent_fields_to_zero() {
        let out = project(
            &[record(&[("a", Value::from(2))])],
            &spec(r#"{"total":{"sum":["a","missing"]}}"#),
        );
        assert_eq!(out, vec![record(&[("total", Value::from(2))])]);
    }

    #[test]
    fn difference_folds_left() {
        let r = record(&[("a", Value::from(10)), ("b", Value::from(3))]);
        let out = project(&[r], &spec(r#"{"rest":{"difference":["a","b","s::2"]}}"#));
        assert_eq!(out, vec![record(&[("rest", Value::from(5))])]);
    }

    #[test]
    fn whole_number_results_are_integers() {
        let out = project(
            &[record(&[("a", Value::from(1.5)), ("b", Value::from(0.5))])],
            &spec(r#"{"total":{"sum":["a","b"]}}"#),
        );
        assert_eq!(out, vec![record(&[("total", Value::Int(2))])]);
    }

    #[test]
    fn date_format_first_matching_pattern_wins() {
        let s = spec(r#"{"born":{"date_format":["dob","%d/%m/%Y"]}}"#);
        let out = project(&[record(&[("dob", Value::from("2024-01-05"))])], &s);
        assert_eq!(out, vec![record(&[("born", Value::from("05/01/2024"))])]);
    }

    #[test]
    fn date_format_parses_named_months() {
        let s = spec(r#"{"born":{"date_format":["dob","%Y-%m-%d"]}}"#);
        let out = project(&[record(&[("dob", Value::from("Jan 05, 2024"))])], &s);
        assert_eq!(out, vec![record(&[("born", Value::from("2024-01-05"))])]);
    }

    #[test]
    fn unparseable_date_passes_through() {
        let s = spec(r#"{"born":{"date_format":["dob","%d/%m/%Y"]}}"#);
        let out = project(&[record(&[("dob", Value::from("someday"))])], &s);
        assert_eq!(out, vec![record(&[("born", Value::from("someday"))])]);
    }

    #[test]
    fn empty_date_source_omits_the_field() {
        let s = spec(r#"{"born":{"date_format":["dob","%d/%m/%Y"]}}"#);
        let out = project(&[record(&[])], &s);
        assert_eq!(out, vec![record(&[])]);
    }

    #[test]
    fn date_format_literal_source() {
        let s = spec(r#"{"day":{"date_format":["s::05/01/2024","%Y-%m-%d"]}}"#);
        let out = project(&[record(&[])], &s);
        assert_eq!(out, vec![record(&[("day", Value::from("2024-01-05"))])]);
    }

    #[test]
    fn unknown_transform_rejected_at_construction() {
        let result = FieldSpec::from_value(
            &serde_json::from_str::<Value>(r#"{"x":{"rot13":"name"}}"#).unwrap(),
        );
        assert!(matches!(result, Err(CoreError::UnknownTransform { .. })));
    }

    #[test]
    fn dynamic_surface_aborts_whole_projection() {
        let records = vec![
            record(&[("name", Value::from("a"))]),
            record(&[("name", Value::from("b"))]),
        ];
        let bad: Value =
            serde_json::from_str(r#"{"ok":"name","x":{"rot13":"name"}}"#).unwrap();
        assert!(project_value(&records, &bad).is_empty());

        let good: Value = serde_json::from_str(r#"{"ok":"name"}"#).unwrap();
        assert_eq!(project_value(&records, &good).len(), 2);
    }

    #[test]
    fn output_fields_keep_spec_order() {
        let s = spec(r#"{"b":"b","a":"a"}"#);
        let out = project(
            &[record(&[("a", Value::from(1)), ("b", Value::from(2))])],
            &s,
        );
        assert_eq!(out[0].keys().collect::<Vec<_>>(), ["b", "a"]);
    }
}
