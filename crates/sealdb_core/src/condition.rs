//! Condition evaluator.
//!
//! A [`Predicate`] is a tagged tree: comparison leaves combined by
//! `All` (AND) and `Any` (OR) groups. The structural JSON surface form
//! is accepted through serde:
//!
//! ```text
//! {"name": "Lee"}                 equality leaf
//! {"age": [">", 6]}               operator leaf
//! {"AND": [ ... ]}                group
//! {"a": 1, "b": 2}                implicit AND of both leaves
//! ```
//!
//! Malformed shapes and unknown operators are rejected when the
//! predicate is constructed, never silently evaluated to false.
//!
//! [`evaluate`] is the single shared implementation used by select,
//! update and delete alike.

use crate::error::{CoreError, CoreResult};
use sealdb_codec::{Map, Record, Value};
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// Comparison operator of a predicate leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Ge,
    /// `<=`
    Le,
}

impl CompareOp {
    /// Parses the symbolic form used by the structural surface.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "==" => Some(CompareOp::Eq),
            "!=" => Some(CompareOp::Ne),
            ">" => Some(CompareOp::Gt),
            "<" => Some(CompareOp::Lt),
            ">=" => Some(CompareOp::Ge),
            "<=" => Some(CompareOp::Le),
            _ => None,
        }
    }

    /// Returns the symbolic form.
    #[must_use]
    pub fn as_symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_symbol())
    }
}

/// A nested boolean expression over record fields.
///
/// Predicates are immutable, constructed per call and never stored.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// A comparison leaf against one field.
    Compare {
        /// The field to resolve against the record.
        field: String,
        /// The comparison operator.
        op: CompareOp,
        /// The value to compare against.
        value: Value,
    },
    /// AND group: true when every sub-predicate is true.
    All(Vec<Predicate>),
    /// OR group: true when any sub-predicate is true.
    Any(Vec<Predicate>),
}

impl Predicate {
    /// Equality leaf.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    /// Inequality leaf.
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Ne, value)
    }

    /// Greater-than leaf.
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Gt, value)
    }

    /// Less-than leaf.
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Lt, value)
    }

    /// Greater-or-equal leaf.
    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Ge, value)
    }

    /// Less-or-equal leaf.
    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Le, value)
    }

    /// Comparison leaf with an explicit operator.
    pub fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Predicate::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// AND group.
    #[must_use]
    pub fn all(predicates: Vec<Predicate>) -> Self {
        Predicate::All(predicates)
    }

    /// OR group.
    #[must_use]
    pub fn any(predicates: Vec<Predicate>) -> Self {
        Predicate::Any(predicates)
    }

    /// Builds a predicate from the structural surface form.
    ///
    /// # Errors
    ///
    /// Returns an error when the value is not an object, a group body
    /// is not an array, a leaf array is not `[operator, value]`, or
    /// the operator symbol is unknown.
    pub fn from_value(value: &Value) -> CoreResult<Self> {
        match value {
            Value::Object(map) => Self::from_map(map),
            other => Err(CoreError::malformed_predicate(format!(
                "expected an object, got {other:?}"
            ))),
        }
    }

    fn from_map(map: &Map) -> CoreResult<Self> {
        let mut parts = Vec::with_capacity(map.len());

        for (key, value) in map.iter() {
            match key {
                "AND" | "OR" => {
                    let items = value.as_array().ok_or_else(|| {
                        CoreError::malformed_predicate(format!("{key} body must be an array"))
                    })?;
                    let mut subs = Vec::with_capacity(items.len());
                    for item in items {
                        subs.push(Self::from_value(item)?);
                    }
                    parts.push(if key == "AND" {
                        Predicate::All(subs)
                    } else {
                        Predicate::Any(subs)
                    });
                }
                field => parts.push(Self::leaf_from_value(field, value)?),
            }
        }

        // A single entry stands alone; multiple top-level entries are
        // implicitly AND-combined.
        Ok(match parts.len() {
            1 => parts.remove(0),
            _ => Predicate::All(parts),
        })
    }

    fn leaf_from_value(field: &str, value: &Value) -> CoreResult<Self> {
        match value {
            Value::Array(items) => {
                if items.len() != 2 {
                    return Err(CoreError::malformed_predicate(format!(
                        "leaf for {field:?} must be [operator, value]"
                    )));
                }
                let symbol = items[0].as_str().ok_or_else(|| {
                    CoreError::malformed_predicate(format!(
                        "operator for {field:?} must be a string"
                    ))
                })?;
                let op = CompareOp::from_symbol(symbol).ok_or_else(|| {
                    CoreError::malformed_predicate(format!("unknown operator: {symbol}"))
                })?;
                Ok(Predicate::compare(field, op, items[1].clone()))
            }
            other => Ok(Predicate::eq(field, other.clone())),
        }
    }
}

impl Serialize for Predicate {
    /// Serializes back to the structural surface form.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Predicate::Compare { field, op, value } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(field, &(Value::from(op.as_symbol()), value))?;
                map.end()
            }
            Predicate::All(subs) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("AND", subs)?;
                map.end()
            }
            Predicate::Any(subs) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("OR", subs)?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Predicate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let surface = Value::deserialize(deserializer)?;
        Predicate::from_value(&surface).map_err(serde::de::Error::custom)
    }
}

/// Decides whether one record satisfies a predicate.
///
/// Pure and deterministic. Groups evaluate left to right and
/// short-circuit on the deciding sub-predicate. A leaf whose field is
/// absent from the record is false for every operator, including `!=`.
#[must_use]
pub fn evaluate(record: &Record, predicate: &Predicate) -> bool {
    evaluate_with(&|field| record.get(field), predicate)
}

/// Evaluation against an arbitrary field lookup. Tests use this to
/// observe which fields a group actually resolves.
fn evaluate_with<'r>(
    lookup: &dyn Fn(&str) -> Option<&'r Value>,
    predicate: &Predicate,
) -> bool {
    match predicate {
        Predicate::Compare { field, op, value } => match lookup(field) {
            None => false,
            Some(actual) => compare_values(actual, *op, value),
        },
        Predicate::All(subs) => subs.iter().all(|sub| evaluate_with(lookup, sub)),
        Predicate::Any(subs) => subs.iter().any(|sub| evaluate_with(lookup, sub)),
    }
}

fn compare_values(actual: &Value, op: CompareOp, expected: &Value) -> bool {
    match op {
        CompareOp::Eq => loose_eq(actual, expected),
        CompareOp::Ne => !loose_eq(actual, expected),
        CompareOp::Gt => matches!(loose_cmp(actual, expected), Some(Ordering::Greater)),
        CompareOp::Lt => matches!(loose_cmp(actual, expected), Some(Ordering::Less)),
        CompareOp::Ge => matches!(
            loose_cmp(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        CompareOp::Le => matches!(
            loose_cmp(actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
    }
}

/// Loose equality: numeric coercion where [`loose_cmp`] applies,
/// structural equality for arrays, objects and null.
fn loose_eq(a: &Value, b: &Value) -> bool {
    match loose_cmp(a, b) {
        Some(ordering) => ordering == Ordering::Equal,
        None => a == b,
    }
}

/// Loose ordering between two values.
///
/// The coercion table (a pinned compatibility decision):
/// - numbers compare numerically, across int and float;
/// - text compares numerically against a number when it parses as one,
///   otherwise the pair is incomparable;
/// - booleans coerce to 1/0 against numbers; two booleans order
///   false < true;
/// - two texts compare lexicographically;
/// - null, arrays and objects have no ordering.
fn loose_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Text(x), Value::Text(y)) => Some(x.cmp(y)),
        (Value::Null | Value::Array(_) | Value::Object(_), _)
        | (_, Value::Null | Value::Array(_) | Value::Object(_)) => None,
        (Value::Bool(_), Value::Text(_)) | (Value::Text(_), Value::Bool(_)) => None,
        _ => {
            let x = numeric_value(a)?;
            let y = numeric_value(b)?;
            x.partial_cmp(&y)
        }
    }
}

/// Numeric coercion shared with the projection engine.
pub(crate) fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Int(n) => Some(*n as f64),
        Value::Float(n) => Some(*n),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Text(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
