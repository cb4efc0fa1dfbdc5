//! Flat numeric reductions over extracted field values.

use crate::error::{CoreError, CoreResult};
use std::fmt;
use std::str::FromStr;

/// A reduction applied to a flat sequence of numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    /// Sum of all values.
    Sum,
    /// Smallest value.
    Min,
    /// Largest value.
    Max,
    /// Arithmetic mean.
    Avg,
    /// Number of values.
    Count,
}

impl AggregateOp {
    /// Canonical operation name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AggregateOp::Sum => "SUM",
            AggregateOp::Min => "MIN",
            AggregateOp::Max => "MAX",
            AggregateOp::Avg => "AVG",
            AggregateOp::Count => "COUNT",
        }
    }
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregateOp {
    type Err = CoreError;

    /// Parses an operation name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SUM" => Ok(AggregateOp::Sum),
            "MIN" => Ok(AggregateOp::Min),
            "MAX" => Ok(AggregateOp::Max),
            "AVG" => Ok(AggregateOp::Avg),
            "COUNT" => Ok(AggregateOp::Count),
            _ => Err(CoreError::UnsupportedAggregate { name: s.to_string() }),
        }
    }
}

/// Reduces `values` with `op`.
///
/// # Errors
///
/// Returns [`CoreError::EmptyInput`] when `values` is empty, except
/// for [`AggregateOp::Count`] which yields `0`.
pub fn aggregate(values: &[f64], op: AggregateOp) -> CoreResult<f64> {
    if values.is_empty() {
        return match op {
            AggregateOp::Count => Ok(0.0),
            _ => Err(CoreError::EmptyInput),
        };
    }
    let result = match op {
        AggregateOp::Sum => values.iter().sum(),
        AggregateOp::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        AggregateOp::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        AggregateOp::Avg => values.iter().sum::<f64>() / values.len() as f64,
        AggregateOp::Count => values.len() as f64,
    };
    Ok(result)
}
