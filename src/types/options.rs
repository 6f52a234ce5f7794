use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DatasetError;

/// How numerical samples inside one bucket are reduced to a single value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericAggregation {
    Avg,
}

/// How overlapping label intervals are encoded per bucket
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventAggregation {
    /// 1 if any interval of the label overlaps the bucket
    Binary,
    /// number of overlapping intervals of the label
    Sum,
}

/// Column selection for a plot panel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnMatch {
    Exact,
    Like,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotDisplay {
    Line,
    Points,
}

/// Unit of integer timestamps in the input files
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampUnit {
    #[serde(rename = "ns")]
    Nanoseconds,
    #[serde(rename = "us")]
    Microseconds,
    #[serde(rename = "ms")]
    Milliseconds,
    #[serde(rename = "s")]
    Seconds,
}

impl TimestampUnit {
    pub fn nanos_per_unit(self) -> i64 {
        match self {
            TimestampUnit::Nanoseconds => 1,
            TimestampUnit::Microseconds => 1_000,
            TimestampUnit::Milliseconds => 1_000_000,
            TimestampUnit::Seconds => 1_000_000_000,
        }
    }

    pub fn to_nanos(self, value: i64) -> Option<i64> {
        value.checked_mul(self.nanos_per_unit())
    }
}

impl Default for TimestampUnit {
    fn default() -> Self {
        TimestampUnit::Nanoseconds
    }
}

impl FromStr for NumericAggregation {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "avg" => Ok(NumericAggregation::Avg),
            other => Err(DatasetError::UnknownAggregation(other.to_string())),
        }
    }
}

impl FromStr for EventAggregation {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binary" => Ok(EventAggregation::Binary),
            "sum" => Ok(EventAggregation::Sum),
            other => Err(DatasetError::UnknownAggregation(other.to_string())),
        }
    }
}

impl fmt::Display for NumericAggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericAggregation::Avg => write!(f, "avg"),
        }
    }
}

impl fmt::Display for EventAggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventAggregation::Binary => write!(f, "binary"),
            EventAggregation::Sum => write!(f, "sum"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_aggregations() {
        assert_eq!("avg".parse::<NumericAggregation>().unwrap(), NumericAggregation::Avg);
        assert_eq!(" Binary ".parse::<EventAggregation>().unwrap(), EventAggregation::Binary);
        assert_eq!("sum".parse::<EventAggregation>().unwrap(), EventAggregation::Sum);
    }

    #[test]
    fn rejects_unknown_aggregation() {
        let err = "median".parse::<NumericAggregation>().unwrap_err();
        assert!(matches!(err, DatasetError::UnknownAggregation(ref s) if s == "median"));
    }

    #[test]
    fn converts_units_to_nanos() {
        assert_eq!(TimestampUnit::Milliseconds.to_nanos(1_500), Some(1_500_000_000));
        assert_eq!(TimestampUnit::Nanoseconds.to_nanos(42), Some(42));
        assert_eq!(TimestampUnit::Seconds.to_nanos(i64::MAX), None);
    }
}
