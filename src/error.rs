use std::path::PathBuf;

use crate::config::ConfigError;

/// Errors raised while reading sources and assembling the data table
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Column '{column}' not found in {path}")]
    MissingColumn { path: PathBuf, column: String },
    #[error("Invalid timestamp '{value}' in {path} at line {line}")]
    BadTimestamp { path: PathBuf, line: u64, value: String },
    #[error("Invalid value '{value}' in column '{column}' of {path} at line {line}")]
    BadValue {
        path: PathBuf,
        line: u64,
        column: String,
        value: String,
    },
    #[error("Interval ends before it starts in {path} at line {line}")]
    InvalidInterval { path: PathBuf, line: u64 },
    #[error("No rows in {0}")]
    EmptySource(PathBuf),
    #[error("Column '{0}' already exists in the data table")]
    DuplicateColumn(String),
    #[error("Unknown aggregation '{0}'")]
    UnknownAggregation(String),
    #[error("Granularity must be positive")]
    ZeroGranularity,
    #[error("Granularity of {0} ms overflows the time base")]
    GranularityOverflow(u64),
    #[error("No data table yet, add a dataset first")]
    NoTable,
}

/// Errors raised while rendering figures
#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    #[error("No column matches '{0}'")]
    UnknownColumn(String),
    #[error("Column '{0}' holds no values to plot")]
    NoData(String),
    #[error("Expected {expected} entries, got {actual}")]
    ArgumentMismatch { expected: usize, actual: usize },
    #[error("Drawing error: {0}")]
    Backend(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level error of a run
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Plot(#[from] PlotError),
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Serialize error: {0}")]
    Json(#[from] serde_json::Error),
}
