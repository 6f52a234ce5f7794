use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Shape of the table produced for one granularity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetShape {
    pub granularity_ms: u64,
    pub rows: usize,
    pub columns: usize,
    pub column_names: Vec<String>,
}

impl DatasetShape {
    pub fn new(granularity_ms: u64, rows: usize, column_names: Vec<String>) -> Self {
        Self {
            granularity_ms,
            rows,
            columns: column_names.len(),
            column_names,
        }
    }
}

/// Result of a full run, also persisted as JSON next to the output table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub passes: Vec<DatasetShape>,
    pub output_csv: Option<PathBuf>,
    pub figures: Vec<PathBuf>,
    pub message: String,
}

impl RunSummary {
    pub fn new(passes: Vec<DatasetShape>, output_csv: Option<PathBuf>, figures: Vec<PathBuf>) -> Self {
        let message = match &output_csv {
            Some(path) => format!("Processed {} granularities, wrote {}", passes.len(), path.display()),
            None => "No dataset was written".to_string(),
        };
        Self {
            passes,
            output_csv,
            figures,
            message,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
