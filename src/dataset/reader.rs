use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info};

use crate::error::DatasetError;
use crate::types::{LabelInterval, SensorSample, TimestampUnit};
use crate::utils::parse_timestamp;

fn open_reader(path: &Path) -> Result<csv::Reader<File>, DatasetError> {
    let file = File::open(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(file))
}

fn column_index(headers: &StringRecord, path: &Path, column: &str) -> Result<usize, DatasetError> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| DatasetError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        })
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn csv_error(path: &Path) -> impl Fn(csv::Error) -> DatasetError + '_ {
    move |source| DatasetError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

fn read_timestamp(
    record: &StringRecord,
    idx: usize,
    path: &Path,
    unit: TimestampUnit,
) -> Result<i64, DatasetError> {
    let raw = record.get(idx).unwrap_or("");
    parse_timestamp(raw, unit).ok_or_else(|| DatasetError::BadTimestamp {
        path: path.to_path_buf(),
        line: line_of(record),
        value: raw.to_string(),
    })
}

/// Empty cells and `NaN` are missing samples, anything else must be a number.
fn read_value(
    record: &StringRecord,
    idx: usize,
    column: &str,
    path: &Path,
) -> Result<Option<f64>, DatasetError> {
    let raw = record.get(idx).unwrap_or("");
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }

    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| DatasetError::BadValue {
            path: path.to_path_buf(),
            line: line_of(record),
            column: column.to_string(),
            value: raw.to_string(),
        })
}

/// Read a numerical sensor file, keeping only the timestamp and the requested value columns.
pub fn read_numeric_source(
    path: &Path,
    timestamp_col: &str,
    value_cols: &[String],
    unit: TimestampUnit,
) -> Result<Vec<SensorSample>, DatasetError> {
    info!("Reading data from {}", path.display());

    let mut reader = open_reader(path)?;
    let headers = reader.headers().map_err(csv_error(path))?.clone();

    let ts_idx = column_index(&headers, path, timestamp_col)?;
    let value_idx = value_cols
        .iter()
        .map(|col| column_index(&headers, path, col))
        .collect::<Result<Vec<_>, _>>()?;

    let mut samples = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error(path))?;
        let timestamp = read_timestamp(&record, ts_idx, path, unit)?;

        let mut values = Vec::with_capacity(value_idx.len());
        for (col, &idx) in value_cols.iter().zip(&value_idx) {
            values.push(read_value(&record, idx, col, path)?);
        }

        samples.push(SensorSample::new(timestamp, values));
    }

    debug!("{}: {} samples", path.display(), samples.len());
    Ok(samples)
}

/// Read a label file of `(start, end, label)` intervals.
pub fn read_event_source(
    path: &Path,
    start_col: &str,
    end_col: &str,
    value_col: &str,
    unit: TimestampUnit,
) -> Result<Vec<LabelInterval>, DatasetError> {
    info!("Reading data from {}", path.display());

    let mut reader = open_reader(path)?;
    let headers = reader.headers().map_err(csv_error(path))?.clone();

    let start_idx = column_index(&headers, path, start_col)?;
    let end_idx = column_index(&headers, path, end_col)?;
    let value_idx = column_index(&headers, path, value_col)?;

    let mut intervals = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error(path))?;
        let start = read_timestamp(&record, start_idx, path, unit)?;
        let end = read_timestamp(&record, end_idx, path, unit)?;

        if end < start {
            return Err(DatasetError::InvalidInterval {
                path: path.to_path_buf(),
                line: line_of(&record),
            });
        }

        let label = record.get(value_idx).unwrap_or("");
        if label.is_empty() {
            return Err(DatasetError::BadValue {
                path: path.to_path_buf(),
                line: line_of(&record),
                column: value_col.to_string(),
                value: String::new(),
            });
        }

        intervals.push(LabelInterval::new(start, end, label));
    }

    debug!("{}: {} intervals", path.display(), intervals.len());
    Ok(intervals)
}
