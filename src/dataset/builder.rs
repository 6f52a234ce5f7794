use std::path::{Path, PathBuf};

use log::{info, warn};

use super::reader::{read_event_source, read_numeric_source};
use super::table::{Column, DataTable};
use crate::error::DatasetError;
use crate::types::{EventAggregation, LabelInterval, NumericAggregation, SensorSample, TimestampUnit};
use crate::utils::{ceil_div, format_timestamp};

const NANOS_PER_MS: i64 = 1_000_000;

/// Builds a [`DataTable`] from the files of one recording directory.
///
/// The first source added fixes the time grid: it spans that source's first
/// to last timestamp in steps of the granularity. Later sources are bucketed
/// onto the same grid; samples outside it are dropped.
pub struct DatasetBuilder {
    base_dir: PathBuf,
    granularity_ms: u64,
    granularity_ns: i64,
    timestamp_unit: TimestampUnit,
    table: Option<DataTable>,
}

impl DatasetBuilder {
    pub fn new<P: Into<PathBuf>>(
        base_dir: P,
        granularity_ms: u64,
        timestamp_unit: TimestampUnit,
    ) -> Result<Self, DatasetError> {
        if granularity_ms == 0 {
            return Err(DatasetError::ZeroGranularity);
        }

        let granularity_ns = i64::try_from(granularity_ms)
            .ok()
            .and_then(|g| g.checked_mul(NANOS_PER_MS))
            .ok_or(DatasetError::GranularityOverflow(granularity_ms))?;

        Ok(Self {
            base_dir: base_dir.into(),
            granularity_ms,
            granularity_ns,
            timestamp_unit,
            table: None,
        })
    }

    pub fn granularity_ms(&self) -> u64 {
        self.granularity_ms
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn ensure_grid(&mut self, start_ns: i64, end_ns: i64) -> &mut DataTable {
        let granularity_ns = self.granularity_ns;
        self.table.get_or_insert_with(|| {
            let table = DataTable::with_grid(start_ns, end_ns, granularity_ns);
            info!(
                "Created time grid {} .. {} with {} rows",
                format_timestamp(start_ns),
                format_timestamp(end_ns),
                table.n_rows()
            );
            table
        })
    }

    /// Add a numerical sensor file, one column per value column named `prefix + column`.
    pub fn add_numerical_dataset(
        &mut self,
        file: &str,
        timestamp_col: &str,
        value_cols: &[String],
        aggregation: NumericAggregation,
        prefix: &str,
    ) -> Result<(), DatasetError> {
        let path = self.base_dir.join(file);
        let samples = read_numeric_source(&path, timestamp_col, value_cols, self.timestamp_unit)?;
        self.add_numerical_samples(&path, &samples, value_cols, aggregation, prefix)
    }

    /// Bucket already parsed samples; `source` only names them in errors.
    pub fn add_numerical_samples(
        &mut self,
        source: &Path,
        samples: &[SensorSample],
        value_cols: &[String],
        aggregation: NumericAggregation,
        prefix: &str,
    ) -> Result<(), DatasetError> {
        let (start, end) = match (
            samples.iter().map(|s| s.timestamp).min(),
            samples.iter().map(|s| s.timestamp).max(),
        ) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(DatasetError::EmptySource(source.to_path_buf())),
        };

        let granularity_ns = self.granularity_ns;
        let table = self.ensure_grid(start, end);
        let names: Vec<String> = value_cols.iter().map(|c| format!("{}{}", prefix, c)).collect();
        for name in &names {
            if table.has_column(name) {
                return Err(DatasetError::DuplicateColumn(name.clone()));
            }
        }

        let rows = table.n_rows();
        let origin = table.timestamps().first().copied().unwrap_or(start);

        let mut sums = vec![vec![0.0_f64; rows]; value_cols.len()];
        let mut counts = vec![vec![0_u32; rows]; value_cols.len()];
        let mut outside = 0usize;

        for sample in samples {
            let offset = sample.timestamp - origin;
            if offset < 0 || offset / granularity_ns >= rows as i64 {
                outside += 1;
                continue;
            }
            let row = (offset / granularity_ns) as usize;

            for (col, value) in sample.values.iter().enumerate() {
                if let Some(v) = value {
                    sums[col][row] += v;
                    counts[col][row] += 1;
                }
            }
        }

        if outside > 0 {
            warn!("{}: {} samples fall outside the time grid and were dropped", source.display(), outside);
        }

        for ((name, sum), count) in names.into_iter().zip(sums).zip(counts) {
            let values = match aggregation {
                NumericAggregation::Avg => sum
                    .into_iter()
                    .zip(count)
                    .map(|(s, n)| if n > 0 { Some(s / n as f64) } else { None })
                    .collect(),
            };
            table.push_column(Column::numeric(name, values))?;
        }

        info!(
            "Added {} ({} samples, {} aggregation) with granularity {} ms",
            source.display(),
            samples.len(),
            aggregation,
            self.granularity_ms
        );
        Ok(())
    }

    /// Add a label file, one column per distinct label value named `prefix + label`.
    pub fn add_event_dataset(
        &mut self,
        file: &str,
        start_col: &str,
        end_col: &str,
        value_col: &str,
        aggregation: EventAggregation,
        prefix: &str,
    ) -> Result<(), DatasetError> {
        let path = self.base_dir.join(file);
        let intervals = read_event_source(&path, start_col, end_col, value_col, self.timestamp_unit)?;
        self.add_event_intervals(&path, &intervals, aggregation, prefix)
    }

    /// Mark every bucket `[t, t + g]` an interval `[start, end)` touches.
    pub fn add_event_intervals(
        &mut self,
        source: &Path,
        intervals: &[LabelInterval],
        aggregation: EventAggregation,
        prefix: &str,
    ) -> Result<(), DatasetError> {
        let (start, end) = match (
            intervals.iter().map(|i| i.start).min(),
            intervals.iter().map(|i| i.end).max(),
        ) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(DatasetError::EmptySource(source.to_path_buf())),
        };

        let granularity_ns = self.granularity_ns;
        let table = self.ensure_grid(start, end);
        let rows = table.n_rows() as i64;
        let origin = table.timestamps().first().copied().unwrap_or(start);

        // 标签按首次出现的顺序生成列
        let mut labels: Vec<&str> = Vec::new();
        for interval in intervals {
            if !labels.contains(&interval.label.as_str()) {
                labels.push(&interval.label);
            }
        }
        for label in &labels {
            let name = format!("{}{}", prefix, label);
            if table.has_column(&name) {
                return Err(DatasetError::DuplicateColumn(name));
            }
        }

        let mut cells = vec![vec![0_u32; rows as usize]; labels.len()];
        let mut labeled_ns = 0i64;

        for interval in intervals {
            labeled_ns += interval.duration_ns();
            let Some(col) = labels.iter().position(|l| *l == interval.label) else {
                continue;
            };

            // start <= t + g  and  end > t,  with t = origin + i * g
            let first = ceil_div(interval.start - origin - granularity_ns, granularity_ns).max(0);
            let last = ceil_div(interval.end - origin, granularity_ns).min(rows);

            for row in first..last {
                let cell = &mut cells[col][row as usize];
                match aggregation {
                    EventAggregation::Binary => *cell = 1,
                    EventAggregation::Sum => *cell += 1,
                }
            }
        }

        for (label, values) in labels.iter().zip(cells) {
            table.push_column(Column::count(format!("{}{}", prefix, label), values))?;
        }

        info!(
            "Added {} ({} intervals, {} labels, {:.1} s labeled, {} aggregation)",
            source.display(),
            intervals.len(),
            labels.len(),
            labeled_ns as f64 / 1e9,
            aggregation
        );
        Ok(())
    }

    pub fn data_table(&self) -> Result<&DataTable, DatasetError> {
        self.table.as_ref().ok_or(DatasetError::NoTable)
    }

    pub fn into_table(self) -> Result<DataTable, DatasetError> {
        self.table.ok_or(DatasetError::NoTable)
    }
}
