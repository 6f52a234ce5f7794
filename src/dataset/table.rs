use std::path::Path;

use log::info;

use crate::error::DatasetError;
use crate::utils::format_timestamp;

/// Cell storage of a column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    /// Aggregated sensor values, `None` for buckets without samples
    Numeric(Vec<Option<f64>>),
    /// Label indicators (0/1) or overlap counts
    Count(Vec<u32>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Numeric(values),
        }
    }

    pub fn count(name: impl Into<String>, values: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Count(values),
        }
    }

    pub fn len(&self) -> usize {
        match &self.values {
            ColumnValues::Numeric(v) => v.len(),
            ColumnValues::Count(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn value(&self, row: usize) -> Option<f64> {
        match &self.values {
            ColumnValues::Numeric(v) => v.get(row).copied().flatten(),
            ColumnValues::Count(v) => v.get(row).map(|&c| c as f64),
        }
    }

    /// All present values, in row order
    pub fn non_missing(&self) -> Vec<f64> {
        (0..self.len()).filter_map(|row| self.value(row)).collect()
    }

    /// Number of present (non-missing) cells
    pub fn count_present(&self) -> usize {
        match &self.values {
            ColumnValues::Numeric(v) => v.iter().filter(|c| c.is_some()).count(),
            ColumnValues::Count(v) => v.len(),
        }
    }

    pub fn missing_fraction(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        (self.len() - self.count_present()) as f64 / self.len() as f64
    }

    fn format_cell(&self, row: usize) -> String {
        match &self.values {
            ColumnValues::Numeric(v) => match v.get(row).copied().flatten() {
                Some(x) => x.to_string(),
                None => String::new(),
            },
            ColumnValues::Count(v) => v.get(row).map(|c| c.to_string()).unwrap_or_default(),
        }
    }
}

/// Sensor data aligned on a regular time grid, one row per bucket
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    timestamps: Vec<i64>,
    granularity_ns: i64,
    columns: Vec<Column>,
}

impl DataTable {
    /// Grid `start, start + g, ...` up to and including `end` when it falls on the grid.
    pub fn with_grid(start_ns: i64, end_ns: i64, granularity_ns: i64) -> Self {
        let rows = if end_ns < start_ns {
            0
        } else {
            ((end_ns - start_ns) / granularity_ns) as usize + 1
        };

        let timestamps = (0..rows)
            .map(|i| start_ns + i as i64 * granularity_ns)
            .collect();

        Self {
            timestamps,
            granularity_ns,
            columns: Vec::new(),
        }
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    pub fn granularity_ns(&self) -> i64 {
        self.granularity_ns
    }

    pub fn granularity_ms(&self) -> u64 {
        (self.granularity_ns / 1_000_000) as u64
    }

    pub fn n_rows(&self) -> usize {
        self.timestamps.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// `(rows, columns)`, index excluded
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows(), self.n_columns())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn columns_with_prefix(&self, prefix: &str) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.name.starts_with(prefix)).collect()
    }

    pub fn missing_fraction(&self, name: &str) -> Option<f64> {
        self.column(name).map(Column::missing_fraction)
    }

    pub(crate) fn push_column(&mut self, column: Column) -> Result<(), DatasetError> {
        if self.has_column(&column.name) {
            return Err(DatasetError::DuplicateColumn(column.name));
        }
        debug_assert_eq!(column.len(), self.n_rows());
        self.columns.push(column);
        Ok(())
    }

    /// Write the table as CSV: an unnamed index column of bucket start times, then every column.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), DatasetError> {
        let path = path.as_ref();
        let csv_error = |source| DatasetError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;

        let mut header = Vec::with_capacity(self.columns.len() + 1);
        header.push(String::new());
        header.extend(self.column_names());
        writer.write_record(&header).map_err(csv_error)?;

        for (row, &ts) in self.timestamps.iter().enumerate() {
            let mut record = Vec::with_capacity(self.columns.len() + 1);
            record.push(format_timestamp(ts));
            record.extend(self.columns.iter().map(|c| c.format_cell(row)));
            writer.write_record(&record).map_err(csv_error)?;
        }

        writer.flush().map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Wrote {} rows x {} columns to {}", self.n_rows(), self.n_columns(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_includes_end_on_boundary() {
        let table = DataTable::with_grid(100, 400, 100);
        assert_eq!(table.timestamps(), &[100, 200, 300, 400]);

        let table = DataTable::with_grid(100, 450, 100);
        assert_eq!(table.n_rows(), 4);

        let table = DataTable::with_grid(100, 100, 100);
        assert_eq!(table.n_rows(), 1);
    }

    #[test]
    fn rejects_duplicate_columns() {
        let mut table = DataTable::with_grid(0, 10, 10);
        table.push_column(Column::count("labelwalk", vec![0, 1])).unwrap();
        let err = table.push_column(Column::count("labelwalk", vec![1, 1])).unwrap_err();
        assert!(matches!(err, DatasetError::DuplicateColumn(ref n) if n == "labelwalk"));
    }

    #[test]
    fn missing_fraction_counts_empty_buckets() {
        let column = Column::numeric("acc_phone_x", vec![Some(1.0), None, None, Some(2.0)]);
        assert_eq!(column.missing_fraction(), 0.5);
        assert_eq!(column.non_missing(), vec![1.0, 2.0]);

        let labels = Column::count("labelwalk", vec![0, 1]);
        assert_eq!(labels.missing_fraction(), 0.0);
    }

    #[test]
    fn selects_columns_by_prefix() {
        let mut table = DataTable::with_grid(0, 0, 1);
        table.push_column(Column::numeric("acc_phone_x", vec![None])).unwrap();
        table.push_column(Column::numeric("gyr_phone_x", vec![None])).unwrap();
        table.push_column(Column::numeric("acc_phone_y", vec![None])).unwrap();

        let names: Vec<_> = table.columns_with_prefix("acc_").iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["acc_phone_x", "acc_phone_y"]);
        assert_eq!(table.shape(), (1, 3));
    }

    #[test]
    fn writes_index_and_cells() {
        let mut table = DataTable::with_grid(0, 1_000_000_000, 500_000_000);
        table
            .push_column(Column::numeric("acc_phone_x", vec![Some(0.25), None, Some(-1.0)]))
            .unwrap();
        table.push_column(Column::count("labelwalk", vec![1, 0, 1])).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        table.write_csv(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            ",acc_phone_x,labelwalk\n\
             1970-01-01 00:00:00,0.25,1\n\
             1970-01-01 00:00:00.500,,0\n\
             1970-01-01 00:00:01,-1,1\n"
        );
    }
}
