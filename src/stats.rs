use std::fmt::Write as _;

use crate::dataset::{Column, DataTable};

/// Descriptive statistics of one column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub count: usize,
    pub missing_pct: f64,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1)
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

/// Quantile of sorted values with linear interpolation between neighbours.
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

pub fn summarize(column: &Column) -> ColumnSummary {
    let mut values = column.non_missing();
    values.sort_by(f64::total_cmp);

    ColumnSummary {
        name: column.name.clone(),
        count: values.len(),
        missing_pct: column.missing_fraction() * 100.0,
        mean: mean(&values),
        std: sample_std(&values),
        min: values.first().copied(),
        q25: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q75: quantile(&values, 0.75),
        max: values.last().copied(),
    }
}

pub fn describe(table: &DataTable) -> Vec<ColumnSummary> {
    table.columns().iter().map(summarize).collect()
}

fn cell(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.4}", v),
        None => "NaN".to_string(),
    }
}

/// Render the describe table, one line per column.
pub fn render_statistics(table: &DataTable) -> String {
    let summaries = describe(table);
    let name_width = summaries
        .iter()
        .map(|s| s.name.len())
        .max()
        .unwrap_or(0)
        .max("attribute".len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Dataset: {} rows x {} columns, granularity {} ms",
        table.n_rows(),
        table.n_columns(),
        table.granularity_ms()
    );
    let _ = writeln!(
        out,
        "{:<w$} {:>8} {:>9} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
        "attribute", "count", "missing%", "mean", "std", "min", "25%", "50%", "75%", "max",
        w = name_width
    );
    for s in &summaries {
        let _ = writeln!(
            out,
            "{:<w$} {:>8} {:>9.2} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
            s.name,
            s.count,
            s.missing_pct,
            cell(s.mean),
            cell(s.std),
            cell(s.min),
            cell(s.q25),
            cell(s.median),
            cell(s.q75),
            cell(s.max),
            w = name_width
        );
    }
    out
}

pub fn print_statistics(table: &DataTable) {
    print!("{}", render_statistics(table));
}

fn two(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "nan".to_string(),
    }
}

/// LaTeX rows comparing every column of `first` with the same column of `second`.
///
/// Each cell reads `first / second`; a column missing from `second` is 100% missing there.
pub fn latex_table_two_datasets(first: &DataTable, second: &DataTable) -> String {
    let mut out = String::from("attribute, fraction missing values, mean, standard deviation, min, max\n");

    for column in first.columns() {
        let a = summarize(column);
        let b = match second.column(&column.name) {
            Some(other) => summarize(other),
            None => ColumnSummary {
                name: column.name.clone(),
                count: 0,
                missing_pct: 100.0,
                mean: None,
                std: None,
                min: None,
                q25: None,
                median: None,
                q75: None,
                max: None,
            },
        };

        let _ = writeln!(
            out,
            "{} & {:.2} / {:.2} & {} / {} & {} / {} & {} / {} & {} / {} \\\\",
            a.name,
            a.missing_pct,
            b.missing_pct,
            two(a.mean),
            two(b.mean),
            two(a.std),
            two(b.std),
            two(a.min),
            two(b.min),
            two(a.max),
            two(b.max),
        );
    }
    out
}

pub fn print_latex_table_statistics_two_datasets(first: &DataTable, second: &DataTable) {
    print!("{}", latex_table_two_datasets(first, second));
}
