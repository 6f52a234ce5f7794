use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::config::{AppConfig, SourceConfig};
use crate::dataset::{DataTable, DatasetBuilder};
use crate::error::AppError;
use crate::plotter::DatasetPlotter;
use crate::stats;
use crate::types::{ColumnMatch, DatasetShape, PlotDisplay, RunSummary};

fn create_dir(path: &Path) -> Result<(), AppError> {
    std::fs::create_dir_all(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Assemble the data table for one granularity by adding every configured source in order.
pub fn build_dataset(config: &AppConfig, granularity_ms: u64) -> Result<DataTable, AppError> {
    let mut builder = DatasetBuilder::new(&config.paths.dataset_dir, granularity_ms, config.timestamp_unit)?;
    info!(
        "Creating numerical datasets from files in {} using granularity {}.",
        builder.base_dir().display(),
        builder.granularity_ms()
    );

    for source in &config.sources {
        match source {
            SourceConfig::Numerical {
                file,
                timestamp_col,
                value_cols,
                aggregation,
                prefix,
            } => builder.add_numerical_dataset(file, timestamp_col, value_cols, *aggregation, prefix)?,
            SourceConfig::Event {
                file,
                start_col,
                end_col,
                value_col,
                aggregation,
                prefix,
            } => builder.add_event_dataset(file, start_col, end_col, value_col, *aggregation, prefix)?,
        }
    }

    Ok(builder.into_table()?)
}

fn plot_pass(config: &AppConfig, table: &DataTable, granularity_ms: u64) -> Result<Vec<PathBuf>, AppError> {
    let figures_dir = config.paths.figures_dir.join(format!("granularity_{}ms", granularity_ms));
    let mut plotter = DatasetPlotter::new(figures_dir, config.plot.clone())?;
    let mut figures = Vec::new();

    if !config.plot.boxplot_columns.is_empty() {
        figures.push(plotter.plot_dataset_boxplot(table, &config.plot.boxplot_columns)?);
    }

    if !config.plot.panels.is_empty() {
        let prefixes: Vec<String> = config.plot.panels.iter().map(|p| p.prefix.clone()).collect();
        let matches: Vec<ColumnMatch> = config.plot.panels.iter().map(|p| p.matching).collect();
        let displays: Vec<PlotDisplay> = config.plot.panels.iter().map(|p| p.display).collect();
        figures.push(plotter.plot_dataset(table, &prefixes, &matches, &displays)?);
    }

    Ok(figures)
}

/// Run every granularity pass, compare the first two, and persist the last table.
pub fn run(config: &AppConfig) -> Result<RunSummary, AppError> {
    config.validate()?;

    for dir in [&config.paths.dataset_dir, &config.paths.result_dir] {
        create_dir(dir)?;
    }

    println!("Please wait, this will take a while to run!");

    let mut datasets: Vec<DataTable> = Vec::with_capacity(config.granularities_ms.len());
    let mut figures = Vec::new();

    for &granularity_ms in &config.granularities_ms {
        let table = build_dataset(config, granularity_ms)?;
        let (rows, columns) = table.shape();
        info!("Granularity {} ms: {} rows x {} columns", granularity_ms, rows, columns);

        if config.plot.enabled {
            figures.extend(plot_pass(config, &table, granularity_ms)?);
        }

        if config.statistics.describe {
            stats::print_statistics(&table);
        }

        datasets.push(table);
    }

    if config.statistics.latex_comparison {
        match datasets.as_slice() {
            [first, second, ..] => stats::print_latex_table_statistics_two_datasets(first, second),
            _ => warn!("Comparison table needs two granularities, got {}", datasets.len()),
        }
    }

    let passes: Vec<DatasetShape> = datasets
        .iter()
        .map(|t| DatasetShape::new(t.granularity_ms(), t.n_rows(), t.column_names()))
        .collect();

    let output_csv = match datasets.last() {
        Some(table) => {
            let path = config.get_result_path();
            table.write_csv(&path)?;
            Some(path)
        }
        None => None,
    };

    let summary = RunSummary::new(passes, output_csv, figures);
    let summary_path = config.get_summary_path();
    std::fs::write(&summary_path, summary.to_json()?).map_err(|source| AppError::Io {
        path: summary_path.clone(),
        source,
    })?;
    info!("{} (summary at {})", summary.message, summary_path.display());

    println!("The code has run through successfully!");
    Ok(summary)
}
