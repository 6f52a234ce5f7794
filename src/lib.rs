//! Aligns recorded phone sensor CSVs (accelerometer, gyroscope, magnetometer,
//! activity labels) onto a fixed time grid, prints summary statistics, draws
//! exploratory figures and writes the aligned table back to CSV.

pub mod config;
pub mod dataset;
pub mod error;
pub mod logger;
pub mod pipeline;
pub mod plotter;
pub mod stats;
pub mod types;
pub mod utils;

pub use config::{AppConfig, ConfigManager};
pub use dataset::{DataTable, DatasetBuilder};
pub use error::{AppError, DatasetError, PlotError};
pub use types::RunSummary;
