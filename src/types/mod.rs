pub mod sample;
pub mod options;
pub mod results;

pub use sample::{SensorSample, LabelInterval};
pub use options::{NumericAggregation, EventAggregation, ColumnMatch, PlotDisplay, TimestampUnit};
pub use results::{DatasetShape, RunSummary};
