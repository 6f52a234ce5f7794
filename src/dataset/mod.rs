pub mod builder;
pub mod reader;
pub mod table;

pub use builder::DatasetBuilder;
pub use reader::{read_event_source, read_numeric_source};
pub use table::{Column, ColumnValues, DataTable};
