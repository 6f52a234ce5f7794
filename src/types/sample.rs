/// One row of a numerical sensor file, timestamp already converted to nanoseconds.
#[derive(Clone, Debug, PartialEq)]
pub struct SensorSample {
    pub timestamp: i64,
    pub values: Vec<Option<f64>>,
}

impl SensorSample {
    pub fn new(timestamp: i64, values: Vec<Option<f64>>) -> Self {
        Self { timestamp, values }
    }
}

/// A labeled activity interval from the label file (`label_start` .. `label_end`).
#[derive(Clone, Debug, PartialEq)]
pub struct LabelInterval {
    pub start: i64,
    pub end: i64,
    pub label: String,
}

impl LabelInterval {
    pub fn new(start: i64, end: i64, label: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label: label.into(),
        }
    }

    pub fn duration_ns(&self) -> i64 {
        self.end - self.start
    }
}
