/// A single time-series data point: a signed Unix-epoch timestamp (of
/// whatever resolution the caller uses — the codec does not interpret it)
/// paired with an IEEE-754 double value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPoint {
    pub timestamp: i64,
    pub value: f64,
}

impl DataPoint {
    /// Creates a new `DataPoint`.
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

impl From<(i64, f64)> for DataPoint {
    fn from((timestamp, value): (i64, f64)) -> Self {
        Self::new(timestamp, value)
    }
}

/// Convenience overload for integer values, widened to `f64` at the
/// boundary. The codec itself only ever sees `f64`.
impl From<(i64, i64)> for DataPoint {
    fn from((timestamp, value): (i64, i64)) -> Self {
        Self::new(timestamp, value as f64)
    }
}
