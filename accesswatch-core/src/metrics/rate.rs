use crate::metrics::error::MetricsError;
use std::time::Duration;

/// Per-second average of a counter over a fixed-size time window.
///
/// The window never changes after construction. The counter only grows until
/// [`RateCounter::reset`] is called, which is how callers roll the window over.
/// There is no internal synchronization: the owning event loop serializes access.
#[derive(Debug, Clone)]
pub struct RateCounter {
    count: f64,
    window: Duration,
}

impl RateCounter {
    pub fn new(window: Duration) -> Result<Self, MetricsError> {
        if window.is_zero() {
            return Err(MetricsError::InvalidWindow);
        }
        Ok(Self { count: 0.0, window })
    }

    /// Adds `value` to the counter. Negative (and NaN) values are rejected
    /// without touching the counter.
    pub fn incr_by(&mut self, value: f64) -> Result<(), MetricsError> {
        if value.is_nan() || value < 0.0 {
            return Err(MetricsError::NegativeIncrement { value });
        }
        self.count += value;
        Ok(())
    }

    pub fn avg_per_sec(&self) -> f64 {
        self.count / self.window.as_secs_f64()
    }

    pub fn reset(&mut self) {
        self.count = 0.0;
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn count(&self) -> f64 {
        self.count
    }
}
