use std::time::Duration;

pub const DEFAULT_STATS_PERIOD: Duration = Duration::from_secs(10);
pub const DEFAULT_ALERT_PERIOD: Duration = Duration::from_secs(120);
pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_THRESHOLD: f64 = 10.0;
pub const DEFAULT_QUEUE_CAPACITY: usize = 4096;

/// Alert events buffered per subscriber before the oldest are dropped.
pub const ALERT_QUEUE_CAPACITY: usize = 100;
