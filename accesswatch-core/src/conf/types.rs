use crate::metrics::constants::{
    DEFAULT_ALERT_PERIOD, DEFAULT_QUEUE_CAPACITY, DEFAULT_STATS_PERIOD, DEFAULT_THRESHOLD,
    DEFAULT_TOP_K,
};
use crate::metrics::{ManagerParams, StatsSink};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Everything `accesswatch run` needs, as read from an HCL file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorConfig {
    /// Access log to follow.
    #[serde(default = "default_file")]
    pub file: PathBuf,

    /// Stats window, also how often stats are printed.
    #[serde(default = "default_stats_period_seconds")]
    pub stats_period_seconds: u64,

    /// Averaging window of the high-traffic alert.
    #[serde(default = "default_alert_period_seconds")]
    pub alert_period_seconds: u64,

    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Requests per second averaged over the alert period.
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Capacity of each stats input queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(default = "default_poll_interval_milliseconds")]
    pub poll_interval_milliseconds: u64,
}

fn default_file() -> PathBuf {
    PathBuf::from("/tmp/access.log")
}

fn default_stats_period_seconds() -> u64 {
    DEFAULT_STATS_PERIOD.as_secs()
}

fn default_alert_period_seconds() -> u64 {
    DEFAULT_ALERT_PERIOD.as_secs()
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_poll_interval_milliseconds() -> u64 {
    250
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            file: default_file(),
            stats_period_seconds: default_stats_period_seconds(),
            alert_period_seconds: default_alert_period_seconds(),
            top_k: default_top_k(),
            threshold: default_threshold(),
            queue_capacity: default_queue_capacity(),
            poll_interval_milliseconds: default_poll_interval_milliseconds(),
        }
    }
}

impl MonitorConfig {
    pub fn stats_period(&self) -> Duration {
        Duration::from_secs(self.stats_period_seconds)
    }

    pub fn alert_period(&self) -> Duration {
        Duration::from_secs(self.alert_period_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_milliseconds)
    }

    pub fn manager_params(&self, sink: Arc<dyn StatsSink>) -> ManagerParams {
        ManagerParams {
            alert_period: self.alert_period(),
            stats_period: self.stats_period(),
            k: self.top_k,
            threshold: self.threshold,
            queue_capacity: self.queue_capacity,
            sink,
        }
    }

    /// Command-line values win over the file.
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(file) = &overrides.file {
            self.file = file.clone();
        }
        if let Some(secs) = overrides.stats_period_secs {
            self.stats_period_seconds = secs;
        }
        if let Some(secs) = overrides.alert_period_secs {
            self.alert_period_seconds = secs;
        }
        if let Some(k) = overrides.top_k {
            self.top_k = k;
        }
        if let Some(threshold) = overrides.threshold {
            self.threshold = threshold;
        }
        if let Some(capacity) = overrides.queue_capacity {
            self.queue_capacity = capacity;
        }
        if let Some(ms) = overrides.poll_interval_ms {
            self.poll_interval_milliseconds = ms;
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Access log file to follow
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Stats window in seconds
    #[arg(long)]
    pub stats_period_secs: Option<u64>,

    /// Alert window in seconds
    #[arg(long)]
    pub alert_period_secs: Option<u64>,

    /// Number of entries shown per ranking
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// High-traffic threshold in requests per second
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Capacity of each stats input queue
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    /// How often the log file is polled for new lines
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,
}
