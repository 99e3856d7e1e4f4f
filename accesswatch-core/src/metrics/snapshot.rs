use crate::metrics::topk::TopKEntry;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Everything the manager knew about one stats window, taken right before
/// the counters were reset.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    #[serde(serialize_with = "serialize_secs")]
    pub window: Duration,

    pub req_per_sec: f64,
    pub err_per_sec: f64,

    pub top_sections: Vec<TopKEntry>,
    pub top_status_codes: Vec<TopKEntry>,
    pub top_users: Vec<TopKEntry>,

    /// Observations discarded during the window because an input queue was full.
    pub dropped: u64,

    pub taken_at: DateTime<Utc>,
}

impl StatsSnapshot {
    pub fn is_empty(&self) -> bool {
        self.req_per_sec == 0.0
            && self.err_per_sec == 0.0
            && self.top_sections.is_empty()
            && self.top_status_codes.is_empty()
            && self.top_users.is_empty()
    }
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}
