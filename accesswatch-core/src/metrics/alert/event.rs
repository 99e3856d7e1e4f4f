use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    HighTraffic,
    Resolved,
}

impl AlertKind {
    pub fn tag(&self) -> &'static str {
        match self {
            AlertKind::HighTraffic => "ALERT",
            AlertKind::Resolved => "RESOLVED",
        }
    }
}

/// A single alert state transition. Created only when the state flips.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEvent {
    pub kind: AlertKind,
    pub value: f64,
    pub when: DateTime<Utc>,
}

impl fmt::Display for AlertEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let when = self.when.to_rfc3339_opts(SecondsFormat::Secs, true);
        match self.kind {
            AlertKind::HighTraffic => write!(
                f,
                "High traffic generated an alert - hits = {:.2}, triggered at {}",
                self.value, when
            ),
            AlertKind::Resolved => write!(
                f,
                "High traffic alert recovered - hits = {:.2}, resolved at {}",
                self.value, when
            ),
        }
    }
}
