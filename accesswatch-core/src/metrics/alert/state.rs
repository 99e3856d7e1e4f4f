use crate::metrics::alert::event::{AlertEvent, AlertKind};
use chrono::{DateTime, Utc};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AlertState {
    NotFiring,
    Firing,
}

/// Edge-triggered threshold with hysteresis.
///
/// Enters `Firing` when the average is at or above the threshold and returns
/// to `NotFiring` only once it is strictly below. An event is produced on the
/// transition and never while the state is unchanged.
#[derive(Debug, Clone)]
pub struct ThresholdAlert {
    threshold: f64,
    state: AlertState,
}

impl ThresholdAlert {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            state: AlertState::NotFiring,
        }
    }

    pub fn state(&self) -> AlertState {
        self.state
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn evaluate(&mut self, avg: f64, now: DateTime<Utc>) -> Option<AlertEvent> {
        match self.state {
            AlertState::NotFiring if avg >= self.threshold => {
                self.state = AlertState::Firing;
                Some(AlertEvent {
                    kind: AlertKind::HighTraffic,
                    value: avg,
                    when: now,
                })
            }
            AlertState::Firing if avg < self.threshold => {
                self.state = AlertState::NotFiring;
                Some(AlertEvent {
                    kind: AlertKind::Resolved,
                    value: avg,
                    when: now,
                })
            }
            _ => None,
        }
    }
}
