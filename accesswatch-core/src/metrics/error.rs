use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MetricsError {
    //-------------------------------------------------------------------------
    // Construction
    //-------------------------------------------------------------------------
    #[error("cannot have a time window of width 0")]
    InvalidWindow,

    #[error("invalid stats period {period:?}: must be greater than zero")]
    InvalidStatPeriod { period: Duration },

    #[error("invalid alert period {period:?}: must be greater than zero")]
    InvalidAlertPeriod { period: Duration },

    #[error("invalid top-k breadth {k}: must be greater than zero")]
    InvalidTopK { k: usize },

    #[error("invalid alert threshold {threshold}: must be a non-negative number")]
    InvalidThreshold { threshold: f64 },

    #[error("invalid queue capacity {capacity}: must be greater than zero")]
    InvalidQueueCapacity { capacity: usize },

    //-------------------------------------------------------------------------
    // Observation
    //-------------------------------------------------------------------------
    #[error("cannot increment by negative number {value}")]
    NegativeIncrement { value: f64 },
}
