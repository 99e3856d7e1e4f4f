use crate::conf::error::ConfigError;
use crate::conf::types::MonitorConfig;

#[derive(Debug, Clone)]
pub struct RangeConstraint<T> {
    pub min: T,
    pub max: T,
    pub label: &'static str,
    pub units: Option<&'static str>,
}

pub const STATS_PERIOD_SECONDS: RangeConstraint<u64> = RangeConstraint {
    min: 1,
    max: 24 * 60 * 60,
    label: "stats_period_seconds",
    units: Some("s"),
};

pub const ALERT_PERIOD_SECONDS: RangeConstraint<u64> = RangeConstraint {
    min: 1,
    max: 24 * 60 * 60,
    label: "alert_period_seconds",
    units: Some("s"),
};

pub const TOP_K: RangeConstraint<usize> = RangeConstraint {
    min: 1,
    max: 1_000,
    label: "top_k",
    units: None,
};

pub const THRESHOLD: RangeConstraint<f64> = RangeConstraint {
    min: 0.0,
    max: 1_000_000_000.0,
    label: "threshold",
    units: Some(" req/s"),
};

pub const QUEUE_CAPACITY: RangeConstraint<usize> = RangeConstraint {
    min: 1,
    max: 1_000_000,
    label: "queue_capacity",
    units: None,
};

pub const POLL_INTERVAL_MILLISECONDS: RangeConstraint<u64> = RangeConstraint {
    min: 1,
    max: 60_000,
    label: "poll_interval_milliseconds",
    units: Some("ms"),
};

fn validate_range<T>(value: T, constraint: &RangeConstraint<T>, issues: &mut Vec<String>)
where
    T: Copy + PartialOrd + std::fmt::Display,
{
    // NaN is outside every range.
    if !(constraint.min..=constraint.max).contains(&value) {
        let units = constraint.units.unwrap_or("");
        issues.push(format!(
            "invalid {}: {}{} (must be between {}{} and {}{})",
            constraint.label, value, units, constraint.min, units, constraint.max, units
        ));
    }
}

/// Checks every field and reports all violations at once.
pub fn validate_config(cfg: &MonitorConfig) -> Result<(), ConfigError> {
    let mut issues = Vec::new();

    if cfg.file.as_os_str().is_empty() {
        issues.push("invalid file: path is empty".to_string());
    }

    validate_range(cfg.stats_period_seconds, &STATS_PERIOD_SECONDS, &mut issues);
    validate_range(cfg.alert_period_seconds, &ALERT_PERIOD_SECONDS, &mut issues);
    validate_range(cfg.top_k, &TOP_K, &mut issues);
    validate_range(cfg.threshold, &THRESHOLD, &mut issues);
    validate_range(cfg.queue_capacity, &QUEUE_CAPACITY, &mut issues);
    validate_range(
        cfg.poll_interval_milliseconds,
        &POLL_INTERVAL_MILLISECONDS,
        &mut issues,
    );

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation { issues })
    }
}
