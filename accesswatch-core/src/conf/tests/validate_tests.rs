use crate::conf::{ConfigError, MonitorConfig, validate_config};
use pretty_assertions::assert_eq;

fn issues(cfg: &MonitorConfig) -> Vec<String> {
    match validate_config(cfg) {
        Ok(()) => Vec::new(),
        Err(ConfigError::Validation { issues }) => issues,
        Err(other) => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn defaults_are_valid() {
    assert!(validate_config(&MonitorConfig::default()).is_ok());
}

#[test]
fn reports_every_violation() {
    let cfg = MonitorConfig {
        stats_period_seconds: 0,
        top_k: 0,
        queue_capacity: 0,
        ..Default::default()
    };

    assert_eq!(
        issues(&cfg),
        vec![
            "invalid stats_period_seconds: 0s (must be between 1s and 86400s)".to_string(),
            "invalid top_k: 0 (must be between 1 and 1000)".to_string(),
            "invalid queue_capacity: 0 (must be between 1 and 1000000)".to_string(),
        ]
    );
}

#[test]
fn rejects_negative_and_nan_threshold() {
    for threshold in [-1.0, f64::NAN] {
        let cfg = MonitorConfig {
            threshold,
            ..Default::default()
        };
        let found = issues(&cfg);
        assert_eq!(found.len(), 1, "threshold {threshold}");
        assert!(found[0].starts_with("invalid threshold"));
    }
}

#[test]
fn zero_threshold_is_allowed() {
    let cfg = MonitorConfig {
        threshold: 0.0,
        ..Default::default()
    };
    assert!(validate_config(&cfg).is_ok());
}

#[test]
fn rejects_empty_file_path() {
    let cfg = MonitorConfig {
        file: "".into(),
        ..Default::default()
    };
    assert_eq!(issues(&cfg), vec!["invalid file: path is empty".to_string()]);
}
