use crate::conf::{ConfigError, ConfigOverrides, MonitorConfig, load_config, parse_config, resolve_config};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

fn parse(src: &str) -> Result<MonitorConfig, ConfigError> {
    parse_config(src, Path::new("accesswatch.hcl"))
}

#[test]
fn empty_file_yields_defaults() {
    let cfg = parse("").unwrap();

    assert_eq!(cfg, MonitorConfig::default());
    assert_eq!(cfg.file, PathBuf::from("/tmp/access.log"));
    assert_eq!(cfg.stats_period(), Duration::from_secs(10));
    assert_eq!(cfg.alert_period(), Duration::from_secs(120));
    assert_eq!(cfg.top_k, 5);
    assert_eq!(cfg.threshold, 10.0);
    assert_eq!(cfg.queue_capacity, 4096);
    assert_eq!(cfg.poll_interval(), Duration::from_millis(250));
}

#[test]
fn parses_partial_file() {
    let cfg = parse(
        r#"
        file                 = "/var/log/nginx/access.log"
        alert_period_seconds = 60
        threshold            = 2.5
        "#,
    )
    .unwrap();

    assert_eq!(cfg.file, PathBuf::from("/var/log/nginx/access.log"));
    assert_eq!(cfg.alert_period_seconds, 60);
    assert_eq!(cfg.threshold, 2.5);
    assert_eq!(cfg.stats_period_seconds, 10);
}

#[test]
fn rejects_unknown_fields() {
    let err = parse("bogus = 1").unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got {err:?}");
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.hcl");

    let err = load_config(Some(&path)).unwrap_err();

    assert!(matches!(err, ConfigError::ReadFile { path: p, .. } if p == path));
}

#[test]
fn no_path_yields_defaults() {
    assert_eq!(load_config(None).unwrap(), MonitorConfig::default());
}

#[test]
fn overrides_win_over_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("accesswatch.hcl");
    fs::write(&path, "top_k = 3\nthreshold = 50\n").unwrap();

    let overrides = ConfigOverrides {
        threshold: Some(1.0),
        stats_period_secs: Some(2),
        ..Default::default()
    };
    let cfg = resolve_config(Some(&path), &overrides).unwrap();

    assert_eq!(cfg.top_k, 3);
    assert_eq!(cfg.threshold, 1.0);
    assert_eq!(cfg.stats_period_seconds, 2);
}

#[test]
fn resolve_validates_after_overrides() {
    let overrides = ConfigOverrides {
        top_k: Some(0),
        ..Default::default()
    };

    let err = resolve_config(None, &overrides).unwrap_err();

    assert!(matches!(err, ConfigError::Validation { .. }), "got {err:?}");
}

#[test]
fn dump_round_trips_through_hcl() {
    let cfg = MonitorConfig {
        threshold: 12.5,
        ..Default::default()
    };

    let src = hcl::to_string(&cfg).unwrap();

    assert_eq!(parse(&src).unwrap(), cfg);
}
