use crate::conf::error::ConfigError;
use crate::conf::types::{ConfigOverrides, MonitorConfig};
use crate::conf::validate::validate_config;
use std::fs;
use std::path::Path;

/// Reads an HCL config file. Without a path, every field takes its default.
pub fn load_config(path: Option<&Path>) -> Result<MonitorConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(MonitorConfig::default());
    };

    let src = fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    parse_config(&src, path)
}

pub fn parse_config(src: &str, path: &Path) -> Result<MonitorConfig, ConfigError> {
    hcl::from_str(src).map_err(|e| ConfigError::parse(path, e))
}

/// Loads the file, applies command-line overrides, then validates the result.
pub fn resolve_config(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<MonitorConfig, ConfigError> {
    let mut cfg = load_config(path)?;
    cfg.apply(overrides);
    validate_config(&cfg)?;
    Ok(cfg)
}
