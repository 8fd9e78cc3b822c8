//! Session configuration, read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const SCAN_QUIESCENCE_VAR: &str = "SCANCART_SCAN_QUIESCENCE_MS";
pub const FILTER_QUIESCENCE_VAR: &str = "SCANCART_FILTER_QUIESCENCE_MS";
pub const CATALOG_VAR: &str = "SCANCART_CATALOG";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a whole number of milliseconds, got {value:?}")]
    InvalidDuration { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Quiescence window for scan input.
    pub scan_quiescence: Duration,
    /// Quiescence window for catalog filtering.
    pub filter_quiescence: Duration,
    /// Optional JSON seed file for the in-memory catalog.
    pub catalog_path: Option<PathBuf>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scan_quiescence: Duration::from_millis(1000),
            filter_quiescence: Duration::from_millis(300),
            catalog_path: None,
        }
    }
}

impl ScanConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build a config from any variable source; unset variables keep their
    /// defaults.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = var(SCAN_QUIESCENCE_VAR) {
            config.scan_quiescence = parse_millis(SCAN_QUIESCENCE_VAR, &value)?;
        }
        if let Some(value) = var(FILTER_QUIESCENCE_VAR) {
            config.filter_quiescence = parse_millis(FILTER_QUIESCENCE_VAR, &value)?;
        }
        config.catalog_path = var(CATALOG_VAR)
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Ok(config)
    }
}

fn parse_millis(var: &'static str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::InvalidDuration {
            var,
            value: value.to_string(),
        })
}
