//! Application-level configuration loading: match defaults, transition
//! timeout and benchmark thresholds.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::analytics::benchmark::BenchmarkThresholds;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "MATCH_TRACKER_CONFIG_PATH";
/// Regulation length of a senior match.
pub const DEFAULT_MATCH_MINUTES: u32 = 70;
const DEFAULT_TRANSITION_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Duration given to fixtures created without one.
    pub default_match_minutes: u32,
    /// Upper bound on the persistence work of a single match transition.
    pub transition_timeout: Duration,
    /// Flag thresholds of the benchmark comparison.
    pub benchmarks: BenchmarkThresholds,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        default_match_minutes = app_config.default_match_minutes,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON document; absent keys keep their defaults.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    default_match_minutes: u32,
    transition_timeout_secs: u64,
    benchmarks: BenchmarkThresholds,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            default_match_minutes: DEFAULT_MATCH_MINUTES,
            transition_timeout_secs: DEFAULT_TRANSITION_TIMEOUT_SECS,
            benchmarks: BenchmarkThresholds::default(),
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            default_match_minutes: value.default_match_minutes.max(1),
            transition_timeout: Duration::from_secs(value.transition_timeout_secs),
            benchmarks: value.benchmarks,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_keeps_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.default_match_minutes, 70);
        assert_eq!(config.transition_timeout, Duration::from_secs(5));
    }

    #[test]
    fn partial_benchmark_thresholds_override_only_given_keys() {
        let config = AppConfig::from_json(
            r#"{"defaultMatchMinutes": 60, "benchmarks": {"wideExcess": 4}}"#,
        )
        .unwrap();
        assert_eq!(config.default_match_minutes, 60);
        assert_eq!(config.benchmarks.wide_excess, 4);
        assert_eq!(
            config.benchmarks.restart_swing,
            BenchmarkThresholds::default().restart_swing
        );
    }

    #[test]
    fn zero_duration_is_clamped() {
        let config = AppConfig::from_json(r#"{"defaultMatchMinutes": 0}"#).unwrap();
        assert_eq!(config.default_match_minutes, 1);
    }
}
