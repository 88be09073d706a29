use std::env;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_INCIDENTAL_WEIGHT, DEFAULT_MAXIMUM_INTERVAL, DEFAULT_REQUEST_RETENTION,
    DEFAULT_WEIGHTS,
};
use crate::logging::LogConfig;
use crate::scheduler::{Parameters, Scheduler, SchedulerError};
use crate::tracker::{TrackerError, WordTracker};

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub scheduler: SchedulerEnvConfig,
}

#[derive(Debug, Clone)]
pub struct SchedulerEnvConfig {
    pub weights: Vec<f64>,
    pub request_retention: f64,
    pub maximum_interval: u32,
    pub incidental_weight: f64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            scheduler: SchedulerEnvConfig {
                weights: env_or_weights("SRS_WEIGHTS", &DEFAULT_WEIGHTS),
                request_retention: env_or_parse("SRS_REQUEST_RETENTION", DEFAULT_REQUEST_RETENTION),
                maximum_interval: env_or_parse("SRS_MAXIMUM_INTERVAL", DEFAULT_MAXIMUM_INTERVAL),
                incidental_weight: env_or_parse("SRS_INCIDENTAL_WEIGHT", DEFAULT_INCIDENTAL_WEIGHT),
            },
        }
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            log_level: self.log_level.clone(),
            enable_file_logs: self.enable_file_logs,
            log_dir: self.log_dir.clone(),
        }
    }

    /// Builds the validated scheduler parameters from the environment values.
    pub fn scheduler_parameters(&self) -> Result<Parameters, SchedulerError> {
        Parameters::new(
            &self.scheduler.weights,
            self.scheduler.request_retention,
            self.scheduler.maximum_interval,
        )
    }

    /// Empty word tracker using the configured parameters and incidental weight.
    pub fn word_tracker(&self) -> Result<WordTracker, TrackerError> {
        let scheduler = Scheduler::new(self.scheduler_parameters()?);
        WordTracker::new(scheduler).with_incidental_weight(self.scheduler.incidental_weight)
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

/// Comma separated float list. A malformed entry discards the whole list.
/// The count is left to `Parameters::new` so a wrong length is reported, not hidden.
pub fn env_or_weights(key: &str, default: &[f64]) -> Vec<f64> {
    match env::var(key) {
        Ok(raw) => match raw
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(weights) => weights,
            Err(_) => {
                tracing::warn!(key, value = %raw, "Failed to parse weights, using default");
                default.to_vec()
            }
        },
        Err(_) => default.to_vec(),
    }
}
