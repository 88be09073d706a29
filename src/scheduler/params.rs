use serde::Serialize;

use crate::constants::{
    DEFAULT_MAXIMUM_INTERVAL, DEFAULT_REQUEST_RETENTION, DEFAULT_WEIGHTS, WEIGHT_COUNT,
};

use super::SchedulerError;

/// Model weights, target retention and interval cap.
///
/// Validated on construction and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameters {
    weights: [f64; WEIGHT_COUNT],
    request_retention: f64,
    maximum_interval: u32,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS,
            request_retention: DEFAULT_REQUEST_RETENTION,
            maximum_interval: DEFAULT_MAXIMUM_INTERVAL,
        }
    }
}

impl Parameters {
    pub fn new(
        weights: &[f64],
        request_retention: f64,
        maximum_interval: u32,
    ) -> Result<Self, SchedulerError> {
        let weights: [f64; WEIGHT_COUNT] = weights.try_into().map_err(|_| {
            SchedulerError::InvalidParameters(format!(
                "expected {WEIGHT_COUNT} weights, got {}",
                weights.len()
            ))
        })?;

        let params = Self {
            weights,
            request_retention,
            maximum_interval,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), SchedulerError> {
        if let Some(idx) = self.weights.iter().position(|w| !w.is_finite()) {
            return Err(SchedulerError::InvalidParameters(format!(
                "weight w[{idx}] must be finite"
            )));
        }
        if !(self.request_retention > 0.0 && self.request_retention <= 1.0) {
            return Err(SchedulerError::InvalidParameters(
                "request_retention must be in (0,1]".to_string(),
            ));
        }
        if self.maximum_interval == 0 {
            return Err(SchedulerError::InvalidParameters(
                "maximum_interval must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn weights(&self) -> &[f64; WEIGHT_COUNT] {
        &self.weights
    }

    pub fn request_retention(&self) -> f64 {
        self.request_retention
    }

    pub fn maximum_interval(&self) -> u32 {
        self.maximum_interval
    }
}
