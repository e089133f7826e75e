use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Staircase and timing parameters, fixed for the whole run.
///
/// Every field is required when deserializing; there are no defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExperimentConfig {
    pub initial_contrast: f64,
    pub contrast_step: f64,
    pub min_contrast: f64,
    pub max_contrast: f64,
    /// The run ends on the trial that produces this many reversals
    pub max_reversals: u32,
    pub max_response_time_s: f64,
    pub inter_stimulus_interval_s: f64,
}

impl ExperimentConfig {
    /// Checks every invariant the staircase relies on.
    ///
    /// Called once before the first trial; a run never starts on an invalid
    /// configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let numbers = [
            ("initial_contrast", self.initial_contrast),
            ("contrast_step", self.contrast_step),
            ("min_contrast", self.min_contrast),
            ("max_contrast", self.max_contrast),
            ("max_response_time_s", self.max_response_time_s),
            ("inter_stimulus_interval_s", self.inter_stimulus_interval_s),
        ];
        if let Some((field, value)) = numbers.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::NotFinite {
                field: *field,
                value: *value,
            });
        }
        if self.min_contrast > self.max_contrast {
            return Err(ConfigError::InvertedRange {
                min: self.min_contrast,
                max: self.max_contrast,
            });
        }
        if !(self.min_contrast..=self.max_contrast).contains(&self.initial_contrast) {
            return Err(ConfigError::InitialOutOfRange {
                initial: self.initial_contrast,
                min: self.min_contrast,
                max: self.max_contrast,
            });
        }
        if self.contrast_step <= 0.0 {
            return Err(ConfigError::NonPositiveStep(self.contrast_step));
        }
        if self.max_reversals == 0 {
            return Err(ConfigError::ZeroReversals);
        }
        if self.max_response_time_s <= 0.0 {
            return Err(ConfigError::NonPositiveResponseWindow(self.max_response_time_s));
        }
        if self.inter_stimulus_interval_s < 0.0 {
            return Err(ConfigError::NegativeInterval(self.inter_stimulus_interval_s));
        }
        Ok(())
    }

    pub fn max_response_time(&self) -> Duration {
        Duration::from_secs_f64(self.max_response_time_s)
    }

    pub fn inter_stimulus_interval(&self) -> Duration {
        Duration::from_secs_f64(self.inter_stimulus_interval_s)
    }
}
