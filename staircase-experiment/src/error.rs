use thiserror::Error;

use crate::log::TrialLog;

/// Error type presenters use to report collaborator failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be finite, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("min_contrast ({min}) is greater than max_contrast ({max})")]
    InvertedRange { min: f64, max: f64 },

    #[error("initial_contrast ({initial}) lies outside [{min}, {max}]")]
    InitialOutOfRange { initial: f64, min: f64, max: f64 },

    #[error("contrast_step must be positive, got {0}")]
    NonPositiveStep(f64),

    #[error("max_reversals must be at least 1")]
    ZeroReversals,

    #[error("max_response_time_s must be positive, got {0}")]
    NonPositiveResponseWindow(f64),

    #[error("inter_stimulus_interval_s cannot be negative, got {0}")]
    NegativeInterval(f64),
}

/// Fatal outcomes of a run. Both interruption variants keep the trials
/// completed before the run stopped.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("run aborted by participant after {} trials", .log.len())]
    Aborted { log: TrialLog },

    #[error("presenter failed after {} trials", .log.len())]
    Presenter {
        log: TrialLog,
        #[source]
        source: BoxError,
    },
}

impl RunError {
    /// Trials recorded before the run stopped, if it started at all
    pub fn partial_log(&self) -> Option<&TrialLog> {
        match self {
            RunError::Config(_) => None,
            RunError::Aborted { log } | RunError::Presenter { log, .. } => Some(log),
        }
    }

    pub fn into_partial_log(self) -> Option<TrialLog> {
        match self {
            RunError::Config(_) => None,
            RunError::Aborted { log } | RunError::Presenter { log, .. } => Some(log),
        }
    }

    pub fn is_abort(&self) -> bool {
        matches!(self, RunError::Aborted { .. })
    }
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
