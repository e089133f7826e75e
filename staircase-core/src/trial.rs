use serde::{Deserialize, Serialize};

use crate::response::Response;

/// Recorded result per trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub participant_id: String,
    /// 1-based position in the run
    pub trial: usize,
    /// Contrast shown during the trial, before the staircase moved
    pub contrast_used: f64,
    pub stimulus_present: bool,
    pub response: Response,
    pub correct: bool,
    /// Absent on timeout
    pub reaction_time_ms: Option<f64>,
}
