use serde::{Deserialize, Serialize};

/// Abstract description of what the presenter should draw for one trial.
///
/// Orientation is only set when a stimulus is present. It is cosmetic and
/// never feeds back into scoring or the staircase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StimulusDescriptor {
    pub present: bool,
    pub orientation_rad: Option<f64>,
}

impl StimulusDescriptor {
    pub const ABSENT: Self = Self {
        present: false,
        orientation_rad: None,
    };

    pub fn present(orientation_rad: f64) -> Self {
        Self {
            present: true,
            orientation_rad: Some(orientation_rad),
        }
    }
}
