use serde::{Deserialize, Serialize};

/// What the participant reported for a trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Response {
    Yes,
    No,
    /// No key was pressed before the response window closed
    Timeout,
}

impl Response {
    /// Numeric code used in the exported dataset
    pub fn code(self) -> i8 {
        match self {
            Response::Yes => 1,
            Response::No => 0,
            Response::Timeout => -1,
        }
    }

    pub fn is_timeout(self) -> bool {
        matches!(self, Response::Timeout)
    }
}
