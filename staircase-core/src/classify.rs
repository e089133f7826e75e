use crate::response::Response;

/// Scores a trial: "yes" on a present stimulus or "no" on an absent one.
///
/// A timeout is always incorrect, including on stimulus-absent trials where
/// the participant did not report anything.
pub fn classify(stimulus_present: bool, response: Response) -> bool {
    matches!(
        (stimulus_present, response),
        (true, Response::Yes) | (false, Response::No)
    )
}
