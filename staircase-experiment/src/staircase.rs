use serde::{Deserialize, Serialize};

use crate::config::ExperimentConfig;

/// Incorrect answers in a row needed before contrast goes up
const INCORRECT_RUN_TO_STEP_UP: u32 = 2;

/// Direction of the last contrast adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Increase,
    Decrease,
}

/// Adaptive state carried from one trial to the next
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaircaseState {
    pub contrast: f64,
    /// `None` until the first adjustment
    pub last_direction: Option<Direction>,
    pub reversals: u32,
    pub consecutive_incorrect: u32,
}

/// Steps contrast down after every correct answer and up after two
/// incorrect answers in a row.
///
/// The controller itself is immutable; [`StaircaseController::update`] maps
/// a state and a scored trial to the next state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaircaseController {
    step: f64,
    min: f64,
    max: f64,
    max_reversals: u32,
}

impl StaircaseController {
    pub fn new(config: &ExperimentConfig) -> Self {
        Self {
            step: config.contrast_step,
            min: config.min_contrast,
            max: config.max_contrast,
            max_reversals: config.max_reversals,
        }
    }

    pub fn initial_state(&self, initial_contrast: f64) -> StaircaseState {
        StaircaseState {
            contrast: initial_contrast.clamp(self.min, self.max),
            last_direction: None,
            reversals: 0,
            consecutive_incorrect: 0,
        }
    }

    pub fn update(&self, state: &StaircaseState, correct: bool) -> StaircaseState {
        let mut next = *state;
        if correct {
            next.consecutive_incorrect = 0;
            self.turn(&mut next, Direction::Decrease);
            next.contrast = (state.contrast - self.step).max(self.min);
        } else {
            next.consecutive_incorrect += 1;
            if next.consecutive_incorrect >= INCORRECT_RUN_TO_STEP_UP {
                self.turn(&mut next, Direction::Increase);
                next.contrast = (state.contrast + self.step).min(self.max);
                next.consecutive_incorrect = 0;
            }
        }
        next
    }

    /// True once the state has collected enough reversals to stop
    pub fn is_finished(&self, state: &StaircaseState) -> bool {
        state.reversals >= self.max_reversals
    }

    // The direction is recorded even when clamping leaves the contrast unchanged.
    fn turn(&self, state: &mut StaircaseState, direction: Direction) {
        if matches!(state.last_direction, Some(previous) if previous != direction) {
            state.reversals += 1;
        }
        state.last_direction = Some(direction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn controller() -> StaircaseController {
        StaircaseController::new(&ExperimentConfig {
            initial_contrast: 0.20,
            contrast_step: 0.02,
            min_contrast: 0.01,
            max_contrast: 0.50,
            max_reversals: 2,
            max_response_time_s: 2.0,
            inter_stimulus_interval_s: 0.5,
        })
    }

    fn walk(outcomes: &[bool]) -> Vec<StaircaseState> {
        let c = controller();
        let mut state = c.initial_state(0.20);
        let mut path = vec![state];
        for &correct in outcomes {
            state = c.update(&state, correct);
            path.push(state);
        }
        path
    }

    #[test]
    fn starts_without_direction() {
        let s = controller().initial_state(0.20);
        assert_eq!(s.last_direction, None);
        assert_eq!(s.reversals, 0);
        assert_eq!(s.consecutive_incorrect, 0);
    }

    #[test]
    fn two_correct_then_two_incorrect() {
        let path = walk(&[true, true, false, false]);
        let contrasts: Vec<f64> = path.iter().map(|s| s.contrast).collect();
        for (got, want) in contrasts.iter().zip([0.20, 0.18, 0.16, 0.16, 0.18]) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-12);
        }
        assert_eq!(path[3].consecutive_incorrect, 1);
        assert_eq!(path[3].last_direction, Some(Direction::Decrease));
        assert_eq!(path[4].consecutive_incorrect, 0);
        assert_eq!(path[4].last_direction, Some(Direction::Increase));
        assert_eq!(path[4].reversals, 1);
    }

    #[test]
    fn all_correct_descends_to_floor_without_reversals() {
        let path = walk(&[true; 20]);
        for pair in path.windows(2) {
            let (before, after) = (pair[0], pair[1]);
            if before.contrast > 0.01 {
                assert!(after.contrast < before.contrast);
            } else {
                assert_abs_diff_eq!(after.contrast, 0.01);
            }
            assert_eq!(after.reversals, 0);
        }
        assert_abs_diff_eq!(path.last().unwrap().contrast, 0.01);
    }

    #[test]
    fn single_incorrect_changes_nothing_but_the_counter() {
        let c = controller();
        let s0 = c.update(&c.initial_state(0.20), true);
        let s1 = c.update(&s0, false);
        assert_eq!(s1.contrast, s0.contrast);
        assert_eq!(s1.last_direction, s0.last_direction);
        assert_eq!(s1.reversals, s0.reversals);
        assert_eq!(s1.consecutive_incorrect, 1);
    }

    #[test]
    fn incorrect_then_correct_keeps_going_down_without_reversal() {
        let path = walk(&[true, false, true]);
        assert_eq!(path[3].reversals, 0);
        assert_eq!(path[3].consecutive_incorrect, 0);
        assert_abs_diff_eq!(path[3].contrast, 0.16, epsilon = 1e-12);
    }

    #[test]
    fn first_direction_is_never_a_reversal() {
        assert_eq!(walk(&[false, false])[2].reversals, 0);
        assert_eq!(walk(&[true])[1].reversals, 0);
    }

    #[test]
    fn step_up_happens_exactly_on_second_incorrect() {
        let path = walk(&[false, false, false, false]);
        assert_abs_diff_eq!(path[1].contrast, 0.20);
        assert_abs_diff_eq!(path[2].contrast, 0.22, epsilon = 1e-12);
        assert_abs_diff_eq!(path[3].contrast, 0.22, epsilon = 1e-12);
        assert_abs_diff_eq!(path[4].contrast, 0.24, epsilon = 1e-12);
        assert_eq!(path[4].reversals, 0);
    }

    #[test]
    fn reversal_at_floor_counts_despite_clamping() {
        let c = controller();
        let mut s = c.initial_state(0.01);
        s = c.update(&s, true);
        assert_abs_diff_eq!(s.contrast, 0.01);
        assert_eq!(s.last_direction, Some(Direction::Decrease));

        s = c.update(&s, false);
        s = c.update(&s, false);
        assert_abs_diff_eq!(s.contrast, 0.03, epsilon = 1e-12);
        assert_eq!(s.last_direction, Some(Direction::Increase));
        assert_eq!(s.reversals, 1);
    }

    #[test]
    fn ceiling_clamps_increase() {
        let c = controller();
        let mut s = c.initial_state(0.49);
        s = c.update(&s, false);
        s = c.update(&s, false);
        assert_abs_diff_eq!(s.contrast, 0.50);
        s = c.update(&s, false);
        s = c.update(&s, false);
        assert_abs_diff_eq!(s.contrast, 0.50);
        assert_eq!(s.reversals, 0);
    }

    #[test]
    fn finishes_at_max_reversals() {
        let c = controller();
        let path = walk(&[true, false, false, true]);
        assert!(!c.is_finished(&path[2]));
        assert!(!c.is_finished(&path[3]));
        assert_eq!(path[4].reversals, 2);
        assert!(c.is_finished(&path[4]));
    }
}
