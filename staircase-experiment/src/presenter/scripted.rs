use std::collections::VecDeque;
use std::time::Duration;

use staircase_core::StimulusDescriptor;

use super::{Presentation, Presenter};
use crate::error::BoxError;

type Script = Box<dyn FnMut(&StimulusDescriptor, f64) -> Presentation + Send>;

/// In-memory presenter that answers from a script and records every call.
///
/// Used by tests and dry runs; it never sleeps.
pub struct ScriptedPresenter {
    script: Script,
    pub presented: Vec<(StimulusDescriptor, f64)>,
    pub timeouts: Vec<Duration>,
    pub waits: Vec<Duration>,
    pub cleanups: usize,
    fail_on_trial: Option<usize>,
}

impl ScriptedPresenter {
    pub fn new(
        script: impl FnMut(&StimulusDescriptor, f64) -> Presentation + Send + 'static,
    ) -> Self {
        Self {
            script: Box::new(script),
            presented: Vec::new(),
            timeouts: Vec::new(),
            waits: Vec::new(),
            cleanups: 0,
            fail_on_trial: None,
        }
    }

    /// Replays fixed presentations, aborting once they run out
    pub fn replay(presentations: impl IntoIterator<Item = Presentation>) -> Self {
        let mut queue: VecDeque<Presentation> = presentations.into_iter().collect();
        Self::new(move |_, _| queue.pop_front().unwrap_or(Presentation::Abort))
    }

    /// Answers so that each trial scores as the next outcome, aborting once
    /// they run out
    pub fn with_outcomes(outcomes: impl IntoIterator<Item = bool>) -> Self {
        let mut queue: VecDeque<bool> = outcomes.into_iter().collect();
        Self::new(move |stim, _| match queue.pop_front() {
            Some(correct) if correct == stim.present => Presentation::yes(450.0),
            Some(_) => Presentation::no(450.0),
            None => Presentation::Abort,
        })
    }

    /// Makes the n-th call to `present` (1-based) fail with an I/O error
    pub fn failing_on(mut self, trial: usize) -> Self {
        self.fail_on_trial = Some(trial);
        self
    }
}

impl Presenter for ScriptedPresenter {
    fn present(
        &mut self,
        stimulus: &StimulusDescriptor,
        contrast: f64,
        timeout: Duration,
    ) -> Result<Presentation, BoxError> {
        self.presented.push((*stimulus, contrast));
        self.timeouts.push(timeout);
        if self.fail_on_trial == Some(self.presented.len()) {
            return Err(Box::new(std::io::Error::other("display lost")));
        }
        Ok((self.script)(stimulus, contrast))
    }

    fn inter_trial_wait(&mut self, duration: Duration) -> Result<(), BoxError> {
        self.waits.push(duration);
        Ok(())
    }

    fn cleanup(&mut self) -> Result<(), BoxError> {
        self.cleanups += 1;
        Ok(())
    }
}

impl std::fmt::Debug for ScriptedPresenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedPresenter")
            .field("presented", &self.presented.len())
            .field("waits", &self.waits.len())
            .field("cleanups", &self.cleanups)
            .finish()
    }
}
