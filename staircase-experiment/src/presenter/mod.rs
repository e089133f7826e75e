use std::time::Duration;

use staircase_core::{Response, StimulusDescriptor};

use crate::error::BoxError;

pub mod scripted;

pub use scripted::ScriptedPresenter;

/// Result of showing one stimulus
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Presentation {
    Answered {
        response: Response,
        reaction_time_ms: f64,
    },
    /// No answer inside the response window
    TimedOut,
    /// The participant or operator asked to stop the run
    Abort,
}

impl Presentation {
    pub fn yes(reaction_time_ms: f64) -> Self {
        Presentation::Answered {
            response: Response::Yes,
            reaction_time_ms,
        }
    }

    pub fn no(reaction_time_ms: f64) -> Self {
        Presentation::Answered {
            response: Response::No,
            reaction_time_ms,
        }
    }
}

/// Display and input collaborator driven by the runner.
///
/// `present` blocks until an answer arrives or `timeout` elapses. The runner
/// calls `cleanup` exactly once when the run ends, whatever the outcome.
pub trait Presenter {
    fn present(
        &mut self,
        stimulus: &StimulusDescriptor,
        contrast: f64,
        timeout: Duration,
    ) -> Result<Presentation, BoxError>;

    fn inter_trial_wait(&mut self, duration: Duration) -> Result<(), BoxError>;

    fn cleanup(&mut self) -> Result<(), BoxError>;
}

impl<P: Presenter + ?Sized> Presenter for &mut P {
    fn present(
        &mut self,
        stimulus: &StimulusDescriptor,
        contrast: f64,
        timeout: Duration,
    ) -> Result<Presentation, BoxError> {
        (**self).present(stimulus, contrast, timeout)
    }

    fn inter_trial_wait(&mut self, duration: Duration) -> Result<(), BoxError> {
        (**self).inter_trial_wait(duration)
    }

    fn cleanup(&mut self) -> Result<(), BoxError> {
        (**self).cleanup()
    }
}

impl<P: Presenter + ?Sized> Presenter for Box<P> {
    fn present(
        &mut self,
        stimulus: &StimulusDescriptor,
        contrast: f64,
        timeout: Duration,
    ) -> Result<Presentation, BoxError> {
        (**self).present(stimulus, contrast, timeout)
    }

    fn inter_trial_wait(&mut self, duration: Duration) -> Result<(), BoxError> {
        (**self).inter_trial_wait(duration)
    }

    fn cleanup(&mut self) -> Result<(), BoxError> {
        (**self).cleanup()
    }
}
