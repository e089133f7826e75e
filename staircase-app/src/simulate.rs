use std::time::Duration;

use rand::Rng;
use staircase_core::StimulusDescriptor;
use staircase_experiment::{BoxError, Presentation, Presenter};
use tracing::trace;

use crate::cli::ObserverArgs;

/// Logistic yes/no observer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverModel {
    pub threshold: f64,
    pub slope: f64,
    pub false_alarm: f64,
    pub lapse: f64,
    pub timeout: f64,
}

impl ObserverModel {
    /// Probability of answering "yes"
    pub fn p_yes(&self, present: bool, contrast: f64) -> f64 {
        if !present {
            return self.false_alarm;
        }
        let detect = 1.0 / (1.0 + (-(contrast - self.threshold) / self.slope).exp());
        self.false_alarm + (1.0 - self.false_alarm - self.lapse) * detect
    }
}

impl From<&ObserverArgs> for ObserverModel {
    fn from(args: &ObserverArgs) -> Self {
        Self {
            threshold: args.sim_threshold,
            slope: args.sim_slope,
            false_alarm: args.sim_false_alarm,
            lapse: args.sim_lapse,
            timeout: args.sim_timeout,
        }
    }
}

/// Presenter that answers instantly from an [`ObserverModel`]
pub struct SimulatedObserver<R: Rng> {
    model: ObserverModel,
    rng: R,
}

impl<R: Rng> SimulatedObserver<R> {
    pub fn new(model: ObserverModel, rng: R) -> Self {
        Self { model, rng }
    }
}

impl<R: Rng> Presenter for SimulatedObserver<R> {
    fn present(
        &mut self,
        stimulus: &StimulusDescriptor,
        contrast: f64,
        timeout: Duration,
    ) -> Result<Presentation, BoxError> {
        if self.rng.random::<f64>() < self.model.timeout {
            return Ok(Presentation::TimedOut);
        }
        let yes = self.rng.random::<f64>() < self.model.p_yes(stimulus.present, contrast);
        let limit_ms = timeout.as_secs_f64() * 1000.0;
        let reaction_time_ms = self.rng.random_range(250.0..900.0_f64).min(limit_ms);
        Ok(if yes {
            Presentation::yes(reaction_time_ms)
        } else {
            Presentation::no(reaction_time_ms)
        })
    }

    fn inter_trial_wait(&mut self, duration: Duration) -> Result<(), BoxError> {
        trace!(?duration, "simulated inter-trial wait skipped");
        Ok(())
    }

    fn cleanup(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}
