use std::iter::FusedIterator;

use rand::Rng;
use serde::Serialize;
use staircase_core::{classify, Participant, Response, TrialRecord};
use tracing::{debug, info, warn};

use crate::config::ExperimentConfig;
use crate::error::{BoxError, ConfigError, RunError};
use crate::log::TrialLog;
use crate::presenter::{Presentation, Presenter};
use crate::scheduler::TrialScheduler;
use crate::staircase::{StaircaseController, StaircaseState};

/// Why a run stopped before reaching its reversal target
#[derive(Debug)]
pub enum Interruption {
    Aborted,
    Presenter(BoxError),
}

/// Contrast shown on a trial that flipped the staircase direction
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReversalPoint {
    pub trial: usize,
    pub contrast: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub trials: usize,
    pub correct: usize,
    pub timeouts: usize,
    pub reversals: u32,
    pub reversal_points: Vec<ReversalPoint>,
    pub final_contrast: f64,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub log: TrialLog,
    pub summary: RunSummary,
}

/// Drives the trial loop and owns all run state.
///
/// The presenter's `cleanup` runs exactly once: when the runner finishes,
/// or when it is dropped (including during a panic).
pub struct ExperimentRunner<P: Presenter, R: Rng> {
    config: ExperimentConfig,
    participant: Participant,
    controller: StaircaseController,
    scheduler: TrialScheduler<R>,
    presenter: P,
    state: StaircaseState,
    log: TrialLog,
    reversal_points: Vec<ReversalPoint>,
    interrupted: bool,
    released: bool,
}

impl<P: Presenter, R: Rng> ExperimentRunner<P, R> {
    /// Validates `config` before anything is shown. On error nothing is
    /// presented, but the presenter is still cleaned up.
    pub fn new(
        config: ExperimentConfig,
        participant: Participant,
        mut presenter: P,
        rng: R,
    ) -> Result<Self, ConfigError> {
        if let Err(e) = config.validate() {
            warn!(error = %e, "invalid configuration, run not started");
            if let Err(cleanup) = presenter.cleanup() {
                warn!(error = %cleanup, "presenter cleanup failed");
            }
            return Err(e);
        }
        let controller = StaircaseController::new(&config);
        let state = controller.initial_state(config.initial_contrast);
        info!(
            participant = %participant.id,
            initial_contrast = config.initial_contrast,
            step = config.contrast_step,
            max_reversals = config.max_reversals,
            "staircase run ready"
        );
        Ok(Self {
            config,
            participant,
            controller,
            scheduler: TrialScheduler::new(rng),
            presenter,
            state,
            log: TrialLog::new(),
            reversal_points: Vec::new(),
            interrupted: false,
            released: false,
        })
    }

    pub fn state(&self) -> &StaircaseState {
        &self.state
    }

    pub fn log(&self) -> &TrialLog {
        &self.log
    }

    pub fn is_finished(&self) -> bool {
        self.interrupted || self.controller.is_finished(&self.state)
    }

    /// Runs one trial. `Ok(None)` once the reversal target has been reached.
    pub fn next_trial(&mut self) -> Result<Option<TrialRecord>, Interruption> {
        if self.is_finished() {
            return Ok(None);
        }

        let stimulus = self.scheduler.next_stimulus();
        let contrast = self.state.contrast;
        let trial = self.log.len() + 1;

        let presentation = self
            .presenter
            .present(&stimulus, contrast, self.config.max_response_time())
            .map_err(|e| self.interrupt(Interruption::Presenter(e)))?;

        let (response, reaction_time_ms) = match presentation {
            Presentation::Answered {
                response: Response::Timeout,
                ..
            }
            | Presentation::TimedOut => (Response::Timeout, None),
            Presentation::Answered {
                response,
                reaction_time_ms,
            } => (response, Some(reaction_time_ms)),
            Presentation::Abort => {
                warn!(trial, completed = self.log.len(), "run aborted");
                return Err(self.interrupt(Interruption::Aborted));
            }
        };

        let correct = classify(stimulus.present, response);
        let record = TrialRecord {
            participant_id: self.participant.id.clone(),
            trial,
            contrast_used: contrast,
            stimulus_present: stimulus.present,
            response,
            correct,
            reaction_time_ms,
        };

        let next = self.controller.update(&self.state, correct);
        if next.reversals > self.state.reversals {
            self.reversal_points.push(ReversalPoint { trial, contrast });
        }
        debug!(
            trial,
            contrast,
            present = stimulus.present,
            ?response,
            correct,
            next_contrast = next.contrast,
            reversals = next.reversals,
            "trial complete"
        );
        self.state = next;
        self.log.append(record.clone());

        if !self.is_finished() {
            self.presenter
                .inter_trial_wait(self.config.inter_stimulus_interval())
                .map_err(|e| self.interrupt(Interruption::Presenter(e)))?;
        }
        Ok(Some(record))
    }

    /// Lazy, fused iterator over the remaining trials
    pub fn trials(&mut self) -> Trials<'_, P, R> {
        Trials { runner: self }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            trials: self.log.len(),
            correct: self.log.correct_count(),
            timeouts: self.log.timeout_count(),
            reversals: self.state.reversals,
            reversal_points: self.reversal_points.clone(),
            final_contrast: self.state.contrast,
        }
    }

    /// Runs every remaining trial, then releases the presenter
    pub fn run(mut self) -> Result<RunReport, RunError> {
        let outcome = loop {
            match self.next_trial() {
                Ok(Some(_)) => {}
                Ok(None) => break Ok(()),
                Err(interruption) => break Err(interruption),
            }
        };
        let report = self.finish();
        match outcome {
            Ok(()) => {
                info!(
                    trials = report.summary.trials,
                    reversals = report.summary.reversals,
                    final_contrast = report.summary.final_contrast,
                    "staircase run complete"
                );
                Ok(report)
            }
            Err(Interruption::Aborted) => Err(RunError::Aborted { log: report.log }),
            Err(Interruption::Presenter(source)) => Err(RunError::Presenter {
                log: report.log,
                source,
            }),
        }
    }

    /// Releases the presenter and hands back whatever was recorded
    pub fn finish(mut self) -> RunReport {
        self.release();
        RunReport {
            summary: self.summary(),
            log: std::mem::take(&mut self.log),
        }
    }

    fn interrupt(&mut self, interruption: Interruption) -> Interruption {
        self.interrupted = true;
        interruption
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.presenter.cleanup() {
            warn!(error = %e, "presenter cleanup failed");
        }
    }
}

impl<P: Presenter, R: Rng> Drop for ExperimentRunner<P, R> {
    fn drop(&mut self) {
        self.release();
    }
}

pub struct Trials<'a, P: Presenter, R: Rng> {
    runner: &'a mut ExperimentRunner<P, R>,
}

impl<P: Presenter, R: Rng> Iterator for Trials<'_, P, R> {
    type Item = Result<TrialRecord, Interruption>;

    fn next(&mut self) -> Option<Self::Item> {
        self.runner.next_trial().transpose()
    }
}

impl<P: Presenter, R: Rng> FusedIterator for Trials<'_, P, R> {}

/// Validates `config`, then runs a whole staircase with `presenter`
pub fn run<P: Presenter, R: Rng>(
    config: ExperimentConfig,
    participant: Participant,
    presenter: P,
    rng: R,
) -> Result<RunReport, RunError> {
    ExperimentRunner::new(config, participant, presenter, rng)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::ScriptedPresenter;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::time::Duration;

    fn config() -> ExperimentConfig {
        ExperimentConfig {
            initial_contrast: 0.20,
            contrast_step: 0.02,
            min_contrast: 0.01,
            max_contrast: 0.50,
            max_reversals: 2,
            max_response_time_s: 1.5,
            inter_stimulus_interval_s: 0.25,
        }
    }

    fn participant() -> Participant {
        Participant::new("P01", "f", 27)
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(99)
    }

    #[test]
    fn stops_on_the_trial_that_reaches_max_reversals() {
        let mut presenter =
            ScriptedPresenter::with_outcomes([true, false, false, true, true, true]);
        let report = run(config(), participant(), &mut presenter, rng()).unwrap();

        assert_eq!(report.log.len(), 4);
        assert_eq!(report.summary.reversals, 2);
        assert_eq!(presenter.presented.len(), 4);
        assert_eq!(presenter.waits, vec![Duration::from_millis(250); 3]);
        assert_eq!(presenter.cleanups, 1);
    }

    #[test]
    fn records_contrast_before_the_update() {
        let mut presenter = ScriptedPresenter::with_outcomes([true, false, false, true]);
        let report = run(config(), participant(), &mut presenter, rng()).unwrap();

        let used: Vec<f64> = report.log.iter().map(|r| r.contrast_used).collect();
        for (got, want) in used.iter().zip([0.20, 0.18, 0.18, 0.20]) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-12);
        }
        for ((stim, shown), record) in presenter.presented.iter().zip(report.log.iter()) {
            assert_eq!(*shown, record.contrast_used);
            assert_eq!(stim.present, record.stimulus_present);
        }
        assert_abs_diff_eq!(report.summary.final_contrast, 0.18, epsilon = 1e-12);
    }

    #[test]
    fn trial_indices_are_one_based_and_sequential() {
        let mut presenter = ScriptedPresenter::with_outcomes([true, false, false, true]);
        let report = run(config(), participant(), &mut presenter, rng()).unwrap();
        let indices: Vec<usize> = report.log.iter().map(|r| r.trial).collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);
        assert!(report.log.iter().all(|r| r.participant_id == "P01"));
    }

    #[test]
    fn reversal_points_use_the_contrast_shown() {
        let mut presenter = ScriptedPresenter::with_outcomes([true, false, false, true]);
        let report = run(config(), participant(), &mut presenter, rng()).unwrap();
        let points = &report.summary.reversal_points;
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].trial, 3);
        assert_abs_diff_eq!(points[0].contrast, 0.18, epsilon = 1e-12);
        assert_eq!(points[1].trial, 4);
        assert_abs_diff_eq!(points[1].contrast, 0.20, epsilon = 1e-12);
    }

    #[test]
    fn passes_the_response_window_to_the_presenter() {
        let mut presenter = ScriptedPresenter::with_outcomes([true, false, false, true]);
        run(config(), participant(), &mut presenter, rng()).unwrap();
        assert!(
            presenter
                .timeouts
                .iter()
                .all(|t| *t == Duration::from_millis(1500))
        );
    }

    #[test]
    fn timeouts_score_incorrect_without_reaction_time() {
        let mut presenter = ScriptedPresenter::replay([Presentation::TimedOut; 2]);
        let err = run(config(), participant(), &mut presenter, rng()).unwrap_err();

        let log = err.partial_log().unwrap();
        assert_eq!(log.len(), 2);
        for record in log {
            assert_eq!(record.response, Response::Timeout);
            assert!(!record.correct);
            assert_eq!(record.reaction_time_ms, None);
        }
        assert_eq!(log.timeout_count(), 2);
    }

    #[test]
    fn abort_keeps_completed_trials_and_cleans_up() {
        let mut presenter = ScriptedPresenter::with_outcomes([true, true]);
        let err = run(config(), participant(), &mut presenter, rng()).unwrap_err();

        assert!(err.is_abort());
        assert_eq!(err.into_partial_log().map(|l| l.len()), Some(2));
        assert_eq!(presenter.presented.len(), 3);
        assert_eq!(presenter.cleanups, 1);
    }

    #[test]
    fn presenter_failure_is_fatal_and_cleans_up() {
        let mut presenter =
            ScriptedPresenter::with_outcomes([true, true, true, true]).failing_on(3);
        let err = run(config(), participant(), &mut presenter, rng()).unwrap_err();

        assert!(matches!(err, RunError::Presenter { .. }));
        assert_eq!(err.partial_log().map(TrialLog::len), Some(2));
        assert_eq!(presenter.cleanups, 1);
    }

    #[test]
    fn invalid_config_never_presents() {
        let mut bad = config();
        bad.contrast_step = 0.0;
        let mut presenter = ScriptedPresenter::with_outcomes([true]);
        let err = run(bad, participant(), &mut presenter, rng()).unwrap_err();

        assert!(matches!(err, RunError::Config(ConfigError::NonPositiveStep(_))));
        assert!(err.partial_log().is_none());
        assert!(presenter.presented.is_empty());
        assert_eq!(presenter.cleanups, 1);
    }

    /// Every uniform draw lands just below 1.0, so no stimulus is ever present
    struct NeverPresent;

    impl rand::RngCore for NeverPresent {
        fn next_u32(&mut self) -> u32 {
            u32::MAX
        }

        fn next_u64(&mut self) -> u64 {
            u64::MAX
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.fill(u8::MAX);
        }
    }

    #[test]
    fn absent_stimulus_timeouts_step_contrast_up() {
        let mut presenter = ScriptedPresenter::new(|stim, _| {
            if stim.present {
                Presentation::yes(300.0)
            } else {
                Presentation::TimedOut
            }
        });
        let mut runner =
            ExperimentRunner::new(config(), participant(), &mut presenter, NeverPresent).unwrap();

        let first = runner.next_trial().unwrap().unwrap();
        assert_abs_diff_eq!(runner.state().contrast, 0.20);
        assert_eq!(runner.state().consecutive_incorrect, 1);
        let second = runner.next_trial().unwrap().unwrap();
        let absent = [first, second];

        for record in &absent {
            assert!(!record.stimulus_present);
            assert_eq!(record.response, Response::Timeout);
            assert!(!record.correct);
            assert_eq!(record.reaction_time_ms, None);
        }
        assert_abs_diff_eq!(absent[0].contrast_used, 0.20);
        assert_abs_diff_eq!(absent[1].contrast_used, 0.20);
        assert_abs_diff_eq!(runner.state().contrast, 0.22, epsilon = 1e-12);
        assert_eq!(runner.state().consecutive_incorrect, 0);
    }

    #[test]
    fn trials_iterator_is_lazy_and_fused() {
        let mut presenter = ScriptedPresenter::with_outcomes([true, true]);
        {
            let mut runner =
                ExperimentRunner::new(config(), participant(), &mut presenter, rng()).unwrap();
            let mut trials = runner.trials();
            assert!(matches!(trials.next(), Some(Ok(_))));
            assert!(matches!(trials.next(), Some(Ok(_))));
            assert!(matches!(trials.next(), Some(Err(Interruption::Aborted))));
            assert!(trials.next().is_none());
            assert!(trials.next().is_none());
            assert_eq!(runner.log().len(), 2);
            assert!(runner.is_finished());
        }
        assert_eq!(presenter.presented.len(), 3);
        assert_eq!(presenter.cleanups, 1);
    }

    #[test]
    fn dropping_a_runner_mid_run_cleans_up_once() {
        let mut presenter = ScriptedPresenter::with_outcomes([true; 10]);
        {
            let mut runner =
                ExperimentRunner::new(config(), participant(), &mut presenter, rng()).unwrap();
            runner.next_trial().unwrap();
        }
        assert_eq!(presenter.cleanups, 1);
    }

    #[test]
    fn finish_returns_partial_report() {
        let mut presenter = ScriptedPresenter::with_outcomes([true; 10]);
        let mut runner =
            ExperimentRunner::new(config(), participant(), &mut presenter, rng()).unwrap();
        runner.next_trial().unwrap();
        runner.next_trial().unwrap();
        let report = runner.finish();
        assert_eq!(report.log.len(), 2);
        assert_eq!(report.summary.correct, 2);
        assert_eq!(presenter.cleanups, 1);
    }
}
