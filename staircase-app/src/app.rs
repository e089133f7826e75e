use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use staircase_core::Participant;
use staircase_experiment::export::{write_csv, write_json};
use staircase_experiment::{run, Presenter, RunError, RunSummary, TrialLog};
use tracing::{info, warn};

use crate::cli::Cli;
use crate::config::load_config;
use crate::simulate::{ObserverModel, SimulatedObserver};
use crate::terminal::TerminalPresenter;

pub struct App {
    cli: Cli,
}

impl App {
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    pub fn run(self) -> Result<()> {
        // Validated before the terminal is touched.
        let config = load_config(&self.cli.config)?;
        let participant = Participant::new(
            self.cli.participant_id.clone(),
            self.cli.gender.clone(),
            self.cli.age,
        );
        let seed = self.cli.seed.unwrap_or_else(|| rand::rng().random());
        info!(participant = %participant.id, seed, "starting staircase");

        println!("=== CONTRAST STAIRCASE ===");
        println!("Participant: {}", participant.id);
        println!("Seed: {seed}");

        let presenter = self.presenter(seed)?;
        let outcome = run(
            config,
            participant.clone(),
            presenter,
            StdRng::seed_from_u64(seed),
        );

        match outcome {
            Ok(report) => {
                self.save(&participant, &report.log)?;
                print_summary(&report.summary);
                Ok(())
            }
            Err(err) => {
                if let (true, Some(log)) = (self.cli.keep_partial, err.partial_log()) {
                    warn!(trials = log.len(), "saving partial data");
                    self.save(&participant, log)?;
                }
                if let RunError::Aborted { log } = &err {
                    println!("\nExperiment aborted after {} trials.", log.len());
                }
                Err(err.into())
            }
        }
    }

    fn presenter(&self, seed: u64) -> Result<Box<dyn Presenter>> {
        if self.cli.observer.simulate {
            let model = ObserverModel::from(&self.cli.observer);
            info!(?model, "using simulated observer");
            // Offset so observer noise is independent of stimulus scheduling.
            let rng = StdRng::seed_from_u64(seed.wrapping_add(1));
            Ok(Box::new(SimulatedObserver::new(model, rng)))
        } else {
            let terminal = TerminalPresenter::new().context("failed to set up the terminal")?;
            Ok(Box::new(terminal))
        }
    }

    fn save(&self, participant: &Participant, log: &TrialLog) -> Result<()> {
        write_csv(create(&self.cli.output)?, participant, log)
            .with_context(|| format!("failed to write {}", self.cli.output.display()))?;
        println!("Results saved to {}", self.cli.output.display());

        if let Some(path) = &self.cli.json {
            write_json(create(path)?, participant, log)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Results saved to {}", path.display());
        }
        Ok(())
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn print_summary(summary: &RunSummary) {
    let accuracy = if summary.trials > 0 {
        summary.correct as f64 / summary.trials as f64 * 100.0
    } else {
        0.0
    };
    println!("\nExperiment Results:");
    println!(
        "Trials: {}, correct: {:.1}%, timeouts: {}",
        summary.trials, accuracy, summary.timeouts
    );
    println!(
        "Reversals: {}, final contrast: {:.4}",
        summary.reversals, summary.final_contrast
    );
    for point in &summary.reversal_points {
        println!("  trial {:>3}: contrast {:.4}", point.trial, point.contrast);
    }
}
