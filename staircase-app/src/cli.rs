use std::path::PathBuf;

use clap::{Args, Parser};

/// Adaptive staircase estimate of a contrast detection threshold
#[derive(Parser, Debug)]
#[command(name = "staircase", version, about)]
pub struct Cli {
    /// Experiment parameters as a JSON file
    #[arg(short, long)]
    pub config: PathBuf,

    #[arg(long)]
    pub participant_id: String,

    #[arg(long)]
    pub gender: String,

    #[arg(long)]
    pub age: u32,

    /// Trial dataset destination (CSV)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Also write the dataset as JSON
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Save completed trials even when the run is aborted
    #[arg(long)]
    pub keep_partial: bool,

    /// Seed for stimulus scheduling; drawn at random when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    #[command(flatten)]
    pub observer: ObserverArgs,

    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Write logs here instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Simulated participant used instead of the terminal
#[derive(Args, Debug, Clone)]
pub struct ObserverArgs {
    /// Answer with a simulated observer instead of the keyboard
    #[arg(long)]
    pub simulate: bool,

    /// Contrast at the midpoint of the observer's psychometric curve
    #[arg(long, default_value_t = 0.08, requires = "simulate")]
    pub sim_threshold: f64,

    #[arg(long, default_value_t = 0.02, requires = "simulate")]
    pub sim_slope: f64,

    #[arg(long, default_value_t = 0.05, value_parser = probability, requires = "simulate")]
    pub sim_false_alarm: f64,

    #[arg(long, default_value_t = 0.02, value_parser = probability, requires = "simulate")]
    pub sim_lapse: f64,

    /// Chance of letting a trial time out
    #[arg(long, default_value_t = 0.0, value_parser = probability, requires = "simulate")]
    pub sim_timeout: f64,
}

fn probability(s: &str) -> Result<f64, String> {
    let p: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(format!("{p} is not a probability in [0, 1]"))
    }
}
