pub mod config;
pub mod error;
pub mod export;
pub mod log;
pub mod presenter;
pub mod runner;
pub mod scheduler;
pub mod staircase;

pub use config::ExperimentConfig;
pub use error::{BoxError, ConfigError, ExportError, RunError};
pub use log::TrialLog;
pub use presenter::{Presentation, Presenter, ScriptedPresenter};
pub use runner::{
    run, ExperimentRunner, Interruption, ReversalPoint, RunReport, RunSummary, Trials,
};
pub use scheduler::TrialScheduler;
pub use staircase::{Direction, StaircaseController, StaircaseState};
