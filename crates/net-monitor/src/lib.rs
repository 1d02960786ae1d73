//! Network Check Monitor
//!
//! Orchestrates one monitoring run: the external collector appends a batch
//! of check results to the CSV log, the latest batch is evaluated, a status
//! graph is rendered, and a human is notified when a critical check failed.

pub mod collector;
pub mod command;
pub mod config;
pub mod notifier;
pub mod pipeline;
pub mod preflight;
pub mod renderer;

use alerting::{evaluate, Evaluation};
use check_log::{CsvLogSource, LogError, LogSource};
use std::path::Path;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub use config::MonitorConfig;
pub use pipeline::{NotificationOutcome, Pipeline, RunReport};
pub use preflight::{Preflight, PreflightError};

/// Initialize logging; `RUST_LOG` overrides `default_level`
pub fn init_logging(default_level: &str) -> Result<(), SetGlobalDefaultError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}

/// Run preflight checks, then one full monitor run
pub async fn run_monitor(config: &MonitorConfig) -> Result<RunReport, PreflightError> {
    Preflight::from_config(config).check()?;
    Ok(Pipeline::from_config(config).run().await)
}

/// Load a check log and evaluate its latest batch, without side effects
pub fn evaluate_file(path: &Path, config: &MonitorConfig) -> Result<Evaluation, LogError> {
    let records = CsvLogSource::new(path).load()?;
    Ok(evaluate(&records, &config.rules))
}
