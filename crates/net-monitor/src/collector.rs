//! Network check collector

use crate::command::{run_command, CommandError};
use crate::config::{CollectorConfig, CommandSpec};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Collector failures. The log may still hold data from earlier runs.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Collector exited with code {0:?}")]
    ExitStatus(Option<i32>),

    #[error("Collector reported a fatal error: {0}")]
    Fatal(String),
}

/// Result of a successful collection run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectorOutcome {
    /// Non-empty stderr lines the collector emitted
    pub warnings: Vec<String>,
}

/// Appends a fresh batch of check results to the log
#[async_trait]
pub trait Collector: Send + Sync {
    async fn collect(&self) -> Result<CollectorOutcome, CollectorError>;
}

/// Collector run as an external script
pub struct CommandCollector {
    command: CommandSpec,
    fatal_markers: Vec<Vec<String>>,
    timeout: Option<Duration>,
}

impl CommandCollector {
    pub fn new(command: CommandSpec, config: &CollectorConfig) -> Self {
        Self {
            command,
            fatal_markers: config.fatal_markers.clone(),
            timeout: config.timeout_secs.map(Duration::from_secs),
        }
    }

    /// First marker group whose markers all appear in `stderr`
    fn fatal_marker(&self, stderr: &str) -> Option<String> {
        self.fatal_markers
            .iter()
            .find(|group| !group.is_empty() && group.iter().all(|m| stderr.contains(m.as_str())))
            .map(|group| group.join(" ... "))
    }
}

#[async_trait]
impl Collector for CommandCollector {
    async fn collect(&self) -> Result<CollectorOutcome, CollectorError> {
        info!("Running collector: {}", self.command.script.display());
        let output = run_command(
            "Collector",
            &self.command.program,
            &self.command.base_args(),
            self.timeout,
        )
        .await?;

        // A failed CSV write is fatal even when the script exits cleanly
        if let Some(marker) = self.fatal_marker(&output.stderr) {
            return Err(CollectorError::Fatal(marker));
        }
        if !output.success() {
            return Err(CollectorError::ExitStatus(output.code));
        }

        let warnings = output
            .stderr
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();
        Ok(CollectorOutcome { warnings })
    }
}
