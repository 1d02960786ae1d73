//! Network Check Monitor - Main Entry Point

use alerting::FailureReport;
use anyhow::Context;
use clap::{Parser, Subcommand};
use net_monitor::{evaluate_file, init_logging, run_monitor, MonitorConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

/// Exit code of `evaluate` when the latest batch is critical
const ALERT_EXIT_CODE: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "net-monitor", version, about = "Evaluate network check logs and alert on critical failures")]
struct Cli {
    /// Configuration file (defaults to ./net-monitor.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Collect, evaluate, render, and notify (default)
    Run,
    /// Evaluate the latest batch of a check log and print the result
    Evaluate {
        /// CSV check log
        csv: PathBuf,
        /// Print the evaluation as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match MonitorConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_logging(&config.log_level) {
        eprintln!("Failed to set tracing subscriber: {e}");
        return ExitCode::FAILURE;
    }
    for warning in config.warnings() {
        warn!("{}", warning);
    }

    let result = match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(&config).await,
        Command::Evaluate { csv, json } => evaluate_command(&config, csv, json),
    };

    result.unwrap_or_else(|e| {
        error!("{:#}", e);
        ExitCode::FAILURE
    })
}

async fn run(config: &MonitorConfig) -> anyhow::Result<ExitCode> {
    info!("=== Network Monitor v{} ===", env!("CARGO_PKG_VERSION"));
    let report = run_monitor(config).await?;
    info!(
        "Run complete: status {:?}, alert {}, notification {:?}",
        report.evaluation.status, report.evaluation.alert, report.notification
    );
    Ok(ExitCode::SUCCESS)
}

fn evaluate_command(config: &MonitorConfig, csv: PathBuf, json: bool) -> anyhow::Result<ExitCode> {
    let evaluation = evaluate_file(&csv, config)
        .with_context(|| format!("cannot evaluate '{}'", csv.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
    } else {
        print!("{}", FailureReport::new(&evaluation));
    }

    Ok(if evaluation.alert {
        ExitCode::from(ALERT_EXIT_CODE)
    } else {
        ExitCode::SUCCESS
    })
}
