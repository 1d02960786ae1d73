//! Latest-Batch Alert Evaluator

use crate::rules::AlertRules;
use check_log::CheckRecord;
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Layout used when a batch timestamp is shown to a human
pub const TIMESTAMP_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Overall state of the latest batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BatchStatus {
    /// Nothing to evaluate: no records, or no parseable timestamp
    NoData,
    /// Every check in the batch passed
    Healthy,
    /// Only non-critical checks failed
    Degraded,
    /// At least one critical check failed
    Critical,
}

/// Outcome of evaluating the latest batch
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    /// Whether a human should be notified
    pub alert: bool,
    pub status: BatchStatus,
    /// Timestamp of the latest batch, or the evaluation time for `NoData`
    pub batch_timestamp: NaiveDateTime,
    /// Number of records in the latest batch
    pub batch_size: usize,
    /// Records ignored because their timestamp did not parse
    pub skipped_rows: usize,
    pub critical_failures: Vec<CheckRecord>,
    pub non_critical_failures: Vec<CheckRecord>,
}

impl Evaluation {
    fn no_data(now: NaiveDateTime, skipped_rows: usize) -> Self {
        Self {
            alert: false,
            status: BatchStatus::NoData,
            batch_timestamp: now,
            batch_size: 0,
            skipped_rows,
            critical_failures: Vec::new(),
            non_critical_failures: Vec::new(),
        }
    }

    /// Batch timestamp rendered for reports and notification bodies
    pub fn timestamp_display(&self) -> String {
        self.batch_timestamp.format(TIMESTAMP_DISPLAY_FORMAT).to_string()
    }

    pub fn failure_count(&self) -> usize {
        self.critical_failures.len() + self.non_critical_failures.len()
    }
}

/// Evaluate the latest batch, using the local clock for the no-data timestamp
pub fn evaluate(records: &[CheckRecord], rules: &AlertRules) -> Evaluation {
    evaluate_at(records, rules, Local::now().naive_local())
}

/// Evaluate the latest batch of `records`.
///
/// The batch is every record whose timestamp equals the maximum parsed
/// timestamp exactly. Only failures in that batch are considered, and only
/// those matching `rules` raise an alert. `now` is reported as the batch
/// timestamp when there is nothing to evaluate.
pub fn evaluate_at(records: &[CheckRecord], rules: &AlertRules, now: NaiveDateTime) -> Evaluation {
    let skipped_rows = records.iter().filter(|r| r.timestamp.is_none()).count();
    if skipped_rows > 0 {
        warn!("Ignoring {} records with unparseable timestamps", skipped_rows);
    }

    let Some(latest) = records.iter().filter_map(|r| r.timestamp).max() else {
        warn!("No records with a valid timestamp; cannot determine status");
        return Evaluation::no_data(now, skipped_rows);
    };

    let batch: Vec<&CheckRecord> = records
        .iter()
        .filter(|r| r.timestamp == Some(latest))
        .collect();
    debug!("Latest batch at {} has {} records", latest, batch.len());

    let (critical_failures, non_critical_failures): (Vec<CheckRecord>, Vec<CheckRecord>) = batch
        .iter()
        .filter(|r| !r.success)
        .map(|r| (*r).clone())
        .partition(|r| rules.is_critical(r));

    let status = if !critical_failures.is_empty() {
        BatchStatus::Critical
    } else if !non_critical_failures.is_empty() {
        BatchStatus::Degraded
    } else {
        BatchStatus::Healthy
    };

    let evaluation = Evaluation {
        alert: status == BatchStatus::Critical,
        status,
        batch_timestamp: latest,
        batch_size: batch.len(),
        skipped_rows,
        critical_failures,
        non_critical_failures,
    };
    info!(
        "Evaluated batch {}: {:?} ({} critical, {} non-critical failures)",
        evaluation.timestamp_display(),
        evaluation.status,
        evaluation.critical_failures.len(),
        evaluation.non_critical_failures.len()
    );
    evaluation
}
