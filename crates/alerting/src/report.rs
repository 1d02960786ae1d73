//! Human-readable failure report

use crate::evaluator::{BatchStatus, Evaluation};
use check_log::CheckRecord;
use std::fmt;

const MAX_CRITICAL_LINES: usize = 10;
const MAX_NON_CRITICAL_LINES: usize = 5;

/// Renders an [`Evaluation`] listing the failures behind the decision.
///
/// Critical failures are listed separately from non-critical ones so a
/// reader can see exactly which checks tripped the alert.
pub struct FailureReport<'a> {
    evaluation: &'a Evaluation,
}

impl<'a> FailureReport<'a> {
    pub fn new(evaluation: &'a Evaluation) -> Self {
        Self { evaluation }
    }

    /// Headline describing the batch status
    pub fn headline(&self) -> String {
        let at = self.evaluation.timestamp_display();
        match self.evaluation.status {
            BatchStatus::NoData => {
                format!("No check data available at {at}; cannot determine status")
            }
            BatchStatus::Healthy => {
                format!("Network status OK: all checks in the latest run ({at}) were successful")
            }
            BatchStatus::Degraded => format!(
                "Network warning: non-critical check(s) failed in the latest run ({at}); no alert triggered"
            ),
            BatchStatus::Critical => {
                format!("ALERT: critical check(s) failed in the latest run ({at})")
            }
        }
    }

    /// One-line summary of a failed check
    pub fn describe(record: &CheckRecord) -> String {
        let name = if record.check_name.is_empty() {
            "N/A"
        } else {
            record.check_name.as_str()
        };
        let host = record.target_host.as_deref().unwrap_or("N/A");
        let port = record
            .target_port
            .map(|p| format!(":{p}"))
            .unwrap_or_default();

        let mut line = format!("Check: {name}, Target: {host}{port}");
        if let Some(details) = &record.details {
            line.push_str(", Details: ");
            line.push_str(details);
        }
        line
    }
}

fn write_failures(
    f: &mut fmt::Formatter<'_>,
    failures: &[CheckRecord],
    limit: usize,
    prefix: &str,
    kind: &str,
) -> fmt::Result {
    for record in failures.iter().take(limit) {
        writeln!(f, "  - {prefix}{}", FailureReport::describe(record))?;
    }
    if failures.len() > limit {
        writeln!(f, "  ... and {} more {kind} failures.", failures.len() - limit)?;
    }
    Ok(())
}

impl fmt::Display for FailureReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.headline())?;
        write_failures(
            f,
            &self.evaluation.critical_failures,
            MAX_CRITICAL_LINES,
            "",
            "critical",
        )?;
        write_failures(
            f,
            &self.evaluation.non_critical_failures,
            MAX_NON_CRITICAL_LINES,
            "[Non-Alerting Failure] ",
            "non-critical",
        )
    }
}
