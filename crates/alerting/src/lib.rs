//! Alerting
//!
//! Decides whether the latest batch of network checks warrants paging a
//! human, and renders the failures behind that decision.

mod evaluator;
mod report;
mod rules;

pub use evaluator::{evaluate, evaluate_at, BatchStatus, Evaluation, TIMESTAMP_DISPLAY_FORMAT};
pub use report::FailureReport;
pub use rules::AlertRules;
