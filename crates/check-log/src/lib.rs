//! Check Log
//!
//! Record model, fail-closed coercion, and CSV loading for the network check
//! log written by the external collector.

pub mod coerce;
mod error;
mod reader;
mod record;
pub mod window;

pub use error::LogError;
pub use reader::{read_records, CsvLogSource, LogSource};
pub use record::{CheckRecord, CheckType};
pub use window::{last_days, records_since, Freshness};
