//! History window and data freshness

use crate::record::CheckRecord;
use chrono::{Duration as ChronoDuration, NaiveDateTime};
use std::time::{Duration, SystemTime};

/// Records with a parsed timestamp at or after `cutoff`
pub fn records_since(records: &[CheckRecord], cutoff: NaiveDateTime) -> Vec<&CheckRecord> {
    records
        .iter()
        .filter(|r| r.timestamp.is_some_and(|ts| ts >= cutoff))
        .collect()
}

/// Records from the last `days` days relative to `now`
pub fn last_days(records: &[CheckRecord], days: u32, now: NaiveDateTime) -> Vec<&CheckRecord> {
    records_since(records, now - ChronoDuration::days(i64::from(days)))
}

/// Age of the log relative to the staleness threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Written within the threshold
    Fresh { age: Duration },
    /// Older than the threshold; the last collector run probably failed to write
    Stale { age: Duration },
    /// Modification time unavailable
    Unknown,
}

impl Freshness {
    /// Assess a log's last write time against `threshold`
    pub fn assess(modified: Option<SystemTime>, now: SystemTime, threshold: Duration) -> Self {
        let Some(modified) = modified else {
            return Freshness::Unknown;
        };
        // A write time in the future (clock skew) counts as just written
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age > threshold {
            Freshness::Stale { age }
        } else {
            Freshness::Fresh { age }
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Freshness::Stale { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::parse_timestamp;
    use crate::record::CheckType;

    fn at(ts: &str) -> CheckRecord {
        CheckRecord::new(parse_timestamp(ts), CheckType::OutboundTcp, true)
    }

    #[test]
    fn test_last_days_window() {
        let records = vec![
            at("2025-03-10 12:00:00"),
            at("2025-03-12 12:00:00"),
            at("2025-03-14 08:00:00"),
            CheckRecord::new(None, CheckType::OutboundTcp, true),
        ];
        let now = parse_timestamp("2025-03-14 12:00:00").unwrap();

        let window = last_days(&records, 3, now);
        assert_eq!(window.len(), 2);
        assert!(window.iter().all(|r| r.timestamp.is_some()));
    }

    #[test]
    fn test_cutoff_is_inclusive() {
        let records = vec![at("2025-03-11 12:00:00")];
        let cutoff = parse_timestamp("2025-03-11 12:00:00").unwrap();
        assert_eq!(records_since(&records, cutoff).len(), 1);
    }

    #[test]
    fn test_freshness() {
        let now = SystemTime::now();
        let threshold = Duration::from_secs(300);

        assert!(matches!(
            Freshness::assess(Some(now - Duration::from_secs(60)), now, threshold),
            Freshness::Fresh { .. }
        ));
        assert!(Freshness::assess(Some(now - Duration::from_secs(900)), now, threshold).is_stale());
        assert_eq!(Freshness::assess(None, now, threshold), Freshness::Unknown);
        assert!(!Freshness::assess(Some(now + Duration::from_secs(30)), now, threshold).is_stale());
    }
}
