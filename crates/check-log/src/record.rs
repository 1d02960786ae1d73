//! Check Record Model

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a network check
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckType {
    /// TCP connect to a remote host
    OutboundTcp,
    /// ICMP echo to a remote host
    OutboundIcmp,
    /// Local port listening check
    InboundListenCheck,
    /// Any other category, passed through unexamined
    Other(String),
}

impl fmt::Display for CheckType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckType::OutboundTcp => f.write_str("Outbound TCP"),
            CheckType::OutboundIcmp => f.write_str("Outbound ICMP"),
            CheckType::InboundListenCheck => f.write_str("Inbound Listen Check"),
            CheckType::Other(raw) => f.write_str(raw),
        }
    }
}

/// One row of the network check log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRecord {
    /// Time of the check run; `None` when the logged value was unparseable
    pub timestamp: Option<NaiveDateTime>,
    pub check_type: CheckType,
    pub check_name: String,
    pub target_host: Option<String>,
    pub target_port: Option<u16>,
    /// Fail-closed: anything not clearly a pass is `false`
    pub success: bool,
    pub response_time_ms: Option<f64>,
    pub details: Option<String>,
}

impl CheckRecord {
    /// Create a record with only the fields the evaluator always needs
    pub fn new(timestamp: Option<NaiveDateTime>, check_type: CheckType, success: bool) -> Self {
        Self {
            timestamp,
            check_type,
            check_name: String::new(),
            target_host: None,
            target_port: None,
            success,
            response_time_ms: None,
            details: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.check_name = name.into();
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.target_host = Some(host.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.target_port = Some(port);
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}
