//! Alert rules

use check_log::{CheckRecord, CheckType};
use serde::{Deserialize, Serialize};

/// Which failed checks are critical enough to page a human
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertRules {
    /// Listen port whose inbound check failure is critical (default: 3389, RDP)
    pub critical_inbound_port: u16,
    /// Check types for which any failure is critical (default: outbound TCP and ICMP).
    /// Written the way the check log spells them, e.g. `"Outbound TCP"`.
    #[serde(with = "check_type_names")]
    pub critical_check_types: Vec<CheckType>,
}

impl Default for AlertRules {
    fn default() -> Self {
        Self {
            critical_inbound_port: 3389,
            critical_check_types: vec![CheckType::OutboundTcp, CheckType::OutboundIcmp],
        }
    }
}

impl AlertRules {
    /// Whether a failed record matches either critical criterion.
    ///
    /// A record without a parseable port never matches the inbound rule.
    pub fn is_critical(&self, record: &CheckRecord) -> bool {
        let inbound = record.check_type == CheckType::InboundListenCheck
            && record.target_port == Some(self.critical_inbound_port);
        inbound || self.critical_check_types.contains(&record.check_type)
    }
}

/// Check types as the collector names them in the log
mod check_type_names {
    use check_log::coerce::parse_check_type;
    use check_log::CheckType;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(types: &[CheckType], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(types.iter().map(|t| t.to_string()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<CheckType>, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        Ok(names.iter().map(|name| parse_check_type(name)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(check_type: CheckType) -> CheckRecord {
        CheckRecord::new(None, check_type, false)
    }

    #[test]
    fn test_default_criteria() {
        let rules = AlertRules::default();

        assert!(rules.is_critical(&failed(CheckType::InboundListenCheck).with_port(3389)));
        assert!(!rules.is_critical(&failed(CheckType::InboundListenCheck).with_port(22)));
        assert!(!rules.is_critical(&failed(CheckType::InboundListenCheck)));
        assert!(rules.is_critical(&failed(CheckType::OutboundTcp).with_port(8443)));
        assert!(rules.is_critical(&failed(CheckType::OutboundIcmp)));
        assert!(!rules.is_critical(&failed(CheckType::Other("DNS".to_string())).with_port(3389)));
    }

    #[test]
    fn test_custom_port() {
        let rules = AlertRules {
            critical_inbound_port: 22,
            critical_check_types: vec![CheckType::OutboundTcp],
        };

        assert!(rules.is_critical(&failed(CheckType::InboundListenCheck).with_port(22)));
        assert!(!rules.is_critical(&failed(CheckType::InboundListenCheck).with_port(3389)));
        assert!(!rules.is_critical(&failed(CheckType::OutboundIcmp)));
    }

    #[test]
    fn test_check_types_use_log_spelling() {
        let rules: AlertRules = serde_json::from_str(
            r#"{"critical_check_types": ["Outbound TCP", "InboundListenCheck", "DNS Lookup"]}"#,
        )
        .unwrap();

        assert_eq!(rules.critical_inbound_port, 3389);
        assert_eq!(
            rules.critical_check_types,
            vec![
                CheckType::OutboundTcp,
                CheckType::InboundListenCheck,
                CheckType::Other("DNS Lookup".to_string()),
            ]
        );

        let json = serde_json::to_value(AlertRules::default()).unwrap();
        assert_eq!(
            json["critical_check_types"],
            serde_json::json!(["Outbound TCP", "Outbound ICMP"])
        );
    }
}
