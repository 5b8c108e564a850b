// src/sectioner/json.rs
//! Selector-based sectioning for structured configuration

use crate::strategies::{ParseError, SectionExtractor};
use crate::types::{FeatureSection, PreparedSnapshot};
use golden_rules::ComplianceRule;

/// Extractor for JSON rules
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSectioner;

impl SectionExtractor for JsonSectioner {
    fn strategy_name(&self) -> &str {
        "json"
    }

    fn extract(
        &self,
        snapshot: &PreparedSnapshot,
        rule: &ComplianceRule,
    ) -> Result<FeatureSection, ParseError> {
        let Some(selector) = rule.selector() else {
            return Ok(FeatureSection::Absent);
        };

        let document = snapshot.document().map_err(|reason| ParseError::InvalidJson {
            feature: rule.feature_name().to_string(),
            reason,
        })?;

        Ok(selector
            .select(document)
            .map(|value| FeatureSection::Document(value.clone()))
            .unwrap_or(FeatureSection::Absent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConfigSnapshot, SnapshotKind};
    use assert_matches::assert_matches;
    use golden_rules::{ConfigType, RuleDefinition};
    use serde_json::json;

    fn rule(selector: &str) -> ComplianceRule {
        ComplianceRule::from_definition(
            RuleDefinition::new("snmp", "openconfig", ConfigType::Json).with_selector(selector),
        )
        .unwrap()
    }

    #[test]
    fn test_selector_on_structured_snapshot() {
        let snapshot = ConfigSnapshot::structured(
            "r1",
            "openconfig",
            SnapshotKind::Intended,
            json!({"snmp": {"community": "public"}}),
        );
        let prepared = PreparedSnapshot::prepare(&snapshot, None).unwrap();

        assert_eq!(
            JsonSectioner.extract(&prepared, &rule("$.snmp")).unwrap(),
            FeatureSection::Document(json!({"community": "public"}))
        );
        assert_eq!(
            JsonSectioner.extract(&prepared, &rule("$.ntp")).unwrap(),
            FeatureSection::Absent
        );
    }

    #[test]
    fn test_text_snapshot_is_parsed() {
        let snapshot = ConfigSnapshot::text("r1", "openconfig", SnapshotKind::Actual, r#"{"snmp": {}}"#);
        let prepared = PreparedSnapshot::prepare(&snapshot, None).unwrap();
        assert_eq!(
            JsonSectioner.extract(&prepared, &rule("snmp")).unwrap(),
            FeatureSection::Document(json!({}))
        );
    }

    #[test]
    fn test_unparseable_text_is_parse_error() {
        let snapshot = ConfigSnapshot::text("r1", "openconfig", SnapshotKind::Actual, "snmp-server community x");
        let prepared = PreparedSnapshot::prepare(&snapshot, None).unwrap();
        assert_matches!(
            JsonSectioner.extract(&prepared, &rule("snmp")),
            Err(ParseError::InvalidJson { .. })
        );
    }
}
