// src/strategies/banner.rs
//! Delimited banner extraction
//!
//! `banner motd ^C` opens a block that runs until the next occurrence of the
//! delimiter, possibly many unindented lines later, so indentation-based
//! sectioning cannot capture it.
//!
//! Recognised arguments: `type` restricts extraction to one banner type
//! (`motd`, `login`, `exec`, ...).

use super::errors::ParseError;
use super::traits::SectionExtractor;
use crate::types::{FeatureSection, PreparedSnapshot};
use golden_rules::ComplianceRule;

pub const BANNER_STRATEGY: &str = "banner";

const CARET_DELIMITER: &str = "^C";

#[derive(Debug, Default, Clone, Copy)]
pub struct BannerExtractor;

impl BannerExtractor {
    pub fn new() -> Self {
        Self
    }

    fn fail(rule: &ComplianceRule, reason: impl Into<String>) -> ParseError {
        ParseError::StrategyFailed {
            strategy: BANNER_STRATEGY.to_string(),
            feature: rule.feature_name().to_string(),
            reason: reason.into(),
        }
    }

    fn opens_banner(line: &str, rule: &ComplianceRule) -> bool {
        if line.starts_with(char::is_whitespace) {
            return false;
        }

        let (keyword, rest) = split_word(line);
        if !keyword.eq_ignore_ascii_case("banner") {
            return false;
        }

        if let Some(wanted) = rule.options().strategy_args.get("type") {
            let (banner_type, _) = split_word(rest);
            if !banner_type.eq_ignore_ascii_case(wanted.trim()) {
                return false;
            }
        }

        rule.line_matcher().map_or(true, |m| m.matches(line))
    }
}

impl SectionExtractor for BannerExtractor {
    fn strategy_name(&self) -> &str {
        BANNER_STRATEGY
    }

    fn extract(
        &self,
        snapshot: &PreparedSnapshot,
        rule: &ComplianceRule,
    ) -> Result<FeatureSection, ParseError> {
        let lines = snapshot.lines().ok_or_else(|| ParseError::DialectMismatch {
            feature: rule.feature_name().to_string(),
            config_type: rule.config_type(),
            content: "structured",
        })?;

        let mut section = Vec::new();
        let mut index = 0;

        while index < lines.len() {
            let line = &lines[index];
            index += 1;
            if !Self::opens_banner(line, rule) {
                continue;
            }

            // banner <type> <delimiter><text...>
            let (_, rest) = split_word(line);
            let (_, rest) = split_word(rest);
            let opening = rest.trim_start();
            let delimiter = delimiter_of(opening)
                .ok_or_else(|| Self::fail(rule, format!("banner line has no delimiter: '{}'", line.trim_end())))?;

            section.push(line.trim_end().to_string());

            let after_open = &opening[delimiter.len()..];
            if after_open.contains(delimiter.as_str()) {
                continue;
            }

            let mut closed = false;
            while index < lines.len() {
                let body = &lines[index];
                index += 1;
                section.push(body.trim_end().to_string());
                if body.contains(delimiter.as_str()) {
                    closed = true;
                    break;
                }
            }

            if !closed {
                return Err(Self::fail(
                    rule,
                    format!("banner opened with '{}' is never closed", delimiter),
                ));
            }
        }

        if section.is_empty() {
            Ok(FeatureSection::Absent)
        } else {
            Ok(FeatureSection::Lines(section))
        }
    }

    fn validate_rule(&self, rule: &ComplianceRule) -> Result<(), String> {
        let unknown: Vec<&str> = rule
            .options()
            .strategy_args
            .keys()
            .map(String::as_str)
            .filter(|key| *key != "type")
            .collect();

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(format!("unsupported banner arguments: {}", unknown.join(", ")))
        }
    }
}

fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(end) => (&text[..end], &text[end..]),
        None => (text, ""),
    }
}

fn delimiter_of(opening: &str) -> Option<String> {
    if opening.starts_with(CARET_DELIMITER) {
        return Some(CARET_DELIMITER.to_string());
    }
    opening.chars().next().map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConfigSnapshot, SnapshotKind};
    use assert_matches::assert_matches;
    use golden_rules::{ConfigType, RuleDefinition};

    fn banner_rule(banner_type: Option<&str>) -> ComplianceRule {
        let mut definition =
            RuleDefinition::new("banner", "cisco_ios", ConfigType::Custom).with_strategy(BANNER_STRATEGY);
        if let Some(t) = banner_type {
            definition = definition.with_strategy_arg("type", t);
        }
        ComplianceRule::from_definition(definition).unwrap()
    }

    fn prepared(text: &str) -> PreparedSnapshot {
        let snapshot = ConfigSnapshot::text("r1", "cisco_ios", SnapshotKind::Actual, text);
        PreparedSnapshot::prepare(&snapshot, None).unwrap()
    }

    #[test]
    fn test_multi_line_caret_banner() {
        let snapshot = prepared(
            "hostname r1\nbanner motd ^C\nAuthorized access only\n  Violators prosecuted\n^C\nline vty 0 4\n",
        );
        let section = BannerExtractor.extract(&snapshot, &banner_rule(None)).unwrap();
        assert_eq!(
            section,
            FeatureSection::Lines(vec![
                "banner motd ^C".into(),
                "Authorized access only".into(),
                "  Violators prosecuted".into(),
                "^C".into(),
            ])
        );
    }

    #[test]
    fn test_single_line_banner_and_type_filter() {
        let snapshot = prepared("banner login #Restricted#\nbanner exec %Welcome%\n");

        let all = BannerExtractor.extract(&snapshot, &banner_rule(None)).unwrap();
        assert_eq!(all.lines().map(<[String]>::len), Some(2));

        let login = BannerExtractor.extract(&snapshot, &banner_rule(Some("login"))).unwrap();
        assert_eq!(login, FeatureSection::Lines(vec!["banner login #Restricted#".into()]));
    }

    #[test]
    fn test_missing_banner_is_absent() {
        let snapshot = prepared("hostname r1\n");
        assert_eq!(
            BannerExtractor.extract(&snapshot, &banner_rule(None)).unwrap(),
            FeatureSection::Absent
        );
    }

    #[test]
    fn test_unterminated_banner_fails() {
        let snapshot = prepared("banner motd ^C\nno end\n");
        assert_matches!(
            BannerExtractor.extract(&snapshot, &banner_rule(None)),
            Err(ParseError::StrategyFailed { .. })
        );
    }

    #[test]
    fn test_unknown_arguments_rejected() {
        let rule = ComplianceRule::from_definition(
            RuleDefinition::new("banner", "cisco_ios", ConfigType::Custom)
                .with_strategy(BANNER_STRATEGY)
                .with_strategy_arg("delimiter", "#"),
        )
        .unwrap();
        assert!(BannerExtractor.validate_rule(&rule).is_err());
        assert!(BannerExtractor.validate_rule(&banner_rule(Some("motd"))).is_ok());
    }
}
