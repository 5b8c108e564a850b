// src/rule/types.rs
//! Rule model types
//!
//! [`RuleDefinition`] is the serialized form found in rule files.
//! [`ComplianceRule`] only exists after validation and is immutable.

use super::error::RuleError;
use super::matcher::LineMatcher;
use super::selector::JsonSelector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Comparison mode of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigType {
    /// CLI block compared line-for-line in sequence
    Ordered,
    /// CLI block compared as a multiset of lines
    #[serde(alias = "unordered")]
    UnorderedSingleLine,
    /// Structured document compared recursively
    Json,
    /// Section extracted by a named strategy
    Custom,
}

impl ConfigType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigType::Ordered => "ordered",
            ConfigType::UnorderedSingleLine => "unordered_single_line",
            ConfigType::Json => "json",
            ConfigType::Custom => "custom",
        }
    }

    /// Whether the rule reads configuration as CLI text
    pub fn is_cli(&self) -> bool {
        matches!(self, ConfigType::Ordered | ConfigType::UnorderedSingleLine)
    }
}

impl fmt::Display for ConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule as written in a rule file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDefinition {
    pub feature: String,
    pub platform: String,
    pub config_type: ConfigType,

    /// Newline-separated anchor lines, merged into `anchors`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_config: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anchors: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,

    #[serde(default)]
    pub remediation: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Unordered rules only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicates_significant: Option<bool>,

    /// Custom rules only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordered: Option<bool>,

    /// JSON rules only: array paths (relative to the selector) compared as sets
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub set_paths: Vec<String>,

    /// Custom rules only
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub strategy_args: BTreeMap<String, String>,
}

impl RuleDefinition {
    pub fn new(feature: impl Into<String>, platform: impl Into<String>, config_type: ConfigType) -> Self {
        Self {
            feature: feature.into(),
            platform: platform.into(),
            config_type,
            match_config: None,
            anchors: Vec::new(),
            patterns: Vec::new(),
            selector: None,
            strategy: None,
            remediation: false,
            description: None,
            duplicates_significant: None,
            ordered: None,
            set_paths: Vec::new(),
            strategy_args: BTreeMap::new(),
        }
    }

    pub fn with_anchors<I, S>(mut self, anchors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.anchors.extend(anchors.into_iter().map(Into::into));
        self
    }

    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }

    pub fn with_strategy_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.strategy_args.insert(key.into(), value.into());
        self
    }

    pub fn with_remediation(mut self, enabled: bool) -> Self {
        self.remediation = enabled;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_duplicates_significant(mut self, significant: bool) -> Self {
        self.duplicates_significant = Some(significant);
        self
    }

    pub fn with_ordered(mut self, ordered: bool) -> Self {
        self.ordered = Some(ordered);
        self
    }

    pub fn with_set_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Anchors from both `match_config` and `anchors`, blank lines dropped
    pub fn all_anchors(&self) -> Vec<String> {
        let from_match_config = self
            .match_config
            .iter()
            .flat_map(|text| text.lines())
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string);

        from_match_config.chain(self.anchors.iter().cloned()).collect()
    }
}

/// Validated feature boundary description
#[derive(Debug, Clone)]
pub enum MatchConfig {
    Lines(LineMatcher),
    Selector(JsonSelector),
    Strategy {
        name: String,
        matcher: Option<LineMatcher>,
    },
}

/// Mode-specific comparison options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOptions {
    pub ordered: bool,
    pub duplicates_significant: bool,
    pub set_paths: Vec<String>,
    pub strategy_args: BTreeMap<String, String>,
}

impl Default for RuleOptions {
    fn default() -> Self {
        Self {
            ordered: true,
            duplicates_significant: true,
            set_paths: Vec::new(),
            strategy_args: BTreeMap::new(),
        }
    }
}

/// Validated, immutable compliance rule
#[derive(Debug, Clone)]
pub struct ComplianceRule {
    pub(crate) feature_name: String,
    pub(crate) platform: String,
    pub(crate) config_type: ConfigType,
    pub(crate) match_config: MatchConfig,
    pub(crate) remediation_enabled: bool,
    pub(crate) options: RuleOptions,
    pub(crate) description: Option<String>,
}

impl ComplianceRule {
    /// Validate a definition into a rule
    pub fn from_definition(definition: RuleDefinition) -> Result<Self, RuleError> {
        super::validation::build_rule(definition)
    }

    pub fn feature_name(&self) -> &str {
        &self.feature_name
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn config_type(&self) -> ConfigType {
        self.config_type
    }

    pub fn match_config(&self) -> &MatchConfig {
        &self.match_config
    }

    pub fn remediation_enabled(&self) -> bool {
        self.remediation_enabled
    }

    pub fn options(&self) -> &RuleOptions {
        &self.options
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Case-insensitive platform match
    pub fn applies_to(&self, platform: &str) -> bool {
        self.platform.eq_ignore_ascii_case(platform.trim())
    }

    /// Whether line order is significant for this rule
    pub fn is_ordered(&self) -> bool {
        match self.config_type {
            ConfigType::Ordered => true,
            ConfigType::UnorderedSingleLine | ConfigType::Json => false,
            ConfigType::Custom => self.options.ordered,
        }
    }

    pub fn line_matcher(&self) -> Option<&LineMatcher> {
        match &self.match_config {
            MatchConfig::Lines(matcher) => Some(matcher),
            MatchConfig::Strategy { matcher, .. } => matcher.as_ref(),
            MatchConfig::Selector(_) => None,
        }
    }

    pub fn selector(&self) -> Option<&JsonSelector> {
        match &self.match_config {
            MatchConfig::Selector(selector) => Some(selector),
            _ => None,
        }
    }

    pub fn strategy_name(&self) -> Option<&str> {
        match &self.match_config {
            MatchConfig::Strategy { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Short description of the match configuration for diagnostics
    pub fn match_summary(&self) -> String {
        match &self.match_config {
            MatchConfig::Lines(matcher) => describe_matcher(matcher),
            MatchConfig::Selector(selector) => format!("selector {}", selector),
            MatchConfig::Strategy { name, matcher } => match matcher {
                Some(matcher) => format!("strategy {} ({})", name, describe_matcher(matcher)),
                None => format!("strategy {}", name),
            },
        }
    }
}

fn describe_matcher(matcher: &LineMatcher) -> String {
    let mut parts: Vec<String> = matcher
        .anchors()
        .iter()
        .map(|a| format!("anchor '{}'", a))
        .collect();
    parts.extend(matcher.patterns().map(|p| format!("pattern /{}/", p)));
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_type_serde_names() {
        let parsed: ConfigType = serde_json::from_str("\"unordered\"").unwrap();
        assert_eq!(parsed, ConfigType::UnorderedSingleLine);
        assert_eq!(
            serde_json::to_string(&ConfigType::UnorderedSingleLine).unwrap(),
            "\"unordered_single_line\""
        );
    }

    #[test]
    fn test_all_anchors_merges_match_config() {
        let mut definition =
            RuleDefinition::new("aaa", "cisco_ios", ConfigType::Ordered).with_anchors(["tacacs"]);
        definition.match_config = Some("aaa\n\nusername\n".to_string());

        assert_eq!(definition.all_anchors(), vec!["aaa", "username", "tacacs"]);
    }

    #[test]
    fn test_applies_to_is_case_insensitive() {
        let rule = ComplianceRule::from_definition(
            RuleDefinition::new("ntp", "Cisco_IOS", ConfigType::Ordered).with_anchors(["ntp"]),
        )
        .unwrap();

        assert!(rule.applies_to("cisco_ios"));
        assert!(rule.applies_to("CISCO_IOS"));
        assert!(!rule.applies_to("arista_eos"));
    }

    #[test]
    fn test_ordering_follows_config_type() {
        let custom = ComplianceRule::from_definition(
            RuleDefinition::new("banner", "cisco_ios", ConfigType::Custom)
                .with_strategy("banner")
                .with_ordered(false),
        )
        .unwrap();
        assert!(!custom.is_ordered());

        let ordered = ComplianceRule::from_definition(
            RuleDefinition::new("ntp", "cisco_ios", ConfigType::Ordered).with_anchors(["ntp"]),
        )
        .unwrap();
        assert!(ordered.is_ordered());
        assert_eq!(ordered.match_summary(), "anchor 'ntp'");
    }

    #[test]
    fn test_definition_rejects_unknown_fields() {
        let result: Result<RuleDefinition, _> = serde_json::from_str(
            r#"{"feature":"ntp","platform":"ios","config_type":"ordered","anchor":["ntp"]}"#,
        );
        assert!(result.is_err());
    }
}
