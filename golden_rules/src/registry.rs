// src/registry.rs
//! Rule registry
//!
//! A [`RuleSet`] holds at most one rule per `(platform, feature)` pair along
//! with the cleaning directives of each platform. It is built once through
//! [`RuleSetBuilder`] and read-only afterwards, so it can be shared across
//! worker threads behind an `Arc`.

use crate::cleaning::{CleaningDirective, SnapshotCleaner};
use crate::config::compile_time::rules::MAX_RULES_PER_SET;
use crate::logging::codes;
use crate::rule::{ComplianceRule, ConfigType, RuleDefinition, RuleError};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Registry key; platform is case-folded
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleKey {
    pub platform: String,
    pub feature: String,
}

impl RuleKey {
    pub fn new(platform: &str, feature: &str) -> Self {
        Self {
            platform: platform.trim().to_lowercase(),
            feature: feature.trim().to_string(),
        }
    }
}

/// Immutable rule collection
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: BTreeMap<RuleKey, Arc<ComplianceRule>>,
    cleaners: BTreeMap<String, SnapshotCleaner>,
}

impl RuleSet {
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::new()
    }

    pub fn get(&self, platform: &str, feature: &str) -> Option<&Arc<ComplianceRule>> {
        self.rules.get(&RuleKey::new(platform, feature))
    }

    /// Rules applicable to a platform, ordered by feature name
    pub fn rules_for_platform(&self, platform: &str) -> Vec<Arc<ComplianceRule>> {
        let platform = platform.trim().to_lowercase();
        self.rules
            .iter()
            .filter(|(key, _)| key.platform == platform)
            .map(|(_, rule)| Arc::clone(rule))
            .collect()
    }

    /// Cleaning directives for a platform, if any were registered
    pub fn cleaner_for(&self, platform: &str) -> Option<&SnapshotCleaner> {
        self.cleaners.get(&platform.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ComplianceRule>> {
        self.rules.values()
    }

    /// Distinct platforms with at least one rule
    pub fn platforms(&self) -> Vec<String> {
        let mut platforms: Vec<String> = self.rules.keys().map(|k| k.platform.clone()).collect();
        platforms.dedup();
        platforms
    }

    /// Names of custom extraction strategies referenced by any rule
    pub fn referenced_strategies(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .rules
            .values()
            .filter(|rule| rule.config_type() == ConfigType::Custom)
            .filter_map(|rule| rule.strategy_name().map(str::to_string))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn directive_count(&self) -> usize {
        self.cleaners.values().map(SnapshotCleaner::len).sum()
    }
}

/// Builder that enforces uniqueness and size limits
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    rules: BTreeMap<RuleKey, Arc<ComplianceRule>>,
    cleaners: BTreeMap<String, SnapshotCleaner>,
}

impl RuleSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validated rule; a second rule for the same key is a conflict
    pub fn register(&mut self, rule: ComplianceRule) -> Result<(), RuleError> {
        let key = RuleKey::new(rule.platform(), rule.feature_name());

        if self.rules.contains_key(&key) {
            return Err(RuleError::Conflict {
                platform: rule.platform().to_string(),
                feature: rule.feature_name().to_string(),
            });
        }

        if self.rules.len() >= MAX_RULES_PER_SET {
            return Err(RuleError::LimitExceeded {
                what: "rules per set",
                count: self.rules.len() + 1,
                limit: MAX_RULES_PER_SET,
            });
        }

        crate::log_debug!("Rule registered",
            "platform" => &key.platform,
            "feature" => &key.feature,
            "config_type" => rule.config_type()
        );

        self.rules.insert(key, Arc::new(rule));
        Ok(())
    }

    /// Validate and add a definition
    pub fn register_definition(&mut self, definition: RuleDefinition) -> Result<(), RuleError> {
        let rule = ComplianceRule::from_definition(definition)?;
        self.register(rule)
    }

    pub fn add_directive(&mut self, directive: CleaningDirective) {
        self.cleaners
            .entry(directive.platform().to_lowercase())
            .or_default()
            .push(directive);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn build(self) -> RuleSet {
        crate::log_success!(codes::success::RULE_SET_BUILT, "Rule set built",
            "rules" => self.rules.len(),
            "platforms_with_cleaning" => self.cleaners.len()
        );

        RuleSet {
            rules: self.rules,
            cleaners: self.cleaners,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn ordered(feature: &str, platform: &str) -> RuleDefinition {
        RuleDefinition::new(feature, platform, ConfigType::Ordered).with_anchors([feature])
    }

    #[test]
    fn test_register_and_lookup() {
        let mut builder = RuleSet::builder();
        builder.register_definition(ordered("ntp", "cisco_ios")).unwrap();
        builder.register_definition(ordered("aaa", "cisco_ios")).unwrap();
        builder.register_definition(ordered("ntp", "arista_eos")).unwrap();
        let set = builder.build();

        assert_eq!(set.len(), 3);
        assert!(set.get("CISCO_IOS", "ntp").is_some());
        assert!(set.get("cisco_ios", "snmp").is_none());

        let features: Vec<String> = set
            .rules_for_platform("cisco_ios")
            .iter()
            .map(|r| r.feature_name().to_string())
            .collect();
        assert_eq!(features, vec!["aaa", "ntp"]);
        assert_eq!(set.platforms(), vec!["arista_eos", "cisco_ios"]);
    }

    #[test]
    fn test_duplicate_feature_is_conflict() {
        let mut builder = RuleSet::builder();
        builder.register_definition(ordered("ntp", "cisco_ios")).unwrap();

        assert_matches!(
            builder.register_definition(ordered("ntp", "Cisco_IOS")),
            Err(RuleError::Conflict { feature, .. }) if feature == "ntp"
        );
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_cleaners_are_per_platform() {
        let mut builder = RuleSet::builder();
        builder.add_directive(CleaningDirective::remove("banner", "Cisco_IOS", "^Building").unwrap());
        let set = builder.build();

        assert!(set.cleaner_for("cisco_ios").is_some());
        assert!(set.cleaner_for("arista_eos").is_none());
        assert_eq!(set.directive_count(), 1);
    }

    #[test]
    fn test_referenced_strategies() {
        let mut builder = RuleSet::builder();
        builder
            .register_definition(
                RuleDefinition::new("banner", "cisco_ios", ConfigType::Custom).with_strategy("banner"),
            )
            .unwrap();
        builder.register_definition(ordered("ntp", "cisco_ios")).unwrap();

        assert_eq!(builder.build().referenced_strategies(), vec!["banner"]);
    }
}
