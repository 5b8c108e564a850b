// src/rule/validation.rs
//! Definition-time validation
//!
//! Every check that can be made without a snapshot happens here, so a
//! [`ComplianceRule`] that exists is always usable by the engine.

use super::error::RuleError;
use super::matcher::LineMatcher;
use super::selector::JsonSelector;
use super::types::{ComplianceRule, ConfigType, MatchConfig, RuleDefinition, RuleOptions};
use crate::config::compile_time::rules::{MAX_FEATURE_NAME_LENGTH, MAX_MATCH_ENTRIES};

pub(crate) fn build_rule(definition: RuleDefinition) -> Result<ComplianceRule, RuleError> {
    let feature = definition.feature.trim().to_string();
    let platform = definition.platform.trim().to_string();

    validate_feature_name(&feature, &platform)?;
    validate_platform(&feature, &platform)?;

    let anchors = definition.all_anchors();
    let entries = anchors.len() + definition.patterns.len();
    if entries > MAX_MATCH_ENTRIES {
        return Err(RuleError::validation(
            &feature,
            &platform,
            format!(
                "{} anchors and patterns exceed the limit of {}",
                entries, MAX_MATCH_ENTRIES
            ),
        ));
    }

    validate_options(&definition, &feature, &platform)?;

    let match_config = match definition.config_type {
        ConfigType::Ordered | ConfigType::UnorderedSingleLine => {
            if definition.selector.is_some() || definition.strategy.is_some() {
                return Err(RuleError::validation(
                    &feature,
                    &platform,
                    "CLI rules take anchors or patterns, not a selector or strategy",
                ));
            }
            if entries == 0 {
                return Err(RuleError::validation(
                    &feature,
                    &platform,
                    "CLI rules need at least one anchor or pattern",
                ));
            }
            MatchConfig::Lines(compile_matcher(&anchors, &definition.patterns, &feature, &platform)?)
        }
        ConfigType::Json => {
            if entries > 0 || definition.strategy.is_some() {
                return Err(RuleError::validation(
                    &feature,
                    &platform,
                    "JSON rules take a selector, not anchors, patterns or a strategy",
                ));
            }
            let raw = definition.selector.as_deref().ok_or_else(|| {
                RuleError::validation(&feature, &platform, "JSON rules need a selector")
            })?;
            let selector = JsonSelector::parse(raw)
                .map_err(|reason| RuleError::validation(&feature, &platform, reason))?;
            MatchConfig::Selector(selector)
        }
        ConfigType::Custom => {
            if definition.selector.is_some() {
                return Err(RuleError::validation(
                    &feature,
                    &platform,
                    "custom rules do not take a selector",
                ));
            }
            let name = definition
                .strategy
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .ok_or_else(|| {
                    RuleError::validation(&feature, &platform, "custom rules need a strategy name")
                })?
                .to_string();
            let matcher = if entries > 0 {
                Some(compile_matcher(&anchors, &definition.patterns, &feature, &platform)?)
            } else {
                None
            };
            MatchConfig::Strategy { name, matcher }
        }
    };

    let mut set_paths = Vec::with_capacity(definition.set_paths.len());
    for raw in &definition.set_paths {
        let selector = JsonSelector::parse(raw).map_err(|reason| {
            RuleError::validation(&feature, &platform, format!("set path: {}", reason))
        })?;
        set_paths.push(selector.to_path());
    }

    let options = RuleOptions {
        ordered: definition.ordered.unwrap_or(true),
        duplicates_significant: definition.duplicates_significant.unwrap_or(true),
        set_paths,
        strategy_args: definition.strategy_args,
    };

    Ok(ComplianceRule {
        feature_name: feature,
        platform,
        config_type: definition.config_type,
        match_config,
        remediation_enabled: definition.remediation,
        options,
        description: definition.description,
    })
}

fn validate_feature_name(feature: &str, platform: &str) -> Result<(), RuleError> {
    if feature.is_empty() {
        return Err(RuleError::validation(feature, platform, "feature name must not be empty"));
    }
    if feature.chars().count() > MAX_FEATURE_NAME_LENGTH {
        return Err(RuleError::validation(
            feature,
            platform,
            format!("feature name exceeds {} characters", MAX_FEATURE_NAME_LENGTH),
        ));
    }
    if let Some(bad) = feature
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ' ')))
    {
        return Err(RuleError::validation(
            feature,
            platform,
            format!("feature name contains invalid character '{}'", bad),
        ));
    }
    Ok(())
}

fn validate_platform(feature: &str, platform: &str) -> Result<(), RuleError> {
    if platform.is_empty() {
        return Err(RuleError::validation(feature, platform, "platform must not be empty"));
    }
    if platform.chars().any(char::is_whitespace) {
        return Err(RuleError::validation(
            feature,
            platform,
            "platform must not contain whitespace",
        ));
    }
    Ok(())
}

fn validate_options(
    definition: &RuleDefinition,
    feature: &str,
    platform: &str,
) -> Result<(), RuleError> {
    let mode = definition.config_type;

    if definition.duplicates_significant.is_some() && mode != ConfigType::UnorderedSingleLine {
        return Err(RuleError::validation(
            feature,
            platform,
            format!("duplicates_significant does not apply to {} rules", mode),
        ));
    }
    if definition.ordered.is_some() && mode != ConfigType::Custom {
        return Err(RuleError::validation(
            feature,
            platform,
            format!("ordered does not apply to {} rules", mode),
        ));
    }
    if !definition.set_paths.is_empty() && mode != ConfigType::Json {
        return Err(RuleError::validation(
            feature,
            platform,
            format!("set_paths does not apply to {} rules", mode),
        ));
    }
    if !definition.strategy_args.is_empty() && mode != ConfigType::Custom {
        return Err(RuleError::validation(
            feature,
            platform,
            format!("strategy_args does not apply to {} rules", mode),
        ));
    }
    Ok(())
}

fn compile_matcher(
    anchors: &[String],
    patterns: &[String],
    feature: &str,
    platform: &str,
) -> Result<LineMatcher, RuleError> {
    LineMatcher::new(anchors, patterns)
        .map_err(|reason| RuleError::validation(feature, platform, reason))
}
