// src/strategies/registry.rs
//! Extractor registry for custom rules
//!
//! Built before the engine starts and read-only afterwards; workers share
//! it behind an `Arc`.

use super::banner::BannerExtractor;
use super::errors::StrategyError;
use super::traits::SectionExtractor;
use golden_rules::{ConfigType, RuleSet};
use std::collections::HashMap;

/// Named section extractors
pub struct ExtractorRegistry {
    extractors: HashMap<String, Box<dyn SectionExtractor>>,
}

impl std::fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorRegistry")
            .field("strategies", &self.names())
            .finish()
    }
}

impl ExtractorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Registry with the built-in strategies (`banner`)
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .extractors
            .insert(super::banner::BANNER_STRATEGY.to_string(), Box::new(BannerExtractor::new()));
        registry
    }

    pub fn register(&mut self, extractor: Box<dyn SectionExtractor>) -> Result<(), StrategyError> {
        let name = extractor.strategy_name().to_string();
        if self.extractors.contains_key(&name) {
            return Err(StrategyError::DuplicateStrategy { name });
        }

        golden_rules::log_debug!("Extraction strategy registered", "strategy" => &name);
        self.extractors.insert(name, extractor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn SectionExtractor> {
        self.extractors.get(name).map(|e| e.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.extractors.contains_key(name)
    }

    /// Registered strategy names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.extractors.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// Check that every custom rule names a registered extractor that accepts it
    pub fn validate_rule_set(&self, rules: &RuleSet) -> Result<(), StrategyError> {
        for rule in rules.iter() {
            if rule.config_type() != ConfigType::Custom {
                continue;
            }
            let Some(strategy) = rule.strategy_name() else {
                continue;
            };

            let extractor = self.get(strategy).ok_or_else(|| StrategyError::UnknownStrategy {
                strategy: strategy.to_string(),
                feature: rule.feature_name().to_string(),
                platform: rule.platform().to_string(),
            })?;

            extractor
                .validate_rule(rule)
                .map_err(|reason| StrategyError::RuleRejected {
                    strategy: strategy.to_string(),
                    feature: rule.feature_name().to_string(),
                    reason,
                })?;
        }
        Ok(())
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
