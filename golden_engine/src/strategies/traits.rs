// src/strategies/traits.rs
//! Section extraction capability
//!
//! The sectioner ships extractors for CLI and JSON rules; custom rules name
//! an extractor registered in an [`super::ExtractorRegistry`].

use super::errors::ParseError;
use crate::types::{FeatureSection, PreparedSnapshot};
use golden_rules::ComplianceRule;

/// Pulls one rule's section out of a prepared snapshot
pub trait SectionExtractor: Send + Sync {
    /// Name custom rules use to select this extractor
    fn strategy_name(&self) -> &str;

    /// Extract the section; `Absent` when the feature is not configured
    fn extract(
        &self,
        snapshot: &PreparedSnapshot,
        rule: &ComplianceRule,
    ) -> Result<FeatureSection, ParseError>;

    /// Check a rule's arguments once, when the engine is built
    fn validate_rule(&self, _rule: &ComplianceRule) -> Result<(), String> {
        Ok(())
    }
}
