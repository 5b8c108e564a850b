//! # Config Sectioner
//!
//! Pulls the section a rule governs out of a prepared snapshot. CLI and JSON
//! rules use the built-in extractors; custom rules are dispatched to the
//! extractor registered under their strategy name.

pub mod cli;
pub mod json;

pub use cli::{extract_blocks, CliSectioner};
pub use json::JsonSectioner;

use crate::strategies::{ExtractorRegistry, ParseError, SectionExtractor};
use crate::types::{FeatureSection, PreparedSnapshot};
use golden_rules::{ComplianceRule, ConfigType};

/// Extract one rule's section from a snapshot
pub fn extract_section(
    snapshot: &PreparedSnapshot,
    rule: &ComplianceRule,
    extractors: &ExtractorRegistry,
) -> Result<FeatureSection, ParseError> {
    match rule.config_type() {
        ConfigType::Ordered | ConfigType::UnorderedSingleLine => CliSectioner.extract(snapshot, rule),
        ConfigType::Json => JsonSectioner.extract(snapshot, rule),
        ConfigType::Custom => {
            let strategy = rule.strategy_name().unwrap_or_default();
            extractors
                .get(strategy)
                .ok_or_else(|| ParseError::UnknownStrategy {
                    strategy: strategy.to_string(),
                })?
                .extract(snapshot, rule)
        }
    }
}
