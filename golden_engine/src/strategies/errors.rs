// src/strategies/errors.rs
//! Error types for section extraction

use golden_rules::ConfigType;
use std::collections::BTreeMap;

/// Per-rule extraction failure; the rest of the device keeps evaluating
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("Snapshot is not valid JSON for '{feature}': {reason}")]
    InvalidJson { feature: String, reason: String },

    #[error("Rule '{feature}' ({config_type}) cannot read a {content} snapshot")]
    DialectMismatch {
        feature: String,
        config_type: ConfigType,
        content: &'static str,
    },

    #[error("Strategy '{strategy}' failed for '{feature}': {reason}")]
    StrategyFailed {
        strategy: String,
        feature: String,
        reason: String,
    },

    #[error("No extractor registered for strategy '{strategy}'")]
    UnknownStrategy { strategy: String },
}

impl ParseError {
    /// Fields that identify the failure in a report
    pub fn context(&self) -> BTreeMap<String, String> {
        let mut context = BTreeMap::new();
        match self {
            ParseError::InvalidJson { reason, .. } => {
                context.insert("reason".to_string(), reason.clone());
            }
            ParseError::DialectMismatch { content, .. } => {
                context.insert("snapshot_content".to_string(), content.to_string());
            }
            ParseError::StrategyFailed {
                strategy, reason, ..
            } => {
                context.insert("strategy".to_string(), strategy.clone());
                context.insert("reason".to_string(), reason.clone());
            }
            ParseError::UnknownStrategy { strategy } => {
                context.insert("strategy".to_string(), strategy.clone());
            }
        }
        context
    }
}

/// Extractor registration and rule compatibility errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StrategyError {
    #[error("Strategy '{name}' is already registered")]
    DuplicateStrategy { name: String },

    #[error("Unknown strategy '{strategy}' used by rule '{feature}' on platform '{platform}'")]
    UnknownStrategy {
        strategy: String,
        feature: String,
        platform: String,
    },

    #[error("Strategy '{strategy}' rejected rule '{feature}': {reason}")]
    RuleRejected {
        strategy: String,
        feature: String,
        reason: String,
    },
}
