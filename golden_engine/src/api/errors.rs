//! # Engine Errors

use crate::strategies::StrategyError;
use golden_rules::logging::{codes, Code};

/// Errors that stop an engine from being built or a batch from starting.
///
/// Everything that goes wrong while evaluating a device is reported inside
/// the batch report instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Unknown strategy '{strategy}' used by rule '{feature}' on platform '{platform}'")]
    UnknownStrategy {
        strategy: String,
        feature: String,
        platform: String,
    },

    #[error("Strategy '{strategy}' rejected rule '{feature}': {reason}")]
    StrategyRejected {
        strategy: String,
        feature: String,
        reason: String,
    },

    #[error("Invalid engine configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Batch of {count} devices exceeds the limit of {limit}")]
    TooManyDevices { count: usize, limit: usize },
}

impl EngineError {
    pub fn code(&self) -> Code {
        match self {
            EngineError::UnknownStrategy { .. } | EngineError::StrategyRejected { .. } => {
                codes::rules::UNKNOWN_STRATEGY
            }
            EngineError::InvalidConfig { .. } | EngineError::TooManyDevices { .. } => {
                codes::batch::INVALID_ENGINE_CONFIG
            }
        }
    }
}

impl From<StrategyError> for EngineError {
    fn from(error: StrategyError) -> Self {
        match error {
            StrategyError::UnknownStrategy {
                strategy,
                feature,
                platform,
            } => EngineError::UnknownStrategy {
                strategy,
                feature,
                platform,
            },
            StrategyError::RuleRejected {
                strategy,
                feature,
                reason,
            } => EngineError::StrategyRejected {
                strategy,
                feature,
                reason,
            },
            StrategyError::DuplicateStrategy { name } => EngineError::InvalidConfig {
                reason: format!("strategy '{}' registered twice", name),
            },
        }
    }
}
