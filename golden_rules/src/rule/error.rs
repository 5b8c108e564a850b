// src/rule/error.rs
//! Error types for rule definition, registration and loading

use crate::logging::{codes, Code};

/// Rule definition, registration and loading errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleError {
    /// Malformed rule definition (ValidationError)
    #[error("Invalid rule '{feature}' for platform '{platform}': {reason}")]
    Validation {
        feature: String,
        platform: String,
        reason: String,
    },

    /// Feature registered twice for one platform (ConflictError)
    #[error("Rule '{feature}' is already registered for platform '{platform}'")]
    Conflict { platform: String, feature: String },

    /// Invalid cleaning directive
    #[error("Invalid cleaning directive '{name}' for platform '{platform}': {reason}")]
    InvalidDirective {
        name: String,
        platform: String,
        reason: String,
    },

    #[error("Cannot read rule file '{path}': {reason}")]
    Unreadable { path: String, reason: String },

    #[error("Malformed rule file '{path}': {reason}")]
    Malformed { path: String, reason: String },

    #[error("Rule source '{path}' not found")]
    NotFound { path: String },

    #[error("Rule limit exceeded: {what} ({count} > {limit})")]
    LimitExceeded {
        what: &'static str,
        count: usize,
        limit: usize,
    },

    #[error("{}", format_multiple(.0))]
    Multiple(Vec<RuleError>),
}

impl RuleError {
    pub(crate) fn validation(feature: &str, platform: &str, reason: impl Into<String>) -> Self {
        RuleError::Validation {
            feature: feature.to_string(),
            platform: platform.to_string(),
            reason: reason.into(),
        }
    }

    /// Logging code for this error
    pub fn code(&self) -> Code {
        match self {
            RuleError::Validation { .. } | RuleError::InvalidDirective { .. } => {
                codes::rules::RULE_VALIDATION_FAILED
            }
            RuleError::Conflict { .. } => codes::rules::DUPLICATE_RULE,
            RuleError::Unreadable { .. } | RuleError::NotFound { .. } => {
                codes::rules::RULE_FILE_UNREADABLE
            }
            RuleError::Malformed { .. } => codes::rules::RULE_FILE_MALFORMED,
            RuleError::LimitExceeded { .. } => codes::rules::RULE_LIMIT_EXCEEDED,
            RuleError::Multiple(errors) => errors
                .first()
                .map(RuleError::code)
                .unwrap_or(codes::rules::RULE_VALIDATION_FAILED),
        }
    }

    /// Flatten nested `Multiple` errors
    pub fn into_vec(self) -> Vec<RuleError> {
        match self {
            RuleError::Multiple(errors) => errors.into_iter().flat_map(RuleError::into_vec).collect(),
            other => vec![other],
        }
    }

    /// Combine collected errors; a single error is returned unwrapped
    pub fn from_errors(mut errors: Vec<RuleError>) -> Option<RuleError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(RuleError::Multiple(errors)),
        }
    }
}

fn format_multiple(errors: &[RuleError]) -> String {
    let mut output = format!("{} rule errors:", errors.len());
    for error in errors {
        output.push_str("\n  - ");
        output.push_str(&error.to_string());
    }
    output
}
