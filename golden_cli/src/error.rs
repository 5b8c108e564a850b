//! CLI errors and process exit status

use crate::manifest::ManifestError;
use golden_engine::{BatchReport, EngineError, ReportError};
use golden_rules::config::runtime::ConfigError;
use golden_rules::RuleError;

/// Process exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Every device evaluated and compliant
    Compliant = 0,
    /// At least one non-compliant rule, no evaluation errors
    NonCompliant = 1,
    /// A device or rule could not be evaluated
    EvaluationErrors = 2,
    /// Bad arguments, configuration, rules or manifest
    UsageError = 3,
}

impl ExitStatus {
    /// Evaluation errors take precedence over non-compliance
    pub fn for_report(report: &BatchReport) -> Self {
        if report.has_errors() {
            ExitStatus::EvaluationErrors
        } else if report.has_non_compliant() {
            ExitStatus::NonCompliant
        } else {
            ExitStatus::Compliant
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("Rule loading failed:\n{0}")]
    Rules(#[from] RuleError),

    #[error("{0}")]
    Manifest(#[from] ManifestError),

    #[error("{0}")]
    Engine(#[from] EngineError),

    #[error("{0}")]
    Report(#[from] ReportError),

    #[error("Logging initialization failed: {reason}")]
    Logging { reason: String },

    #[error("Invalid argument '{argument}': {reason}")]
    InvalidArgument { argument: &'static str, reason: String },
}
