// results/error.rs

use golden_rules::logging::{codes, Code};

/// Report rendering and output errors
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Failed to serialize report as {format}: {reason}")]
    Serialization { format: &'static str, reason: String },

    #[error("Failed to parse report: {reason}")]
    Parse { reason: String },

    #[error("Failed to write report to '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ReportError {
    pub fn code(&self) -> Code {
        match self {
            ReportError::Serialization { .. } | ReportError::Parse { .. } => {
                codes::report::REPORT_SERIALIZATION_FAILED
            }
            ReportError::Write { .. } => codes::report::REPORT_WRITE_FAILED,
        }
    }
}
