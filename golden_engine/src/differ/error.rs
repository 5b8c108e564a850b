// src/differ/error.rs
//! Internal diff failures

use std::collections::BTreeMap;

/// Diff could not be completed for one rule; carries enough to reproduce
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InternalError {
    #[error("Ordered alignment needs {cells} cells ({intended} x {actual} lines, max {limit})")]
    AlignmentTooLarge {
        intended: usize,
        actual: usize,
        cells: u64,
        limit: u64,
    },

    #[error("Structured document deeper than {limit} levels at '{path}'")]
    DepthExceeded { path: String, limit: usize },

    #[error("Cannot compare a {intended} section with a {actual} section")]
    SectionMismatch {
        intended: &'static str,
        actual: &'static str,
    },
}

impl InternalError {
    pub fn context(&self) -> BTreeMap<String, String> {
        let mut context = BTreeMap::new();
        match self {
            InternalError::AlignmentTooLarge {
                intended,
                actual,
                cells,
                limit,
            } => {
                context.insert("intended_lines".to_string(), intended.to_string());
                context.insert("actual_lines".to_string(), actual.to_string());
                context.insert("cells".to_string(), cells.to_string());
                context.insert("limit".to_string(), limit.to_string());
            }
            InternalError::DepthExceeded { path, limit } => {
                context.insert("path".to_string(), path.clone());
                context.insert("limit".to_string(), limit.to_string());
            }
            InternalError::SectionMismatch { intended, actual } => {
                context.insert("intended_section".to_string(), intended.to_string());
                context.insert("actual_section".to_string(), actual.to_string());
            }
        }
        context
    }
}
