// src/types/section.rs
//! Extracted feature sections

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The part of a snapshot a rule governs.
///
/// `Absent` means the feature was not found at all, which is different from
/// a feature that exists with no content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum FeatureSection {
    Absent,
    /// CLI lines in snapshot order, indentation preserved
    Lines(Vec<String>),
    Document(Value),
}

impl FeatureSection {
    pub fn is_absent(&self) -> bool {
        matches!(self, FeatureSection::Absent)
    }

    pub fn lines(&self) -> Option<&[String]> {
        match self {
            FeatureSection::Lines(lines) => Some(lines),
            _ => None,
        }
    }

    pub fn document(&self) -> Option<&Value> {
        match self {
            FeatureSection::Document(value) => Some(value),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            FeatureSection::Absent => "absent",
            FeatureSection::Lines(_) => "lines",
            FeatureSection::Document(_) => "document",
        }
    }
}
