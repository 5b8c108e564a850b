//! # Differ
//!
//! Compares an intended and an actual [`FeatureSection`] under a rule's
//! mode. Line sections get an ordered (LCS) or unordered (multiset) diff;
//! document sections get a structural diff keyed by path.

pub mod error;
pub mod json;
pub mod lines;

pub use error::InternalError;
pub use json::{diff_documents, FieldDiff, ROOT_PATH};
pub use lines::{key_lines, ordered_diff, unordered_diff, LineDiff};

use crate::results::{DiffSet, MisorderedLine};
use crate::types::FeatureSection;
use golden_rules::ComplianceRule;

/// Result of one comparison
#[derive(Debug, Clone, PartialEq)]
pub struct DiffOutcome {
    pub missing: DiffSet,
    pub extra: DiffSet,
    pub misordered: Vec<MisorderedLine>,
}

impl DiffOutcome {
    pub fn is_compliant(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty() && self.misordered.is_empty()
    }
}

impl From<LineDiff> for DiffOutcome {
    fn from(diff: LineDiff) -> Self {
        Self {
            missing: DiffSet::Lines(diff.missing),
            extra: DiffSet::Lines(diff.extra),
            misordered: diff.misordered,
        }
    }
}

impl From<FieldDiff> for DiffOutcome {
    fn from(diff: FieldDiff) -> Self {
        Self {
            missing: DiffSet::Fields(diff.missing),
            extra: DiffSet::Fields(diff.extra),
            misordered: Vec::new(),
        }
    }
}

/// Compare two sections extracted for `rule`
pub fn diff_sections(
    intended: &FeatureSection,
    actual: &FeatureSection,
    rule: &ComplianceRule,
) -> Result<DiffOutcome, InternalError> {
    use FeatureSection::{Absent, Document, Lines};

    match (intended, actual) {
        (Document(_), Lines(_)) | (Lines(_), Document(_)) => Err(InternalError::SectionMismatch {
            intended: intended.kind_name(),
            actual: actual.kind_name(),
        }),
        (Document(_), _) | (_, Document(_)) => {
            let base = rule.selector().map(|s| s.to_path()).unwrap_or_default();
            let diff = diff_documents(
                intended.document(),
                actual.document(),
                &base,
                &rule.options().set_paths,
            )?;
            Ok(diff.into())
        }
        (Absent, Absent) if rule.config_type() == golden_rules::ConfigType::Json => {
            Ok(FieldDiff::default().into())
        }
        _ => {
            let intended_lines = intended.lines().unwrap_or_default();
            let actual_lines = actual.lines().unwrap_or_default();
            let diff = if rule.is_ordered() {
                ordered_diff(intended_lines, actual_lines)?
            } else {
                unordered_diff(
                    intended_lines,
                    actual_lines,
                    rule.options().duplicates_significant,
                )
            };
            Ok(diff.into())
        }
    }
}
