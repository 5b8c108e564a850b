// src/sectioner/cli.rs
//! Indentation-based CLI sectioning

use crate::strategies::{ParseError, SectionExtractor};
use crate::types::{FeatureSection, PreparedSnapshot};
use golden_rules::{ComplianceRule, LineMatcher};

/// Extractor for ORDERED and UNORDERED_SINGLE_LINE rules
#[derive(Debug, Default, Clone, Copy)]
pub struct CliSectioner;

impl SectionExtractor for CliSectioner {
    fn strategy_name(&self) -> &str {
        "cli"
    }

    fn extract(
        &self,
        snapshot: &PreparedSnapshot,
        rule: &ComplianceRule,
    ) -> Result<FeatureSection, ParseError> {
        let lines = snapshot.lines().ok_or_else(|| ParseError::DialectMismatch {
            feature: rule.feature_name().to_string(),
            config_type: rule.config_type(),
            content: "structured",
        })?;

        match rule.line_matcher() {
            Some(matcher) => Ok(extract_blocks(lines, matcher)),
            None => Ok(FeatureSection::Absent),
        }
    }
}

/// Collect every top-level block whose opening line matches.
///
/// A block is its opening line plus all following lines indented deeper.
/// Comment-marker lines (`!`, `#`) close a block at the top level and are
/// dropped inside one. Blank lines survive only between block lines, once.
pub fn extract_blocks(lines: &[String], matcher: &LineMatcher) -> FeatureSection {
    let mut section: Vec<String> = Vec::new();
    let mut index = 0;

    while index < lines.len() {
        let line = &lines[index];
        index += 1;

        if is_blank(line) || is_indented(line) || is_comment_marker(line) || !matcher.matches(line) {
            continue;
        }

        section.push(line.trim_end().to_string());
        let mut pending_blank = false;

        while index < lines.len() {
            let child = &lines[index];
            if is_blank(child) {
                pending_blank = true;
                index += 1;
                continue;
            }
            if !is_indented(child) {
                break;
            }
            index += 1;
            if is_comment_marker(child) {
                continue;
            }
            if pending_blank {
                section.push(String::new());
                pending_blank = false;
            }
            section.push(child.trim_end().to_string());
        }
    }

    if section.is_empty() {
        FeatureSection::Absent
    } else {
        FeatureSection::Lines(section)
    }
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn is_indented(line: &str) -> bool {
    line.starts_with(char::is_whitespace)
}

fn is_comment_marker(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c == '!' || c == '#')
}
