// src/rule/matcher.rs
//! Feature boundary matching for CLI rules
//!
//! A top-level configuration line starts a feature block when its normalized
//! text begins with one of the rule's anchors, or when one of the rule's
//! regular expressions matches the line.

use regex::Regex;

/// Collapse whitespace runs, trim, and case-fold a configuration line.
///
/// Whitespace-only and casing differences are never significant, so this is
/// the comparison key for both section matching and diffing.
pub fn normalize_line(line: &str) -> String {
    let mut normalized = String::with_capacity(line.len());
    for word in line.split_whitespace() {
        if !normalized.is_empty() {
            normalized.push(' ');
        }
        normalized.push_str(word);
    }
    normalized.to_lowercase()
}

/// Compiled anchor/pattern set for one rule
#[derive(Debug, Clone)]
pub struct LineMatcher {
    anchors: Vec<String>,
    patterns: Vec<Regex>,
}

impl LineMatcher {
    /// Compile anchors and patterns. Returns the offending pattern on failure.
    pub fn new(anchors: &[String], patterns: &[String]) -> Result<Self, String> {
        let mut compiled = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let regex = Regex::new(pattern)
                .map_err(|e| format!("invalid pattern '{}': {}", pattern, e))?;
            compiled.push(regex);
        }

        let mut normalized_anchors = Vec::with_capacity(anchors.len());
        for anchor in anchors {
            let normalized = normalize_line(anchor);
            if normalized.is_empty() {
                return Err("anchor lines must not be blank".to_string());
            }
            normalized_anchors.push(normalized);
        }

        Ok(Self {
            anchors: normalized_anchors,
            patterns: compiled,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty() && self.patterns.is_empty()
    }

    pub fn anchors(&self) -> &[String] {
        &self.anchors
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Regex::as_str)
    }

    /// Check a raw configuration line against anchors and patterns.
    ///
    /// Anchors compare against the normalized line; patterns run against the
    /// line with surrounding whitespace removed, so they keep their own case
    /// sensitivity (`(?i)` opts in to folding).
    pub fn matches(&self, line: &str) -> bool {
        if !self.anchors.is_empty() {
            let normalized = normalize_line(line);
            if self
                .anchors
                .iter()
                .any(|anchor| normalized.starts_with(anchor.as_str()))
            {
                return true;
            }
        }

        let trimmed = line.trim();
        self.patterns.iter().any(|p| p.is_match(trimmed))
    }
}
