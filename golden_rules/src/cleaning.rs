// src/cleaning.rs
//! Snapshot cleaning directives
//!
//! Platform-scoped regex rules applied to a snapshot's text before
//! sectioning. `remove` directives drop matching lines; `replace` directives
//! substitute matches in place (timestamps, hashed secrets, counters).

use crate::rule::RuleError;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Directive as written in a rule file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleaningDefinition {
    pub name: String,
    pub platform: String,
    pub regex: String,
    /// Only used by `replace` directives
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleaningAction {
    Remove,
    Replace(String),
}

/// Compiled directive
#[derive(Debug, Clone)]
pub struct CleaningDirective {
    name: String,
    platform: String,
    pattern: Regex,
    action: CleaningAction,
}

impl CleaningDirective {
    pub fn remove(name: &str, platform: &str, regex: &str) -> Result<Self, RuleError> {
        Self::compile(name, platform, regex, CleaningAction::Remove)
    }

    pub fn replace(
        name: &str,
        platform: &str,
        regex: &str,
        replacement: impl Into<String>,
    ) -> Result<Self, RuleError> {
        Self::compile(
            name,
            platform,
            regex,
            CleaningAction::Replace(replacement.into()),
        )
    }

    /// Compile a `[[remove]]` definition; any `replace` text is rejected
    pub fn from_remove_definition(definition: &CleaningDefinition) -> Result<Self, RuleError> {
        if definition.replace.is_some() {
            return Err(RuleError::InvalidDirective {
                name: definition.name.clone(),
                platform: definition.platform.clone(),
                reason: "remove directives do not take replacement text".to_string(),
            });
        }
        Self::remove(&definition.name, &definition.platform, &definition.regex)
    }

    /// Compile a `[[replace]]` definition; a missing `replace` means empty text
    pub fn from_replace_definition(definition: &CleaningDefinition) -> Result<Self, RuleError> {
        Self::replace(
            &definition.name,
            &definition.platform,
            &definition.regex,
            definition.replace.clone().unwrap_or_default(),
        )
    }

    fn compile(
        name: &str,
        platform: &str,
        regex: &str,
        action: CleaningAction,
    ) -> Result<Self, RuleError> {
        let invalid = |reason: String| RuleError::InvalidDirective {
            name: name.to_string(),
            platform: platform.to_string(),
            reason,
        };

        let name = name.trim();
        let platform = platform.trim();
        if name.is_empty() {
            return Err(invalid("directive name must not be empty".to_string()));
        }
        if platform.is_empty() {
            return Err(invalid("platform must not be empty".to_string()));
        }
        if regex.is_empty() {
            return Err(invalid("regex must not be empty".to_string()));
        }

        let pattern =
            Regex::new(regex).map_err(|e| invalid(format!("invalid regex '{}': {}", regex, e)))?;

        Ok(Self {
            name: name.to_string(),
            platform: platform.to_string(),
            pattern,
            action,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn action(&self) -> &CleaningAction {
        &self.action
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

/// Ordered directive list for one platform: removals first, then replacements
#[derive(Debug, Clone, Default)]
pub struct SnapshotCleaner {
    removals: Vec<CleaningDirective>,
    replacements: Vec<CleaningDirective>,
}

impl SnapshotCleaner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, directive: CleaningDirective) {
        match directive.action {
            CleaningAction::Remove => self.removals.push(directive),
            CleaningAction::Replace(_) => self.replacements.push(directive),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.replacements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.removals.len() + self.replacements.len()
    }

    pub fn directives(&self) -> impl Iterator<Item = &CleaningDirective> {
        self.removals.iter().chain(self.replacements.iter())
    }

    /// Apply every directive line by line
    pub fn apply(&self, text: &str) -> String {
        if self.is_empty() {
            return text.to_string();
        }

        let mut output = String::with_capacity(text.len());
        for line in text.lines() {
            if self.removals.iter().any(|d| d.pattern.is_match(line)) {
                continue;
            }

            let mut current = line.to_string();
            for directive in &self.replacements {
                if let CleaningAction::Replace(replacement) = &directive.action {
                    current = directive
                        .pattern
                        .replace_all(&current, replacement.as_str())
                        .into_owned();
                }
            }

            output.push_str(&current);
            output.push('\n');
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_remove_drops_matching_lines() {
        let mut cleaner = SnapshotCleaner::new();
        cleaner.push(CleaningDirective::remove("build", "cisco_ios", r"^Building configuration").unwrap());
        cleaner.push(CleaningDirective::remove("size", "cisco_ios", r"^Current configuration :").unwrap());

        let cleaned = cleaner.apply(
            "Building configuration...\nCurrent configuration : 1234 bytes\nhostname r1\n",
        );
        assert_eq!(cleaned, "hostname r1\n");
    }

    #[test]
    fn test_replace_rewrites_matches() {
        let mut cleaner = SnapshotCleaner::new();
        cleaner.push(
            CleaningDirective::replace("secrets", "cisco_ios", r"secret 5 \S+", "secret 5 <removed>")
                .unwrap(),
        );

        let cleaned = cleaner.apply("username admin secret 5 $1$abcd$xyz\n");
        assert_eq!(cleaned, "username admin secret 5 <removed>\n");
    }

    #[test]
    fn test_removals_run_before_replacements() {
        let mut cleaner = SnapshotCleaner::new();
        cleaner.push(CleaningDirective::replace("stamp", "ios", r"^! Last", "kept").unwrap());
        cleaner.push(CleaningDirective::remove("stamp", "ios", r"^! Last configuration change").unwrap());

        assert_eq!(cleaner.apply("! Last configuration change at 10:00\n"), "");
        assert_eq!(cleaner.len(), 2);
    }

    #[test]
    fn test_invalid_directives() {
        assert_matches!(
            CleaningDirective::remove("bad", "ios", "(open"),
            Err(RuleError::InvalidDirective { .. })
        );
        assert!(CleaningDirective::remove(" ", "ios", "x").is_err());

        let definition = CleaningDefinition {
            name: "bad".into(),
            platform: "ios".into(),
            regex: "x".into(),
            replace: Some("y".into()),
        };
        assert!(CleaningDirective::from_remove_definition(&definition).is_err());
        assert!(CleaningDirective::from_replace_definition(&definition).is_ok());
    }

    #[test]
    fn test_empty_cleaner_is_identity() {
        let cleaner = SnapshotCleaner::new();
        assert_eq!(cleaner.apply("a\n  b"), "a\n  b");
    }
}
