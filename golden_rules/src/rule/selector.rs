// src/rule/selector.rs
//! JSON path selectors for structured rules
//!
//! Supported forms: `$` (whole document), `$.snmp.community`,
//! `interfaces[0].name`, `ntp.servers`. Keys are object members, `[n]`
//! indexes arrays.

use crate::config::compile_time::rules::MAX_SELECTOR_DEPTH;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// Parsed selector
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JsonSelector {
    segments: Vec<Segment>,
}

impl JsonSelector {
    /// Selector for the whole document
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    pub fn parse(input: &str) -> Result<Self, String> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err("selector must not be empty".to_string());
        }

        let body = match trimmed.strip_prefix('$') {
            Some(rest) => rest.strip_prefix('.').unwrap_or(rest),
            None => trimmed,
        };

        let mut segments = Vec::new();
        if body.is_empty() {
            return Ok(Self { segments });
        }

        for part in body.split('.') {
            parse_part(part, input, &mut segments)?;
        }

        if segments.len() > MAX_SELECTOR_DEPTH {
            return Err(format!(
                "selector '{}' is {} segments deep (max {})",
                input,
                segments.len(),
                MAX_SELECTOR_DEPTH
            ));
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Apply to a document; `None` when any segment does not resolve
    pub fn select<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        let mut current = document;
        for segment in &self.segments {
            current = match segment {
                Segment::Key(key) => current.as_object()?.get(key)?,
                Segment::Index(index) => current.as_array()?.get(*index)?,
            };
        }
        Some(current)
    }

    /// Dotted path form used in diff output; empty for the root selector
    pub fn to_path(&self) -> String {
        let mut path = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Key(key) => {
                    if !path.is_empty() {
                        path.push('.');
                    }
                    path.push_str(key);
                }
                Segment::Index(index) => {
                    path.push_str(&format!("[{}]", index));
                }
            }
        }
        path
    }
}

impl fmt::Display for JsonSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "$")
        } else {
            write!(f, "$.{}", self.to_path())
        }
    }
}

fn parse_part(part: &str, input: &str, segments: &mut Vec<Segment>) -> Result<(), String> {
    if part.is_empty() {
        return Err(format!("selector '{}' has an empty segment", input));
    }

    let (key, mut rest) = match part.find('[') {
        Some(pos) => (&part[..pos], &part[pos..]),
        None => (part, ""),
    };

    if !key.is_empty() {
        segments.push(Segment::Key(key.to_string()));
    }

    while !rest.is_empty() {
        let inner = rest
            .strip_prefix('[')
            .ok_or_else(|| format!("selector '{}' has unexpected text '{}'", input, rest))?;
        let close = inner
            .find(']')
            .ok_or_else(|| format!("selector '{}' has an unclosed '['", input))?;
        let index: usize = inner[..close].trim().parse().map_err(|_| {
            format!(
                "selector '{}' has a non-numeric index '{}'",
                input,
                &inner[..close]
            )
        })?;
        segments.push(Segment::Index(index));
        rest = &inner[close + 1..];
    }

    Ok(())
}
