// src/types/snapshot.rs
//! Configuration snapshots
//!
//! A [`ConfigSnapshot`] is caller-owned input and never modified. The
//! evaluator turns it into a [`PreparedSnapshot`]: decoded, size-checked,
//! cleaned and split into lines once per device, then shared by every rule.

use chrono::{DateTime, Utc};
use golden_rules::config::compile_time::snapshot::{MAX_SNAPSHOT_BYTES, MAX_SNAPSHOT_LINES};
use golden_rules::SnapshotCleaner;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::OnceCell;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    Intended,
    Actual,
}

impl SnapshotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotKind::Intended => "intended",
            SnapshotKind::Actual => "actual",
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SnapshotContent {
    /// Undecoded bytes, expected to be UTF-8
    Raw(Vec<u8>),
    Text(String),
    Structured(Value),
}

impl SnapshotContent {
    pub fn kind_name(&self) -> &'static str {
        match self {
            SnapshotContent::Raw(_) => "raw",
            SnapshotContent::Text(_) => "text",
            SnapshotContent::Structured(_) => "structured",
        }
    }

    /// Payload size used for the snapshot size limit
    pub fn size_bytes(&self) -> u64 {
        match self {
            SnapshotContent::Raw(bytes) => bytes.len() as u64,
            SnapshotContent::Text(text) => text.len() as u64,
            SnapshotContent::Structured(value) => serde_json::to_vec(value)
                .map(|bytes| bytes.len() as u64)
                .unwrap_or(0),
        }
    }
}

/// One rendition of a device configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub device: String,
    pub kind: SnapshotKind,
    pub platform: String,
    pub captured_at: Option<DateTime<Utc>>,
    pub content: SnapshotContent,
}

impl ConfigSnapshot {
    pub fn new(
        device: impl Into<String>,
        platform: impl Into<String>,
        kind: SnapshotKind,
        content: SnapshotContent,
    ) -> Self {
        Self {
            device: device.into(),
            kind,
            platform: platform.into(),
            captured_at: None,
            content,
        }
    }

    pub fn text(
        device: impl Into<String>,
        platform: impl Into<String>,
        kind: SnapshotKind,
        text: impl Into<String>,
    ) -> Self {
        Self::new(device, platform, kind, SnapshotContent::Text(text.into()))
    }

    pub fn raw(
        device: impl Into<String>,
        platform: impl Into<String>,
        kind: SnapshotKind,
        bytes: Vec<u8>,
    ) -> Self {
        Self::new(device, platform, kind, SnapshotContent::Raw(bytes))
    }

    pub fn structured(
        device: impl Into<String>,
        platform: impl Into<String>,
        kind: SnapshotKind,
        document: Value,
    ) -> Self {
        Self::new(device, platform, kind, SnapshotContent::Structured(document))
    }

    pub fn with_captured_at(mut self, captured_at: DateTime<Utc>) -> Self {
        self.captured_at = Some(captured_at);
        self
    }
}

/// Why a snapshot could not be prepared
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SnapshotError {
    #[error("{kind} snapshot is not valid UTF-8: {reason}")]
    Unreadable { kind: SnapshotKind, reason: String },

    #[error("{kind} snapshot is {size} bytes (max {limit})")]
    TooLarge {
        kind: SnapshotKind,
        size: u64,
        limit: u64,
    },

    #[error("{kind} snapshot has {lines} lines (max {limit})")]
    TooManyLines {
        kind: SnapshotKind,
        lines: usize,
        limit: usize,
    },
}

enum PreparedBody {
    Text {
        source: String,
        lines: Vec<String>,
        document: OnceCell<Result<Value, String>>,
    },
    Structured(Value),
}

/// Decoded, cleaned snapshot ready for sectioning
pub struct PreparedSnapshot {
    device: String,
    platform: String,
    kind: SnapshotKind,
    body: PreparedBody,
}

impl fmt::Debug for PreparedSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedSnapshot")
            .field("device", &self.device)
            .field("kind", &self.kind)
            .field("lines", &self.lines().map(<[String]>::len))
            .field("structured", &self.is_structured())
            .finish()
    }
}

impl PreparedSnapshot {
    /// Decode and clean a snapshot; cleaning applies to line views only
    pub fn prepare(
        snapshot: &ConfigSnapshot,
        cleaner: Option<&SnapshotCleaner>,
    ) -> Result<Self, SnapshotError> {
        let kind = snapshot.kind;
        let size = snapshot.content.size_bytes();
        if size > MAX_SNAPSHOT_BYTES {
            return Err(SnapshotError::TooLarge {
                kind,
                size,
                limit: MAX_SNAPSHOT_BYTES,
            });
        }

        let body = match &snapshot.content {
            SnapshotContent::Structured(value) => PreparedBody::Structured(value.clone()),
            SnapshotContent::Text(text) => Self::prepare_text(kind, text.clone(), cleaner)?,
            SnapshotContent::Raw(bytes) => {
                let text = String::from_utf8(bytes.clone()).map_err(|e| SnapshotError::Unreadable {
                    kind,
                    reason: e.to_string(),
                })?;
                Self::prepare_text(kind, text, cleaner)?
            }
        };

        Ok(Self {
            device: snapshot.device.clone(),
            platform: snapshot.platform.clone(),
            kind,
            body,
        })
    }

    fn prepare_text(
        kind: SnapshotKind,
        mut source: String,
        cleaner: Option<&SnapshotCleaner>,
    ) -> Result<PreparedBody, SnapshotError> {
        if source.starts_with('\u{feff}') {
            source.drain(..'\u{feff}'.len_utf8());
        }

        let lines: Vec<String> = match cleaner {
            Some(cleaner) if !cleaner.is_empty() => {
                cleaner.apply(&source).lines().map(str::to_string).collect()
            }
            _ => source.lines().map(str::to_string).collect(),
        };

        if lines.len() > MAX_SNAPSHOT_LINES {
            return Err(SnapshotError::TooManyLines {
                kind,
                lines: lines.len(),
                limit: MAX_SNAPSHOT_LINES,
            });
        }

        Ok(PreparedBody::Text {
            source,
            lines,
            document: OnceCell::new(),
        })
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn kind(&self) -> SnapshotKind {
        self.kind
    }

    pub fn is_structured(&self) -> bool {
        matches!(self.body, PreparedBody::Structured(_))
    }

    /// Cleaned text lines; `None` for structured snapshots
    pub fn lines(&self) -> Option<&[String]> {
        match &self.body {
            PreparedBody::Text { lines, .. } => Some(lines),
            PreparedBody::Structured(_) => None,
        }
    }

    /// Structured view, parsing text content as JSON on first use
    pub fn document(&self) -> Result<&Value, String> {
        match &self.body {
            PreparedBody::Structured(value) => Ok(value),
            PreparedBody::Text {
                source, document, ..
            } => document
                .get_or_init(|| serde_json::from_str(source).map_err(|e| e.to_string()))
                .as_ref()
                .map_err(|reason| reason.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use golden_rules::CleaningDirective;
    use serde_json::json;

    #[test]
    fn test_raw_bytes_must_be_utf8() {
        let snapshot = ConfigSnapshot::raw("r1", "cisco_ios", SnapshotKind::Actual, vec![0x66, 0xff, 0xfe]);
        assert_matches!(
            PreparedSnapshot::prepare(&snapshot, None),
            Err(SnapshotError::Unreadable { kind: SnapshotKind::Actual, .. })
        );

        let snapshot = ConfigSnapshot::raw("r1", "cisco_ios", SnapshotKind::Actual, b"hostname r1\n".to_vec());
        let prepared = PreparedSnapshot::prepare(&snapshot, None).unwrap();
        assert_eq!(prepared.lines().unwrap(), ["hostname r1"]);
    }

    #[test]
    fn test_cleaner_applies_to_lines_only() {
        let mut cleaner = SnapshotCleaner::new();
        cleaner.push(CleaningDirective::remove("stamp", "cisco_ios", "^! Last").unwrap());

        let snapshot = ConfigSnapshot::text(
            "r1",
            "cisco_ios",
            SnapshotKind::Actual,
            "\u{feff}! Last configuration change\r\nhostname r1\r\n",
        );
        let prepared = PreparedSnapshot::prepare(&snapshot, Some(&cleaner)).unwrap();
        assert_eq!(prepared.lines().unwrap(), ["hostname r1"]);
    }

    #[test]
    fn test_document_is_parsed_lazily_from_text() {
        let snapshot = ConfigSnapshot::text("r1", "eos", SnapshotKind::Intended, r#"{"ntp": {"server": "a"}}"#);
        let prepared = PreparedSnapshot::prepare(&snapshot, None).unwrap();
        assert_eq!(prepared.document().unwrap(), &json!({"ntp": {"server": "a"}}));

        let snapshot = ConfigSnapshot::text("r1", "eos", SnapshotKind::Intended, "hostname r1");
        let prepared = PreparedSnapshot::prepare(&snapshot, None).unwrap();
        assert!(prepared.document().is_err());
    }

    #[test]
    fn test_structured_snapshot_has_no_lines() {
        let snapshot = ConfigSnapshot::structured("r1", "eos", SnapshotKind::Actual, json!({"a": 1}));
        let prepared = PreparedSnapshot::prepare(&snapshot, None).unwrap();
        assert!(prepared.is_structured());
        assert!(prepared.lines().is_none());
    }
}
