// src/manifest.rs
//! Device manifest
//!
//! Lists the devices of a run and where their snapshots live:
//!
//! ```toml
//! [[device]]
//! name = "core-rtr-01"
//! platform = "cisco_ios"
//! intended = "intended/core-rtr-01.cfg"
//! actual = "backup/core-rtr-01.cfg"
//!
//! [[device]]
//! name = "leaf-07"
//! platform = "openconfig"
//! intended = "intended/leaf-07.json"
//! actual = "backup/leaf-07.json"
//! format = "json"
//! ```
//!
//! Relative paths resolve against the manifest's directory. A snapshot file
//! that cannot be read is passed on as missing.

use chrono::{DateTime, Utc};
use golden_engine::{ConfigSnapshot, DeviceInput, SnapshotKind};
use golden_rules::logging::codes;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestEntry {
    pub name: String,
    pub platform: String,
    pub intended: Option<PathBuf>,
    pub actual: Option<PathBuf>,
    #[serde(default)]
    pub format: SnapshotFormat,
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Cannot read manifest '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed manifest '{path}': {reason}")]
    Malformed { path: String, reason: String },

    #[error("Invalid manifest '{path}': {reason}")]
    Invalid { path: String, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceManifest {
    #[serde(default)]
    pub device: Vec<ManifestEntry>,
    #[serde(skip)]
    base_dir: PathBuf,
}

impl DeviceManifest {
    pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
        let display = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: display.clone(),
            source,
        })?;

        let mut manifest = Self::parse(&content, &display)?;
        manifest.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(manifest)
    }

    /// Parse manifest text; relative paths resolve against the working directory
    pub fn parse(content: &str, origin: &str) -> Result<Self, ManifestError> {
        let manifest: DeviceManifest = toml::from_str(content).map_err(|e| {
            golden_rules::log_error!(codes::report::MANIFEST_INVALID, "Malformed manifest",
                "path" => origin,
                "reason" => e
            );
            ManifestError::Malformed {
                path: origin.to_string(),
                reason: e.to_string(),
            }
        })?;

        for (index, entry) in manifest.device.iter().enumerate() {
            if entry.name.trim().is_empty() || entry.platform.trim().is_empty() {
                return Err(ManifestError::Invalid {
                    path: origin.to_string(),
                    reason: format!("device #{} needs a non-empty name and platform", index + 1),
                });
            }
        }

        Ok(manifest)
    }

    pub fn len(&self) -> usize {
        self.device.len()
    }

    pub fn is_empty(&self) -> bool {
        self.device.is_empty()
    }

    /// Read every snapshot and build engine inputs in manifest order
    pub fn to_inputs(&self) -> Vec<DeviceInput> {
        self.device
            .iter()
            .map(|entry| {
                let mut input = DeviceInput::new(entry.name.trim(), entry.platform.trim());
                input.intended = self.read_snapshot(entry, SnapshotKind::Intended);
                input.actual = self.read_snapshot(entry, SnapshotKind::Actual);
                input
            })
            .collect()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    fn read_snapshot(&self, entry: &ManifestEntry, kind: SnapshotKind) -> Option<ConfigSnapshot> {
        let relative = match kind {
            SnapshotKind::Intended => entry.intended.as_ref()?,
            SnapshotKind::Actual => entry.actual.as_ref()?,
        };
        let path = self.resolve(relative);

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                golden_rules::log_warning!("Snapshot file not readable",
                    "device" => &entry.name,
                    "snapshot" => kind,
                    "path" => path.display(),
                    "reason" => e
                );
                return None;
            }
        };

        let name = entry.name.trim();
        let platform = entry.platform.trim();
        let snapshot = match entry.format {
            // Invalid JSON stays raw and fails per rule
            SnapshotFormat::Json => match serde_json::from_slice(&bytes) {
                Ok(document) => ConfigSnapshot::structured(name, platform, kind, document),
                Err(_) => ConfigSnapshot::raw(name, platform, kind, bytes),
            },
            SnapshotFormat::Text => ConfigSnapshot::raw(name, platform, kind, bytes),
        };

        match fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(modified) => Some(snapshot.with_captured_at(DateTime::<Utc>::from(modified))),
            Err(_) => Some(snapshot),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use golden_engine::SnapshotContent;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_paths_resolve_against_manifest() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("intended")).unwrap();
        fs::write(dir.path().join("intended").join("r1.cfg"), "ntp server 1.1.1.1\n").unwrap();
        fs::write(dir.path().join("r1.json"), r#"{"ntp": {"server": "a"}}"#).unwrap();
        fs::write(
            dir.path().join("devices.toml"),
            r#"
[[device]]
name = "r1"
platform = "cisco_ios"
intended = "intended/r1.cfg"
actual = "backup/missing.cfg"

[[device]]
name = "r2"
platform = "openconfig"
intended = "r1.json"
actual = "r1.json"
format = "json"
"#,
        )
        .unwrap();

        let manifest = DeviceManifest::from_path(&dir.path().join("devices.toml")).unwrap();
        assert_eq!(manifest.len(), 2);

        let inputs = manifest.to_inputs();
        let intended = inputs[0].intended.as_ref().unwrap();
        assert_eq!(intended.content, SnapshotContent::Raw(b"ntp server 1.1.1.1\n".to_vec()));
        assert!(intended.captured_at.is_some());
        assert!(inputs[0].actual.is_none());

        assert_eq!(
            inputs[1].actual.as_ref().unwrap().content,
            SnapshotContent::Structured(json!({"ntp": {"server": "a"}}))
        );
    }

    #[test]
    fn test_invalid_json_snapshot_stays_raw() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        let mut manifest = DeviceManifest::parse(
            "[[device]]\nname = \"r1\"\nplatform = \"eos\"\nactual = \"bad.json\"\nformat = \"json\"",
            "inline",
        )
        .unwrap();
        manifest.base_dir = dir.path().to_path_buf();

        let inputs = manifest.to_inputs();
        assert_matches!(
            inputs[0].actual.as_ref().map(|s| &s.content),
            Some(SnapshotContent::Raw(_))
        );
    }

    #[test]
    fn test_manifest_validation() {
        assert_matches!(
            DeviceManifest::parse("[[device]]\nname = \"\"\nplatform = \"ios\"", "inline"),
            Err(ManifestError::Invalid { .. })
        );
        assert_matches!(
            DeviceManifest::parse("[[device]]\nname = \"r1\"\nplatform = \"ios\"\nhost = \"x\"", "inline"),
            Err(ManifestError::Malformed { .. })
        );
        assert_matches!(
            DeviceManifest::from_path(Path::new("/no/such/manifest.toml")),
            Err(ManifestError::Io { .. })
        );
    }
}
