// src/loader.rs
//! Rule file loading
//!
//! Rule files are TOML or JSON documents with three optional arrays:
//!
//! ```toml
//! [[rule]]
//! feature = "ntp"
//! platform = "cisco_ios"
//! config_type = "ordered"
//! anchors = ["ntp"]
//!
//! [[remove]]
//! name = "build banner"
//! platform = "cisco_ios"
//! regex = "^Building configuration"
//!
//! [[replace]]
//! name = "secrets"
//! platform = "cisco_ios"
//! regex = "secret 5 \\S+"
//! replace = "secret 5 <removed>"
//! ```
//!
//! Loading a directory discovers files by extension in sorted order and
//! reports every problem found, not only the first.

use crate::cleaning::{CleaningDefinition, CleaningDirective};
use crate::config::compile_time::rules::MAX_RULE_FILES;
use crate::config::runtime::LoadPreferences;
use crate::logging::codes;
use crate::registry::{RuleSet, RuleSetBuilder};
use crate::rule::{RuleDefinition, RuleError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Parsed content of one rule file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleFile {
    #[serde(default)]
    pub rule: Vec<RuleDefinition>,
    #[serde(default)]
    pub remove: Vec<CleaningDefinition>,
    #[serde(default)]
    pub replace: Vec<CleaningDefinition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleFileFormat {
    Toml,
    Json,
}

impl RuleFileFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "toml" => Some(RuleFileFormat::Toml),
            "json" => Some(RuleFileFormat::Json),
            _ => None,
        }
    }
}

impl RuleFile {
    pub fn parse(content: &str, format: RuleFileFormat) -> Result<Self, String> {
        match format {
            RuleFileFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            RuleFileFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        }
    }

    /// Read and parse a rule file, picking the format from its extension
    pub fn from_path(path: &Path) -> Result<Self, RuleError> {
        let display = path.display().to_string();
        let format = RuleFileFormat::from_path(path).ok_or_else(|| RuleError::Malformed {
            path: display.clone(),
            reason: "expected a .toml or .json extension".to_string(),
        })?;

        let content = fs::read_to_string(path).map_err(|e| RuleError::Unreadable {
            path: display.clone(),
            reason: e.to_string(),
        })?;

        Self::parse(&content, format).map_err(|reason| RuleError::Malformed {
            path: display,
            reason,
        })
    }

    /// Validate every entry into the builder, collecting all failures
    pub fn register_into(self, builder: &mut RuleSetBuilder) -> Vec<RuleError> {
        let mut errors = Vec::new();

        for definition in self.rule {
            if let Err(e) = builder.register_definition(definition) {
                errors.push(e);
            }
        }

        let removals = self.remove.iter().map(CleaningDirective::from_remove_definition);
        let replacements = self.replace.iter().map(CleaningDirective::from_replace_definition);
        for directive in removals.chain(replacements) {
            match directive {
                Ok(directive) => builder.add_directive(directive),
                Err(e) => errors.push(e),
            }
        }

        errors
    }
}

/// Find rule files under a directory in sorted order
pub fn discover_rule_files(dir: &Path, prefs: &LoadPreferences) -> Result<Vec<PathBuf>, RuleError> {
    if !dir.is_dir() {
        return Err(RuleError::NotFound {
            path: dir.display().to_string(),
        });
    }

    let mut walker = WalkDir::new(dir).follow_links(false).sort_by_file_name();
    if !prefs.recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| RuleError::Unreadable {
            path: e
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| dir.display().to_string()),
            reason: e.to_string(),
        })?;

        if entry.file_type().is_file() && RuleFileFormat::from_path(entry.path()).is_some() {
            files.push(entry.into_path());
        }
    }
    files.sort();

    let limit = prefs
        .max_files
        .map(|max| max.min(MAX_RULE_FILES))
        .unwrap_or(MAX_RULE_FILES);
    if files.len() > limit {
        return Err(RuleError::LimitExceeded {
            what: "rule files",
            count: files.len(),
            limit,
        });
    }

    crate::log_debug!("Rule files discovered",
        "directory" => dir.display(),
        "files" => files.len(),
        "recursive" => prefs.recursive
    );

    Ok(files)
}

/// Load a rule file or a directory of rule files into a [`RuleSet`]
pub fn load_rule_set(path: &Path, prefs: &LoadPreferences) -> Result<RuleSet, RuleError> {
    crate::log_info!("Loading rules", "path" => path.display());

    let files = if path.is_dir() {
        discover_rule_files(path, prefs)?
    } else if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        return Err(RuleError::NotFound {
            path: path.display().to_string(),
        });
    };

    let mut builder = RuleSet::builder();
    let mut errors = Vec::new();

    for file in &files {
        match RuleFile::from_path(file) {
            Ok(rule_file) => errors.extend(rule_file.register_into(&mut builder)),
            Err(e) => errors.push(e),
        }
    }

    if let Some(error) = RuleError::from_errors(errors) {
        crate::log_error!(error.code(), "Rule loading failed",
            "path" => path.display(),
            "errors" => error.clone().into_vec().len()
        );
        return Err(error);
    }

    let rule_set = builder.build();

    crate::log_success!(codes::success::RULES_LOADED, "Rules loaded",
        "path" => path.display(),
        "files" => files.len(),
        "rules" => rule_set.len(),
        "cleaning_directives" => rule_set.directive_count()
    );

    Ok(rule_set)
}

/// Load rules from a string, for embedded or generated rule sets
pub fn load_rule_set_from_str(content: &str, format: RuleFileFormat) -> Result<RuleSet, RuleError> {
    let rule_file = RuleFile::parse(content, format).map_err(|reason| RuleError::Malformed {
        path: "<inline>".to_string(),
        reason,
    })?;

    let mut builder = RuleSet::builder();
    let errors = rule_file.register_into(&mut builder);
    match RuleError::from_errors(errors) {
        Some(error) => Err(error),
        None => Ok(builder.build()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    const NTP_RULES: &str = r#"
[[rule]]
feature = "ntp"
platform = "cisco_ios"
config_type = "ordered"
anchors = ["ntp"]

[[rule]]
feature = "snmp"
platform = "openconfig"
config_type = "json"
selector = "$.snmp"

[[remove]]
name = "build banner"
platform = "cisco_ios"
regex = "^Building configuration"
"#;

    fn prefs(recursive: bool) -> LoadPreferences {
        LoadPreferences {
            recursive,
            max_files: None,
        }
    }

    #[test]
    fn test_load_single_toml_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ntp.toml");
        fs::write(&path, NTP_RULES).unwrap();

        let set = load_rule_set(&path, &prefs(true)).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.get("cisco_ios", "ntp").is_some());
        assert_eq!(set.directive_count(), 1);
    }

    #[test]
    fn test_load_json_from_str() {
        let json = r#"{"rule": [{"feature": "aaa", "platform": "cisco_ios",
                       "config_type": "unordered", "match_config": "aaa\nusername"}]}"#;
        let set = load_rule_set_from_str(json, RuleFileFormat::Json).unwrap();
        let rule = set.get("cisco_ios", "aaa").unwrap();
        assert_eq!(rule.line_matcher().map(|m| m.anchors().len()), Some(2));
    }

    #[test]
    fn test_directory_discovery_respects_recursion() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.toml"), NTP_RULES).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(
            dir.path().join("nested").join("b.json"),
            r#"{"rule": [{"feature": "aaa", "platform": "cisco_ios", "config_type": "ordered", "anchors": ["aaa"]}]}"#,
        )
        .unwrap();

        let flat = discover_rule_files(dir.path(), &prefs(false)).unwrap();
        assert_eq!(flat.len(), 1);

        let deep = discover_rule_files(dir.path(), &prefs(true)).unwrap();
        assert_eq!(deep.len(), 2);

        let set = load_rule_set(dir.path(), &prefs(true)).unwrap();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_all_errors_are_reported() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.toml"), NTP_RULES).unwrap();
        fs::write(dir.path().join("b.toml"), NTP_RULES).unwrap();
        fs::write(dir.path().join("c.toml"), "[[rule]\nbroken").unwrap();

        let error = load_rule_set(dir.path(), &prefs(false)).unwrap_err();
        let errors = error.into_vec();

        // b.toml conflicts twice, c.toml is malformed
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| matches!(e, RuleError::Malformed { .. })));
        assert_eq!(
            errors
                .iter()
                .filter(|e| matches!(e, RuleError::Conflict { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn test_missing_path_and_file_limit() {
        assert_matches!(
            load_rule_set(Path::new("/definitely/not/here"), &prefs(true)),
            Err(RuleError::NotFound { .. })
        );

        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.toml"), "").unwrap();
        fs::write(dir.path().join("b.toml"), "").unwrap();
        let limited = LoadPreferences {
            recursive: true,
            max_files: Some(1),
        };
        assert_matches!(
            discover_rule_files(dir.path(), &limited),
            Err(RuleError::LimitExceeded { count: 2, limit: 1, .. })
        );
    }

    #[test]
    fn test_unknown_keys_are_malformed() {
        let error = load_rule_set_from_str("[[rules]]\nfeature = \"x\"", RuleFileFormat::Toml);
        assert_matches!(error, Err(RuleError::Malformed { .. }));
    }
}
