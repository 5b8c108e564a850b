// src/differ/json.rs
//! Structural diff for JSON sections
//!
//! Leaves are flattened to dotted paths (`snmp.community`, `servers[1]`).
//! A changed leaf appears in both maps: intended value under `missing`,
//! actual value under `extra`.

use super::error::InternalError;
use golden_rules::config::compile_time::diff::MAX_STRUCTURED_DEPTH;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Path used for a value at the document root
pub const ROOT_PATH: &str = "$";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldDiff {
    pub missing: BTreeMap<String, Value>,
    pub extra: BTreeMap<String, Value>,
}

impl FieldDiff {
    pub fn is_compliant(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

struct Walker<'s> {
    set_paths: &'s [String],
    diff: FieldDiff,
}

/// Diff two optional documents rooted at `base`.
///
/// `set_paths` are relative to `base`; arrays at those paths compare as
/// multisets instead of positionally.
pub fn diff_documents(
    intended: Option<&Value>,
    actual: Option<&Value>,
    base: &str,
    set_paths: &[String],
) -> Result<FieldDiff, InternalError> {
    let mut walker = Walker {
        set_paths,
        diff: FieldDiff::default(),
    };

    match (intended, actual) {
        (None, None) => {}
        (Some(intended), None) => flatten(intended, base, 0, &mut walker.diff.missing)?,
        (None, Some(actual)) => flatten(actual, base, 0, &mut walker.diff.extra)?,
        (Some(intended), Some(actual)) => walker.walk(intended, actual, base, "", 0)?,
    }

    Ok(walker.diff)
}

impl Walker<'_> {
    fn walk(
        &mut self,
        intended: &Value,
        actual: &Value,
        path: &str,
        relative: &str,
        depth: usize,
    ) -> Result<(), InternalError> {
        check_depth(path, depth)?;

        match (intended, actual) {
            (Value::Object(left), Value::Object(right)) => {
                for (key, left_value) in left {
                    let child = join_key(path, key);
                    match right.get(key) {
                        Some(right_value) => self.walk(
                            left_value,
                            right_value,
                            &child,
                            &join_key(relative, key),
                            depth + 1,
                        )?,
                        None => flatten(left_value, &child, depth + 1, &mut self.diff.missing)?,
                    }
                }
                for (key, right_value) in right {
                    if !left.contains_key(key) {
                        flatten(right_value, &join_key(path, key), depth + 1, &mut self.diff.extra)?;
                    }
                }
            }
            (Value::Array(left), Value::Array(right)) => {
                if self.set_paths.iter().any(|p| p == relative) {
                    self.diff_as_multiset(left, right, path, depth)?;
                } else {
                    for index in 0..left.len().max(right.len()) {
                        let child = join_index(path, index);
                        match (left.get(index), right.get(index)) {
                            (Some(l), Some(r)) => {
                                self.walk(l, r, &child, &join_index(relative, index), depth + 1)?
                            }
                            (Some(l), None) => flatten(l, &child, depth + 1, &mut self.diff.missing)?,
                            (None, Some(r)) => flatten(r, &child, depth + 1, &mut self.diff.extra)?,
                            (None, None) => {}
                        }
                    }
                }
            }
            (left, right) if left == right => {}
            (left, right) if is_scalar(left) && is_scalar(right) => {
                self.diff.missing.insert(display_path(path), left.clone());
                self.diff.extra.insert(display_path(path), right.clone());
            }
            (left, right) => {
                flatten(left, path, depth, &mut self.diff.missing)?;
                flatten(right, path, depth, &mut self.diff.extra)?;
            }
        }

        Ok(())
    }

    fn diff_as_multiset(
        &mut self,
        left: &[Value],
        right: &[Value],
        path: &str,
        depth: usize,
    ) -> Result<(), InternalError> {
        let mut available: HashMap<String, usize> = HashMap::new();
        for item in right {
            *available.entry(canonical(item)).or_insert(0) += 1;
        }
        for (index, item) in left.iter().enumerate() {
            match available.get_mut(&canonical(item)) {
                Some(count) if *count > 0 => *count -= 1,
                _ => flatten(item, &join_index(path, index), depth + 1, &mut self.diff.missing)?,
            }
        }

        let mut available: HashMap<String, usize> = HashMap::new();
        for item in left {
            *available.entry(canonical(item)).or_insert(0) += 1;
        }
        for (index, item) in right.iter().enumerate() {
            match available.get_mut(&canonical(item)) {
                Some(count) if *count > 0 => *count -= 1,
                _ => flatten(item, &join_index(path, index), depth + 1, &mut self.diff.extra)?,
            }
        }

        Ok(())
    }
}

/// Record every leaf of `value` under `path`; empty containers are leaves
pub fn flatten(
    value: &Value,
    path: &str,
    depth: usize,
    into: &mut BTreeMap<String, Value>,
) -> Result<(), InternalError> {
    check_depth(path, depth)?;

    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                flatten(child, &join_key(path, key), depth + 1, into)?;
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (index, child) in items.iter().enumerate() {
                flatten(child, &join_index(path, index), depth + 1, into)?;
            }
        }
        leaf => {
            into.insert(display_path(path), leaf.clone());
        }
    }
    Ok(())
}

fn check_depth(path: &str, depth: usize) -> Result<(), InternalError> {
    if depth > MAX_STRUCTURED_DEPTH {
        return Err(InternalError::DepthExceeded {
            path: display_path(path),
            limit: MAX_STRUCTURED_DEPTH,
        });
    }
    Ok(())
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Object(_) | Value::Array(_))
}

fn join_key(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn join_index(path: &str, index: usize) -> String {
    format!("{}[{}]", path, index)
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        ROOT_PATH.to_string()
    } else if path.starts_with('[') {
        format!("{}{}", ROOT_PATH, path)
    } else {
        path.to_string()
    }
}

/// Key-sorted serialization used for set comparison
fn canonical(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}
