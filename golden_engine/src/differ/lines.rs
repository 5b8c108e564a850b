// src/differ/lines.rs
//! Line-oriented diffing for CLI sections
//!
//! Lines are compared by key: the normalized line prefixed with the
//! normalized text of its ancestors, so ` shutdown` under two different
//! interfaces is two different keys. Blank lines carry no key.
//!
//! Differences are reported by path: a child line comes with its parent
//! lines, newline separated (`"interface Gi0/1\n shutdown"`).

use super::error::InternalError;
use crate::results::MisorderedLine;
use golden_rules::config::compile_time::diff::MAX_ALIGNMENT_CELLS;
use golden_rules::normalize_line;
use std::collections::{HashMap, HashSet, VecDeque};

const PATH_SEPARATOR: char = '\n';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedLine<'a> {
    pub key: String,
    pub text: &'a str,
    /// Ancestor lines and this line, newline separated
    pub path: String,
    /// Index in the section's line list
    pub position: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineDiff {
    pub missing: Vec<String>,
    pub extra: Vec<String>,
    pub misordered: Vec<MisorderedLine>,
}

impl LineDiff {
    pub fn is_compliant(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty() && self.misordered.is_empty()
    }
}

/// Key every non-blank line with its ancestor path
pub fn key_lines(lines: &[String]) -> Vec<KeyedLine<'_>> {
    let mut ancestors: Vec<(usize, String, &str)> = Vec::new();
    let mut keyed = Vec::with_capacity(lines.len());

    for (position, line) in lines.iter().enumerate() {
        let normalized = normalize_line(line);
        if normalized.is_empty() {
            continue;
        }

        let indent = line.chars().take_while(|c| c.is_whitespace()).count();
        while ancestors.last().is_some_and(|(depth, _, _)| *depth >= indent) {
            ancestors.pop();
        }

        let mut key = String::new();
        let mut path = String::new();
        for (_, parent, parent_text) in &ancestors {
            key.push_str(parent);
            key.push(PATH_SEPARATOR);
            path.push_str(parent_text);
            path.push(PATH_SEPARATOR);
        }
        key.push_str(&normalized);
        path.push_str(line);

        ancestors.push((indent, normalized, line.as_str()));
        keyed.push(KeyedLine {
            key,
            text: line.as_str(),
            path,
            position,
        });
    }

    keyed
}

/// Sequence-sensitive diff
pub fn ordered_diff(intended: &[String], actual: &[String]) -> Result<LineDiff, InternalError> {
    let a = key_lines(intended);
    let b = key_lines(actual);

    let mut prefix = 0;
    while prefix < a.len() && prefix < b.len() && a[prefix].key == b[prefix].key {
        prefix += 1;
    }

    let mut suffix = 0;
    while suffix < a.len() - prefix
        && suffix < b.len() - prefix
        && a[a.len() - 1 - suffix].key == b[b.len() - 1 - suffix].key
    {
        suffix += 1;
    }

    let a_mid = &a[prefix..a.len() - suffix];
    let b_mid = &b[prefix..b.len() - suffix];
    let (unmatched_a, unmatched_b) = align(a_mid, b_mid)?;

    Ok(pair_moves(&unmatched_a, &unmatched_b))
}

/// LCS alignment; returns the lines left unmatched on each side, in order
fn align<'l, 'a>(
    a: &'l [KeyedLine<'a>],
    b: &'l [KeyedLine<'a>],
) -> Result<(Vec<&'l KeyedLine<'a>>, Vec<&'l KeyedLine<'a>>), InternalError> {
    let (n, m) = (a.len(), b.len());
    if n == 0 || m == 0 {
        return Ok((a.iter().collect(), b.iter().collect()));
    }

    let cells = n as u64 * m as u64;
    // LCS length never exceeds min(n, m), so u16 counters hold while that fits
    if cells > MAX_ALIGNMENT_CELLS || n.min(m) >= u16::MAX as usize {
        return Err(InternalError::AlignmentTooLarge {
            intended: n,
            actual: m,
            cells,
            limit: MAX_ALIGNMENT_CELLS,
        });
    }

    let mut ids: HashMap<&str, u32> = HashMap::new();
    let mut intern = |key: &'l str| -> u32 {
        let next = ids.len() as u32;
        *ids.entry(key).or_insert(next)
    };
    let a_ids: Vec<u32> = a.iter().map(|line| intern(line.key.as_str())).collect();
    let b_ids: Vec<u32> = b.iter().map(|line| intern(line.key.as_str())).collect();

    let width = m + 1;
    let mut table = vec![0u16; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i * width + j] = if a_ids[i] == b_ids[j] {
                table[(i + 1) * width + j + 1] + 1
            } else {
                table[(i + 1) * width + j].max(table[i * width + j + 1])
            };
        }
    }

    let mut unmatched_a = Vec::new();
    let mut unmatched_b = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if a_ids[i] == b_ids[j] {
            i += 1;
            j += 1;
        } else if table[(i + 1) * width + j] >= table[i * width + j + 1] {
            unmatched_a.push(&a[i]);
            i += 1;
        } else {
            unmatched_b.push(&b[j]);
            j += 1;
        }
    }
    unmatched_a.extend(a[i..].iter());
    unmatched_b.extend(b[j..].iter());

    Ok((unmatched_a, unmatched_b))
}

/// A key unmatched on both sides moved; report it once as misordered
fn pair_moves(unmatched_a: &[&KeyedLine<'_>], unmatched_b: &[&KeyedLine<'_>]) -> LineDiff {
    let mut waiting: HashMap<&str, VecDeque<usize>> = HashMap::new();
    for (index, line) in unmatched_b.iter().enumerate() {
        waiting.entry(line.key.as_str()).or_default().push_back(index);
    }

    let mut paired = vec![false; unmatched_b.len()];
    let mut diff = LineDiff::default();

    for line in unmatched_a {
        match waiting
            .get_mut(line.key.as_str())
            .and_then(VecDeque::pop_front)
        {
            Some(index) => {
                paired[index] = true;
                diff.misordered.push(MisorderedLine {
                    line: line.path.clone(),
                    intended_position: line.position,
                    actual_position: unmatched_b[index].position,
                });
            }
            None => diff.missing.push(line.path.clone()),
        }
    }

    diff.extra = unmatched_b
        .iter()
        .zip(paired)
        .filter(|(_, paired)| !paired)
        .map(|(line, _)| line.path.clone())
        .collect();

    diff
}

/// Order-insensitive diff; multiset unless duplicates are insignificant
pub fn unordered_diff(intended: &[String], actual: &[String], duplicates_significant: bool) -> LineDiff {
    let a = key_lines(intended);
    let b = key_lines(actual);

    if duplicates_significant {
        LineDiff {
            missing: multiset_surplus(&a, &b),
            extra: multiset_surplus(&b, &a),
            misordered: Vec::new(),
        }
    } else {
        LineDiff {
            missing: set_difference(&a, &b),
            extra: set_difference(&b, &a),
            misordered: Vec::new(),
        }
    }
}

/// Lines of `left` not cancelled by an occurrence in `right`
fn multiset_surplus(left: &[KeyedLine<'_>], right: &[KeyedLine<'_>]) -> Vec<String> {
    let mut available: HashMap<&str, usize> = HashMap::new();
    for line in right {
        *available.entry(line.key.as_str()).or_insert(0) += 1;
    }

    let mut surplus = Vec::new();
    for line in left {
        match available.get_mut(line.key.as_str()) {
            Some(count) if *count > 0 => *count -= 1,
            _ => surplus.push(line.path.clone()),
        }
    }
    surplus
}

/// First occurrence of each `left` key absent from `right`
fn set_difference(left: &[KeyedLine<'_>], right: &[KeyedLine<'_>]) -> Vec<String> {
    let present: HashSet<&str> = right.iter().map(|line| line.key.as_str()).collect();
    let mut seen: HashSet<&str> = HashSet::new();

    let mut difference = Vec::new();
    for line in left {
        if !present.contains(line.key.as_str()) && seen.insert(line.key.as_str()) {
            difference.push(line.path.clone());
        }
    }
    difference
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_keys_carry_ancestors() {
        let section = lines(&["interface Gi0/1", " shutdown", "", "interface Gi0/2", " shutdown"]);
        let keyed = key_lines(&section);
        assert_eq!(keyed.len(), 4);
        assert_ne!(keyed[1].key, keyed[3].key);
        assert_eq!(keyed[3].position, 4);
        assert_eq!(keyed[3].text, " shutdown");
        assert_eq!(keyed[3].path, "interface Gi0/2\n shutdown");
        assert_eq!(keyed[2].path, "interface Gi0/2");
    }

    #[test]
    fn test_ordered_identical_is_compliant() {
        let section = lines(&["router bgp 1", " neighbor a", " neighbor b"]);
        assert!(ordered_diff(&section, &section).unwrap().is_compliant());
    }

    #[test]
    fn test_ordered_ignores_whitespace_and_case() {
        let intended = lines(&["NTP server 1.1.1.1"]);
        let actual = lines(&["ntp   server 1.1.1.1  "]);
        assert!(ordered_diff(&intended, &actual).unwrap().is_compliant());
    }

    #[test]
    fn test_ordered_swap_is_misordered() {
        let intended = lines(&["ntp server 1.1.1.1", "ntp server 2.2.2.2"]);
        let actual = lines(&["ntp server 2.2.2.2", "ntp server 1.1.1.1"]);

        let diff = ordered_diff(&intended, &actual).unwrap();
        assert!(!diff.is_compliant());
        assert!(diff.missing.is_empty());
        assert!(diff.extra.is_empty());
        assert_eq!(diff.misordered.len(), 1);
        assert_eq!(diff.misordered[0].intended_position, 0);
        assert_eq!(diff.misordered[0].actual_position, 1);
    }

    #[test]
    fn test_ordered_missing_and_extra() {
        let intended = lines(&["a", "b", "c"]);
        let actual = lines(&["a", "x", "c", "d"]);

        let diff = ordered_diff(&intended, &actual).unwrap();
        assert_eq!(diff.missing, vec!["b"]);
        assert_eq!(diff.extra, vec!["x", "d"]);
        assert!(diff.misordered.is_empty());
    }

    #[test]
    fn test_ordered_missing_and_extra_are_disjoint() {
        let intended = lines(&["a", "b", "a", "c"]);
        let actual = lines(&["c", "a", "b"]);

        assert_disjoint(&ordered_diff(&intended, &actual).unwrap());
    }

    fn assert_disjoint(diff: &LineDiff) {
        let missing: HashSet<String> = diff.missing.iter().map(|l| normalize_line(l)).collect();
        assert!(diff.extra.iter().all(|l| !missing.contains(&normalize_line(l))));
    }

    #[test]
    fn test_child_differences_name_their_parent() {
        let intended = lines(&["interface Gi0/1", " shutdown", "interface Gi0/2", " no shutdown"]);
        let actual = lines(&["interface Gi0/1", " no shutdown", "interface Gi0/2", " shutdown"]);

        let ordered = ordered_diff(&intended, &actual).unwrap();
        let unordered = unordered_diff(&intended, &actual, true);
        for diff in [&ordered, &unordered] {
            assert_disjoint(diff);
            assert!(diff.misordered.is_empty());
            assert_eq!(
                diff.missing,
                vec!["interface Gi0/1\n shutdown", "interface Gi0/2\n no shutdown"]
            );
            assert_eq!(
                diff.extra,
                vec!["interface Gi0/1\n no shutdown", "interface Gi0/2\n shutdown"]
            );
        }
        assert_disjoint(&unordered_diff(&intended, &actual, false));
    }

    #[test]
    fn test_moved_child_keeps_its_path() {
        let intended = lines(&["router bgp 1", " neighbor a", " neighbor b"]);
        let actual = lines(&["router bgp 1", " neighbor b", " neighbor a"]);

        let diff = ordered_diff(&intended, &actual).unwrap();
        assert_eq!(diff.misordered.len(), 1);
        assert!(diff.misordered[0].line.starts_with("router bgp 1\n "));
    }

    #[test]
    fn test_unordered_reorder_is_compliant() {
        let intended = lines(&["ntp server 1.1.1.1", "ntp server 2.2.2.2"]);
        let actual = lines(&["ntp server 2.2.2.2", "ntp server 1.1.1.1"]);
        assert!(unordered_diff(&intended, &actual, true).is_compliant());
    }

    #[test]
    fn test_unordered_duplicates() {
        let intended = lines(&["logging host a"]);
        let actual = lines(&["logging host a", "logging host a"]);

        let diff = unordered_diff(&intended, &actual, true);
        assert_eq!(diff.extra, vec!["logging host a"]);
        assert!(diff.missing.is_empty());

        assert!(unordered_diff(&intended, &actual, false).is_compliant());
    }

    #[test]
    fn test_unordered_set_difference_reports_once() {
        let intended = lines(&["a", "a", "b"]);
        let actual = lines(&["b"]);
        assert_eq!(unordered_diff(&intended, &actual, false).missing, vec!["a"]);
    }

    #[test]
    fn test_empty_sides() {
        let section = lines(&["a", "b"]);
        let diff = ordered_diff(&[], &section).unwrap();
        assert_eq!(diff.extra, vec!["a", "b"]);
        let diff = ordered_diff(&section, &[]).unwrap();
        assert_eq!(diff.missing, vec!["a", "b"]);
    }
}
