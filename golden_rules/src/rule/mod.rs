// src/rule/mod.rs
//! # Rule Model
//!
//! Compliance rules describe where a feature lives in a configuration and
//! how its intended and actual renditions are compared.

pub mod error;
pub mod matcher;
pub mod selector;
pub mod types;
mod validation;

pub use error::RuleError;
pub use matcher::{normalize_line, LineMatcher};
pub use selector::{JsonSelector, Segment};
pub use types::{ComplianceRule, ConfigType, MatchConfig, RuleDefinition, RuleOptions};
