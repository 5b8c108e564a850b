// Internal modules
pub mod cleaning;
pub mod config;
pub mod loader;
#[macro_use]
pub mod logging;
pub mod registry;
pub mod rule;

// Re-export key types for library consumers
pub use cleaning::{CleaningAction, CleaningDefinition, CleaningDirective, SnapshotCleaner};
pub use loader::{load_rule_set, load_rule_set_from_str, RuleFile, RuleFileFormat};
pub use registry::{RuleKey, RuleSet, RuleSetBuilder};
pub use rule::{
    normalize_line, ComplianceRule, ConfigType, JsonSelector, LineMatcher, MatchConfig,
    RuleDefinition, RuleError, RuleOptions, Segment,
};
