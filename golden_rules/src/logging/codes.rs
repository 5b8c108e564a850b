//! Consolidated event codes and classification system
//!
//! Single source of truth for every code the workspace logs, together with
//! its behavioral metadata.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for both error and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for a code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub requires_halt: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl ErrorMetadata {
    pub const fn new(
        code: &'static str,
        category: &'static str,
        severity: Severity,
        recoverable: bool,
        requires_halt: bool,
        description: &'static str,
        recommended_action: &'static str,
    ) -> Self {
        Self {
            code,
            category,
            severity,
            recoverable,
            requires_halt,
            description,
            recommended_action,
        }
    }
}

// ============================================================================
// CODE CONSTANTS
// ============================================================================

/// System error codes
pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
}

/// Rule definition and rule-file codes
pub mod rules {
    use super::Code;

    pub const RULE_VALIDATION_FAILED: Code = Code::new("E010");
    pub const DUPLICATE_RULE: Code = Code::new("E011");
    pub const RULE_FILE_UNREADABLE: Code = Code::new("E012");
    pub const RULE_FILE_MALFORMED: Code = Code::new("E013");
    pub const UNKNOWN_STRATEGY: Code = Code::new("E014");
    pub const RULE_LIMIT_EXCEEDED: Code = Code::new("E015");
}

/// Snapshot intake codes (device-level)
pub mod snapshot {
    use super::Code;

    pub const MISSING_SNAPSHOT: Code = Code::new("E030");
    pub const UNREADABLE_SNAPSHOT: Code = Code::new("E031");
    pub const SNAPSHOT_TOO_LARGE: Code = Code::new("E032");
}

/// Per-rule evaluation codes
pub mod evaluation {
    use super::Code;

    pub const SECTION_PARSE_FAILED: Code = Code::new("E050");
    pub const DIFF_INTERNAL_ERROR: Code = Code::new("E051");
    pub const RULE_PANICKED: Code = Code::new("E052");
}

/// Batch execution codes
pub mod batch {
    use super::Code;

    pub const DEVICE_TIMEOUT: Code = Code::new("E070");
    pub const BATCH_CANCELLED: Code = Code::new("E071");
    pub const DUPLICATE_DEVICE: Code = Code::new("E072");
    pub const WORKER_PANIC: Code = Code::new("E073");
    pub const INVALID_ENGINE_CONFIG: Code = Code::new("E074");
}

/// Report output codes
pub mod report {
    use super::Code;

    pub const REPORT_SERIALIZATION_FAILED: Code = Code::new("E090");
    pub const REPORT_WRITE_FAILED: Code = Code::new("E091");
    pub const MANIFEST_INVALID: Code = Code::new("E092");
}

/// Success codes
pub mod success {
    use super::Code;

    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I001");
    pub const RULES_LOADED: Code = Code::new("I010");
    pub const RULE_SET_BUILT: Code = Code::new("I011");
    pub const DEVICE_EVALUATED: Code = Code::new("I030");
    pub const BATCH_COMPLETED: Code = Code::new("I050");
    pub const REPORT_WRITTEN: Code = Code::new("I060");
}

// ============================================================================
// METADATA REGISTRY
// ============================================================================

const METADATA: &[ErrorMetadata] = &[
    // System
    ErrorMetadata::new(
        "ERR001",
        "System",
        Severity::Critical,
        false,
        true,
        "Internal engine failure",
        "Report the failure with the logged context",
    ),
    ErrorMetadata::new(
        "ERR002",
        "System",
        Severity::Critical,
        false,
        true,
        "Logging or engine initialization failed",
        "Check configuration files and environment overrides",
    ),
    // Rules
    ErrorMetadata::new(
        "E010",
        "Rules",
        Severity::High,
        false,
        true,
        "Rule definition failed validation",
        "Fix the match configuration for the rule's config type",
    ),
    ErrorMetadata::new(
        "E011",
        "Rules",
        Severity::High,
        false,
        true,
        "Feature registered twice for the same platform",
        "Remove or rename one of the conflicting rules",
    ),
    ErrorMetadata::new(
        "E012",
        "Rules",
        Severity::High,
        false,
        true,
        "Rule file could not be read",
        "Check the path and file permissions",
    ),
    ErrorMetadata::new(
        "E013",
        "Rules",
        Severity::High,
        false,
        true,
        "Rule file is not valid TOML or JSON",
        "Fix the syntax reported by the parser",
    ),
    ErrorMetadata::new(
        "E014",
        "Rules",
        Severity::High,
        false,
        true,
        "Custom rule names an extraction strategy that is not registered",
        "Register the strategy or correct the strategy name",
    ),
    ErrorMetadata::new(
        "E015",
        "Rules",
        Severity::Medium,
        false,
        true,
        "Rule set exceeds a compile-time limit",
        "Split the rule set or rebuild with a larger profile",
    ),
    // Snapshot
    ErrorMetadata::new(
        "E030",
        "Snapshot",
        Severity::Medium,
        true,
        false,
        "Device has no intended or actual snapshot",
        "Render the intended config or re-run the backup",
    ),
    ErrorMetadata::new(
        "E031",
        "Snapshot",
        Severity::Medium,
        true,
        false,
        "Snapshot content is not valid UTF-8",
        "Re-collect the snapshot with a text-safe transport",
    ),
    ErrorMetadata::new(
        "E032",
        "Snapshot",
        Severity::Medium,
        true,
        false,
        "Snapshot exceeds the configured size limit",
        "Trim the snapshot or raise max_snapshot_bytes",
    ),
    // Evaluation
    ErrorMetadata::new(
        "E050",
        "Evaluation",
        Severity::Medium,
        true,
        false,
        "Feature section could not be extracted",
        "Check that the rule's config type matches the snapshot format",
    ),
    ErrorMetadata::new(
        "E051",
        "Evaluation",
        Severity::High,
        true,
        false,
        "Differ failed on a feature section",
        "Inspect the rule failure context to reproduce",
    ),
    ErrorMetadata::new(
        "E052",
        "Evaluation",
        Severity::High,
        true,
        false,
        "Rule evaluation panicked",
        "Inspect the rule failure context to reproduce",
    ),
    // Batch
    ErrorMetadata::new(
        "E070",
        "Batch",
        Severity::Medium,
        true,
        false,
        "Device evaluation exceeded its time budget",
        "Raise the device timeout or narrow the rule set",
    ),
    ErrorMetadata::new(
        "E071",
        "Batch",
        Severity::Low,
        true,
        false,
        "Batch cancelled before the device was evaluated",
        "Re-run the batch for the cancelled devices",
    ),
    ErrorMetadata::new(
        "E072",
        "Batch",
        Severity::Medium,
        true,
        false,
        "Device identifier appears more than once in the batch",
        "De-duplicate the device list",
    ),
    ErrorMetadata::new(
        "E073",
        "Batch",
        Severity::High,
        true,
        false,
        "Worker thread terminated abnormally",
        "Inspect the logs around the failing device",
    ),
    ErrorMetadata::new(
        "E074",
        "Batch",
        Severity::High,
        false,
        true,
        "Engine configuration is outside allowed limits",
        "Adjust threads or timeouts to the compile-time limits",
    ),
    // Report
    ErrorMetadata::new(
        "E090",
        "Report",
        Severity::High,
        false,
        true,
        "Report serialization failed",
        "Report the failure with the logged context",
    ),
    ErrorMetadata::new(
        "E091",
        "Report",
        Severity::High,
        false,
        true,
        "Report could not be written",
        "Check the output path and permissions",
    ),
    ErrorMetadata::new(
        "E092",
        "Report",
        Severity::High,
        false,
        true,
        "Device manifest is invalid",
        "Fix the manifest entries reported by the parser",
    ),
    // Success
    ErrorMetadata::new(
        "I001",
        "System",
        Severity::Low,
        true,
        false,
        "Logging system initialized",
        "None",
    ),
    ErrorMetadata::new(
        "I010",
        "Rules",
        Severity::Low,
        true,
        false,
        "Rule files loaded",
        "None",
    ),
    ErrorMetadata::new(
        "I011",
        "Rules",
        Severity::Low,
        true,
        false,
        "Rule set built",
        "None",
    ),
    ErrorMetadata::new(
        "I030",
        "Evaluation",
        Severity::Low,
        true,
        false,
        "Device evaluated",
        "None",
    ),
    ErrorMetadata::new(
        "I050",
        "Batch",
        Severity::Low,
        true,
        false,
        "Batch completed",
        "None",
    ),
    ErrorMetadata::new(
        "I060",
        "Report",
        Severity::Low,
        true,
        false,
        "Report written",
        "None",
    ),
];

fn get_error_registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    static REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        METADATA
            .iter()
            .map(|metadata| (metadata.code, metadata.clone()))
            .collect()
    })
}

// ============================================================================
// CLASSIFICATION FUNCTIONS
// ============================================================================

/// Get metadata for a specific code
pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code)
}

/// Get severity from code
pub fn get_severity(code: &str) -> Severity {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.severity)
        .unwrap_or(Severity::Medium)
}

/// Check if error is recoverable
pub fn is_recoverable(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recoverable)
        .unwrap_or(true)
}

/// Check if error requires immediate halt
pub fn requires_halt(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.requires_halt)
        .unwrap_or(false)
}

/// Get human-readable description for code
pub fn get_description(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.description)
        .unwrap_or("Unknown error")
}

/// Get recommended action for code
pub fn get_action(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recommended_action)
        .unwrap_or("No specific action available")
}

/// Get category from code
pub fn get_category(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.category)
        .unwrap_or("Unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_code_constant_has_metadata() {
        let codes = [
            system::INTERNAL_ERROR,
            system::INITIALIZATION_FAILURE,
            rules::RULE_VALIDATION_FAILED,
            rules::DUPLICATE_RULE,
            rules::RULE_FILE_UNREADABLE,
            rules::RULE_FILE_MALFORMED,
            rules::UNKNOWN_STRATEGY,
            rules::RULE_LIMIT_EXCEEDED,
            snapshot::MISSING_SNAPSHOT,
            snapshot::UNREADABLE_SNAPSHOT,
            snapshot::SNAPSHOT_TOO_LARGE,
            evaluation::SECTION_PARSE_FAILED,
            evaluation::DIFF_INTERNAL_ERROR,
            evaluation::RULE_PANICKED,
            batch::DEVICE_TIMEOUT,
            batch::BATCH_CANCELLED,
            batch::DUPLICATE_DEVICE,
            batch::WORKER_PANIC,
            batch::INVALID_ENGINE_CONFIG,
            report::REPORT_SERIALIZATION_FAILED,
            report::REPORT_WRITE_FAILED,
            report::MANIFEST_INVALID,
            success::SYSTEM_INITIALIZATION_COMPLETED,
            success::RULES_LOADED,
            success::RULE_SET_BUILT,
            success::DEVICE_EVALUATED,
            success::BATCH_COMPLETED,
            success::REPORT_WRITTEN,
        ];

        for code in codes {
            assert!(
                get_error_metadata(code.as_str()).is_some(),
                "missing metadata for {}",
                code
            );
        }
    }

    #[test]
    fn test_codes_are_unique() {
        assert_eq!(get_error_registry().len(), METADATA.len());
    }

    #[test]
    fn test_unknown_code_defaults() {
        assert_eq!(get_description("X999"), "Unknown error");
        assert_eq!(get_category("X999"), "Unknown");
        assert!(is_recoverable("X999"));
        assert!(!requires_halt("X999"));
    }

    #[test]
    fn test_classification() {
        assert_eq!(get_severity("ERR001"), Severity::Critical);
        assert!(requires_halt("E011"));
        assert!(is_recoverable("E031"));
        assert_eq!(get_category("E070"), "Batch");
    }
}
