//! # Golden Engine - Configuration Compliance Engine
//!
//! Sections intended and actual device configurations per rule, diffs them,
//! aggregates per-device and fleet compliance and formats the report.

pub mod api;
pub mod differ;
pub mod execution;
pub mod results;
pub mod sectioner;
pub mod strategies;
pub mod types;

// Convenience re-exports
pub use api::{ComplianceEngine, EngineConfig, EngineError};
pub use execution::CancellationToken;
pub use results::{BatchReport, DeviceReport, ReportError, ReportFormat, ReportGenerator};
pub use strategies::{ExtractorRegistry, SectionExtractor};
pub use types::{ConfigSnapshot, DeviceInput, SnapshotContent, SnapshotKind};

pub mod prelude {
    pub use crate::api::{ComplianceEngine, EngineConfig, EngineError};
    pub use crate::execution::CancellationToken;

    pub use crate::results::{
        BatchReport, ComplianceResult, DeviceComplianceSummary, DeviceErrorCode, DeviceReport,
        FleetSummary, ReportFormat, ReportGenerator, RuleOutcome,
    };

    pub use crate::strategies::{ExtractorRegistry, ParseError, SectionExtractor};

    pub use crate::types::{
        ConfigSnapshot, DeviceInput, FeatureSection, PreparedSnapshot, SnapshotContent,
        SnapshotKind,
    };

    pub use golden_rules::{ComplianceRule, ConfigType, RuleDefinition, RuleSet};
}
