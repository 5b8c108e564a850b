//! # Results Module
//!
//! Result types, aggregation and report formatting.

pub mod aggregator;
pub mod error;
pub mod generator;
pub mod types;

pub use aggregator::{aggregate_fleet, sort_reports, summarize_device};
pub use error::ReportError;
pub use generator::{ReportFormat, ReportGenerator};
pub use types::{
    BatchReport, ComplianceResult, DeviceComplianceSummary, DeviceErrorCode, DeviceFailure,
    DeviceReport, DiffSet, FailureKind, FeatureTally, FleetSummary, MisorderedLine, RuleFailure,
    RuleOutcome,
};
