//! # Compliance Result Types
//!
//! Serialized shapes of per-rule, per-device and fleet results. Every map is
//! a `BTreeMap` and no field is skipped, so reports are byte-stable and
//! round-trip through `serde_json`.

use crate::types::FeatureSection;
use chrono::{DateTime, Utc};
use golden_rules::ConfigType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Diff data
// ============================================================================

/// Lines (CLI rules) or flattened path/value pairs (JSON rules)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiffSet {
    Lines(Vec<String>),
    Fields(BTreeMap<String, Value>),
}

impl DiffSet {
    pub fn is_empty(&self) -> bool {
        match self {
            DiffSet::Lines(lines) => lines.is_empty(),
            DiffSet::Fields(fields) => fields.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            DiffSet::Lines(lines) => lines.len(),
            DiffSet::Fields(fields) => fields.len(),
        }
    }

    pub fn lines(&self) -> Option<&[String]> {
        match self {
            DiffSet::Lines(lines) => Some(lines),
            DiffSet::Fields(_) => None,
        }
    }

    pub fn fields(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            DiffSet::Fields(fields) => Some(fields),
            DiffSet::Lines(_) => None,
        }
    }
}

/// A line present on both sides at different relative positions (ORDERED rules)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MisorderedLine {
    pub line: String,
    /// Index in the intended section's lines
    pub intended_position: usize,
    /// Index in the actual section's lines
    pub actual_position: usize,
}

// ============================================================================
// Per-rule results
// ============================================================================

/// Outcome of comparing one feature on one device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub feature_name: String,
    pub platform: String,
    pub config_type: ConfigType,
    pub ordered: bool,
    pub compliant: bool,
    /// 1 when compliant, else 0
    pub compliance_int: u8,
    pub intended: FeatureSection,
    pub actual: FeatureSection,
    pub missing: DiffSet,
    pub extra: DiffSet,
    pub misordered: Vec<MisorderedLine>,
    pub remediation_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Parse,
    Internal,
}

/// A rule that could not be evaluated on a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleFailure {
    pub feature_name: String,
    pub config_type: ConfigType,
    pub kind: FailureKind,
    pub message: String,
    pub context: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RuleOutcome {
    Evaluated(ComplianceResult),
    Failed(RuleFailure),
}

impl RuleOutcome {
    pub fn feature_name(&self) -> &str {
        match self {
            RuleOutcome::Evaluated(result) => &result.feature_name,
            RuleOutcome::Failed(failure) => &failure.feature_name,
        }
    }

    pub fn result(&self) -> Option<&ComplianceResult> {
        match self {
            RuleOutcome::Evaluated(result) => Some(result),
            RuleOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&RuleFailure> {
        match self {
            RuleOutcome::Failed(failure) => Some(failure),
            RuleOutcome::Evaluated(_) => None,
        }
    }
}

// ============================================================================
// Per-device results
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceComplianceSummary {
    pub device: String,
    pub platform: String,
    /// Ordered by feature name
    pub outcomes: Vec<RuleOutcome>,
    pub total_rules: usize,
    pub compliant_rules: usize,
    pub non_compliant_rules: usize,
    pub failed_rules: usize,
    /// Compliant share of all applicable rules; `None` when none apply
    pub compliance_percent: Option<f64>,
    pub compliant: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceErrorCode {
    MissingSnapshot,
    UnreadableSnapshot,
    SnapshotTooLarge,
    DuplicateDevice,
    Timeout,
    Cancelled,
    WorkerPanic,
}

impl DeviceErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceErrorCode::MissingSnapshot => "missing_snapshot",
            DeviceErrorCode::UnreadableSnapshot => "unreadable_snapshot",
            DeviceErrorCode::SnapshotTooLarge => "snapshot_too_large",
            DeviceErrorCode::DuplicateDevice => "duplicate_device",
            DeviceErrorCode::Timeout => "timeout",
            DeviceErrorCode::Cancelled => "cancelled",
            DeviceErrorCode::WorkerPanic => "worker_panic",
        }
    }

    /// Logging code for this device error
    pub fn log_code(&self) -> golden_rules::logging::Code {
        use golden_rules::logging::codes;
        match self {
            DeviceErrorCode::MissingSnapshot => codes::snapshot::MISSING_SNAPSHOT,
            DeviceErrorCode::UnreadableSnapshot => codes::snapshot::UNREADABLE_SNAPSHOT,
            DeviceErrorCode::SnapshotTooLarge => codes::snapshot::SNAPSHOT_TOO_LARGE,
            DeviceErrorCode::DuplicateDevice => codes::batch::DUPLICATE_DEVICE,
            DeviceErrorCode::Timeout => codes::batch::DEVICE_TIMEOUT,
            DeviceErrorCode::Cancelled => codes::batch::BATCH_CANCELLED,
            DeviceErrorCode::WorkerPanic => codes::batch::WORKER_PANIC,
        }
    }
}

impl fmt::Display for DeviceErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A device that could not be evaluated at all
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceFailure {
    pub device: String,
    pub platform: String,
    pub code: DeviceErrorCode,
    pub reason: String,
}

impl DeviceFailure {
    pub fn new(
        device: impl Into<String>,
        platform: impl Into<String>,
        code: DeviceErrorCode,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            device: device.into(),
            platform: platform.into(),
            code,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "report", rename_all = "snake_case")]
pub enum DeviceReport {
    Summary(DeviceComplianceSummary),
    Error(DeviceFailure),
}

impl DeviceReport {
    pub fn device(&self) -> &str {
        match self {
            DeviceReport::Summary(summary) => &summary.device,
            DeviceReport::Error(failure) => &failure.device,
        }
    }

    pub fn platform(&self) -> &str {
        match self {
            DeviceReport::Summary(summary) => &summary.platform,
            DeviceReport::Error(failure) => &failure.platform,
        }
    }

    pub fn summary(&self) -> Option<&DeviceComplianceSummary> {
        match self {
            DeviceReport::Summary(summary) => Some(summary),
            DeviceReport::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&DeviceFailure> {
        match self {
            DeviceReport::Error(failure) => Some(failure),
            DeviceReport::Summary(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, DeviceReport::Error(_))
    }
}

// ============================================================================
// Fleet results
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureTally {
    pub compliant_count: usize,
    /// Devices the feature applied to, including failed evaluations
    pub total_count: usize,
    pub error_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetSummary {
    pub total_devices: usize,
    pub compliant_devices: usize,
    pub errored_devices: usize,
    /// Mean of device percentages; errored devices are excluded
    pub mean_compliance_percent: Option<f64>,
    pub per_feature: BTreeMap<String, FeatureTally>,
}

/// Complete output of one engine run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: String,
    pub generated_by: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub cancelled: bool,
    /// Sorted by device id, then platform
    pub devices: Vec<DeviceReport>,
    pub fleet: FleetSummary,
}

impl BatchReport {
    pub fn has_errors(&self) -> bool {
        self.devices.iter().any(|report| match report {
            DeviceReport::Error(_) => true,
            DeviceReport::Summary(summary) => summary.failed_rules > 0,
        })
    }

    pub fn has_non_compliant(&self) -> bool {
        self.devices
            .iter()
            .filter_map(DeviceReport::summary)
            .any(|summary| summary.non_compliant_rules > 0)
    }

    pub fn find_device(&self, device: &str) -> Option<&DeviceReport> {
        self.devices.iter().find(|report| report.device() == device)
    }
}
