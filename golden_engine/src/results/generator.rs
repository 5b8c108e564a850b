//! # Report Formatter
//!
//! Renders a [`BatchReport`] as pretty JSON, compact JSON or a plain-text
//! summary table.

use super::error::ReportError;
use super::types::{BatchReport, DeviceReport, RuleOutcome};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Pretty,
    Compact,
    Summary,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Pretty => "pretty",
            ReportFormat::Compact => "compact",
            ReportFormat::Summary => "summary",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "json" => Ok(ReportFormat::Pretty),
            "compact" => Ok(ReportFormat::Compact),
            "summary" | "text" => Ok(ReportFormat::Summary),
            other => Err(format!("unknown report format '{}'", other)),
        }
    }
}

/// Report renderer
pub struct ReportGenerator;

impl ReportGenerator {
    pub fn render(report: &BatchReport, format: ReportFormat) -> Result<String, ReportError> {
        match format {
            ReportFormat::Pretty => {
                serde_json::to_string_pretty(report).map_err(|e| ReportError::Serialization {
                    format: format.as_str(),
                    reason: e.to_string(),
                })
            }
            ReportFormat::Compact => {
                serde_json::to_string(report).map_err(|e| ReportError::Serialization {
                    format: format.as_str(),
                    reason: e.to_string(),
                })
            }
            ReportFormat::Summary => Ok(Self::render_summary(report)),
        }
    }

    /// Render and write to a file
    pub fn write_to(report: &BatchReport, format: ReportFormat, path: &Path) -> Result<(), ReportError> {
        let mut rendered = Self::render(report, format)?;
        if !rendered.ends_with('\n') {
            rendered.push('\n');
        }

        fs::write(path, rendered).map_err(|source| ReportError::Write {
            path: path.display().to_string(),
            source,
        })?;

        golden_rules::log_success!(
            golden_rules::logging::codes::success::REPORT_WRITTEN,
            "Report written",
            "path" => path.display(),
            "format" => format.as_str(),
            "devices" => report.devices.len()
        );
        Ok(())
    }

    /// Parse a JSON report produced by `render`
    pub fn from_json(content: &str) -> Result<BatchReport, ReportError> {
        serde_json::from_str(content).map_err(|e| ReportError::Parse {
            reason: e.to_string(),
        })
    }

    fn render_summary(report: &BatchReport) -> String {
        let fleet = &report.fleet;
        let mut out = String::new();

        let _ = writeln!(
            out,
            "Compliance run {} on {} ({} ms){}",
            report.run_id,
            report.generated_by,
            report.duration_ms,
            if report.cancelled { " [cancelled]" } else { "" }
        );
        let _ = writeln!(
            out,
            "Devices: {} total, {} compliant, {} errored, mean compliance {}",
            fleet.total_devices,
            fleet.compliant_devices,
            fleet.errored_devices,
            format_percent(fleet.mean_compliance_percent)
        );
        out.push('\n');

        let _ = writeln!(
            out,
            "{:<24} {:<16} {:<14} {:>8}  DETAIL",
            "DEVICE", "PLATFORM", "STATUS", "PERCENT"
        );
        for device in &report.devices {
            let (status, percent, detail) = match device {
                DeviceReport::Error(failure) => (
                    "error",
                    "-".to_string(),
                    format!("{}: {}", failure.code, failure.reason),
                ),
                DeviceReport::Summary(summary) => {
                    let status = if summary.compliant {
                        "compliant"
                    } else if summary.non_compliant_rules > 0 {
                        "non_compliant"
                    } else {
                        "rule_errors"
                    };
                    (status, format_percent(summary.compliance_percent), describe_outcomes(&summary.outcomes))
                }
            };
            let _ = writeln!(
                out,
                "{:<24} {:<16} {:<14} {:>8}  {}",
                device.device(),
                device.platform(),
                status,
                percent,
                detail
            );
        }

        if !fleet.per_feature.is_empty() {
            out.push('\n');
            let _ = writeln!(out, "{:<32} {:>9} {:>6} {:>6}", "FEATURE", "COMPLIANT", "TOTAL", "ERRORS");
            for (feature, tally) in &fleet.per_feature {
                let _ = writeln!(
                    out,
                    "{:<32} {:>9} {:>6} {:>6}",
                    feature, tally.compliant_count, tally.total_count, tally.error_count
                );
            }
        }

        out
    }
}

fn format_percent(percent: Option<f64>) -> String {
    percent
        .map(|p| format!("{:.1}%", p))
        .unwrap_or_else(|| "-".to_string())
}

/// Non-compliant features, then failed ones marked as such
fn describe_outcomes(outcomes: &[RuleOutcome]) -> String {
    let mut parts: Vec<String> = Vec::new();
    for outcome in outcomes {
        match outcome {
            RuleOutcome::Evaluated(result) if !result.compliant => {
                parts.push(result.feature_name.clone())
            }
            RuleOutcome::Failed(failure) => parts.push(format!("{} (failed)", failure.feature_name)),
            RuleOutcome::Evaluated(_) => {}
        }
    }
    parts.join(", ")
}
