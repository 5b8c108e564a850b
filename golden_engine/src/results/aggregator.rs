//! # Compliance Aggregator
//!
//! Folds rule outcomes into device summaries and device reports into the
//! fleet summary. Device reports are sorted before any floating-point sum,
//! so the fleet numbers do not depend on evaluation order.

use super::types::{
    DeviceComplianceSummary, DeviceReport, FeatureTally, FleetSummary, RuleOutcome,
};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Build a device summary from its rule outcomes
pub fn summarize_device(
    device: &str,
    platform: &str,
    mut outcomes: Vec<RuleOutcome>,
) -> DeviceComplianceSummary {
    outcomes.sort_by(|a, b| a.feature_name().cmp(b.feature_name()));

    let mut compliant_rules = 0;
    let mut non_compliant_rules = 0;
    let mut failed_rules = 0;
    for outcome in &outcomes {
        match outcome {
            RuleOutcome::Evaluated(result) if result.compliant => compliant_rules += 1,
            RuleOutcome::Evaluated(_) => non_compliant_rules += 1,
            RuleOutcome::Failed(_) => failed_rules += 1,
        }
    }

    // Failed rules stay in the denominator
    let total_rules = outcomes.len();
    let compliance_percent = if total_rules == 0 {
        None
    } else {
        Some(100.0 * compliant_rules as f64 / total_rules as f64)
    };

    DeviceComplianceSummary {
        device: device.to_string(),
        platform: platform.to_string(),
        total_rules,
        outcomes,
        compliant_rules,
        non_compliant_rules,
        failed_rules,
        compliance_percent,
        compliant: failed_rules == 0 && non_compliant_rules == 0,
    }
}

/// Canonical report order: device id, then platform
pub fn sort_reports(reports: &mut [DeviceReport]) {
    reports.sort_by(compare_reports);
}

fn compare_reports(a: &DeviceReport, b: &DeviceReport) -> Ordering {
    a.device()
        .cmp(b.device())
        .then_with(|| a.platform().cmp(b.platform()))
}

/// Fleet-wide tallies; input order does not affect the result
pub fn aggregate_fleet(reports: &[DeviceReport]) -> FleetSummary {
    let mut ordered: Vec<&DeviceReport> = reports.iter().collect();
    ordered.sort_by(|a, b| compare_reports(a, b));

    let mut fleet = FleetSummary {
        total_devices: reports.len(),
        ..FleetSummary::default()
    };
    let mut per_feature: BTreeMap<String, FeatureTally> = BTreeMap::new();
    let mut percent_sum = 0.0;
    let mut percent_count = 0usize;

    for report in ordered {
        let summary = match report {
            DeviceReport::Error(_) => {
                fleet.errored_devices += 1;
                continue;
            }
            DeviceReport::Summary(summary) => summary,
        };

        if summary.compliant {
            fleet.compliant_devices += 1;
        }
        if let Some(percent) = summary.compliance_percent {
            percent_sum += percent;
            percent_count += 1;
        }

        for outcome in &summary.outcomes {
            let tally = per_feature
                .entry(outcome.feature_name().to_string())
                .or_default();
            tally.total_count += 1;
            match outcome {
                RuleOutcome::Evaluated(result) if result.compliant => tally.compliant_count += 1,
                RuleOutcome::Evaluated(_) => {}
                RuleOutcome::Failed(_) => tally.error_count += 1,
            }
        }
    }

    fleet.mean_compliance_percent = if percent_count == 0 {
        None
    } else {
        Some(percent_sum / percent_count as f64)
    };
    fleet.per_feature = per_feature;
    fleet
}
