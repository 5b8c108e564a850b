// src/execution/evaluator.rs
//! Per-device evaluation
//!
//! Prepares both snapshots once, then runs sectioner and differ for every
//! rule of the device's platform. Rule failures are isolated: a parse error,
//! an internal diff error or a panic becomes a [`RuleFailure`] and the
//! remaining rules still run. Snapshot problems fail the whole device.

use crate::differ::{diff_sections, InternalError};
use crate::results::{
    summarize_device, ComplianceResult, DeviceErrorCode, DeviceFailure, DeviceReport,
    FailureKind, RuleFailure, RuleOutcome,
};
use crate::sectioner::extract_section;
use crate::strategies::{ExtractorRegistry, ParseError};
use crate::types::{ConfigSnapshot, DeviceInput, PreparedSnapshot, SnapshotError, SnapshotKind};
use golden_rules::logging::codes;
use golden_rules::{ComplianceRule, RuleSet};
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

/// Evaluate one device against the rules of its platform.
///
/// `deadline` is checked between rules; once it passes the device is
/// reported as timed out.
pub fn evaluate_device(
    input: &DeviceInput,
    rules: &RuleSet,
    extractors: &ExtractorRegistry,
    deadline: Option<Instant>,
) -> DeviceReport {
    golden_rules::logging::with_device_context(&input.device, || {
        let report = evaluate_in_context(input, rules, extractors, deadline);
        match &report {
            DeviceReport::Summary(summary) => {
                golden_rules::log_success!(codes::success::DEVICE_EVALUATED, "Device evaluated",
                    "platform" => &summary.platform,
                    "rules" => summary.total_rules,
                    "compliant" => summary.compliant_rules,
                    "non_compliant" => summary.non_compliant_rules,
                    "failed" => summary.failed_rules
                );
            }
            DeviceReport::Error(failure) => log_device_failure(failure),
        }
        report
    })
}

pub(crate) fn log_device_failure(failure: &DeviceFailure) {
    golden_rules::log_error!(failure.code.log_code(), "Device not evaluated",
        "device" => &failure.device,
        "platform" => &failure.platform,
        "error" => failure.code,
        "reason" => &failure.reason
    );
}

fn evaluate_in_context(
    input: &DeviceInput,
    rules: &RuleSet,
    extractors: &ExtractorRegistry,
    deadline: Option<Instant>,
) -> DeviceReport {
    let fail = |code: DeviceErrorCode, reason: String| {
        DeviceReport::Error(DeviceFailure::new(&input.device, &input.platform, code, reason))
    };

    let (intended, actual) = match (&input.intended, &input.actual) {
        (Some(intended), Some(actual)) => (intended, actual),
        (None, _) => {
            return fail(
                DeviceErrorCode::MissingSnapshot,
                "intended snapshot not provided".to_string(),
            )
        }
        (_, None) => {
            return fail(
                DeviceErrorCode::MissingSnapshot,
                "actual snapshot not provided".to_string(),
            )
        }
    };

    warn_on_platform_mismatch(input, intended);
    warn_on_platform_mismatch(input, actual);

    let cleaner = rules.cleaner_for(&input.platform);
    let intended = match PreparedSnapshot::prepare(intended, cleaner) {
        Ok(prepared) => prepared,
        Err(e) => return fail(snapshot_error_code(&e), e.to_string()),
    };
    let actual = match PreparedSnapshot::prepare(actual, cleaner) {
        Ok(prepared) => prepared,
        Err(e) => return fail(snapshot_error_code(&e), e.to_string()),
    };

    let applicable = rules.rules_for_platform(&input.platform);
    if applicable.is_empty() {
        golden_rules::log_warning!("No rules for platform", "platform" => &input.platform);
    }

    let mut outcomes = Vec::with_capacity(applicable.len());
    for (index, rule) in applicable.iter().enumerate() {
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                return fail(
                    DeviceErrorCode::Timeout,
                    format!(
                        "deadline reached after {} of {} rules",
                        index,
                        applicable.len()
                    ),
                );
            }
        }

        outcomes.push(evaluate_rule(input, rule, &intended, &actual, extractors));
    }

    DeviceReport::Summary(summarize_device(&input.device, &input.platform, outcomes))
}

fn warn_on_platform_mismatch(input: &DeviceInput, snapshot: &ConfigSnapshot) {
    if !snapshot.platform.is_empty() && !snapshot.platform.eq_ignore_ascii_case(&input.platform) {
        golden_rules::log_warning!("Snapshot platform differs from device platform",
            "snapshot" => snapshot.kind,
            "snapshot_platform" => &snapshot.platform,
            "device_platform" => &input.platform
        );
    }
}

fn snapshot_error_code(error: &SnapshotError) -> DeviceErrorCode {
    match error {
        SnapshotError::Unreadable { .. } => DeviceErrorCode::UnreadableSnapshot,
        SnapshotError::TooLarge { .. } | SnapshotError::TooManyLines { .. } => {
            DeviceErrorCode::SnapshotTooLarge
        }
    }
}

enum RuleEvaluationError {
    Parse { kind: SnapshotKind, error: ParseError },
    Internal(InternalError),
}

/// Run one rule with panic isolation
fn evaluate_rule(
    input: &DeviceInput,
    rule: &ComplianceRule,
    intended: &PreparedSnapshot,
    actual: &PreparedSnapshot,
    extractors: &ExtractorRegistry,
) -> RuleOutcome {
    let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
        compare(rule, intended, actual, extractors)
    }));

    match attempt {
        Ok(Ok(result)) => {
            golden_rules::log_debug!("Rule evaluated",
                "feature" => rule.feature_name(),
                "compliant" => result.compliant
            );
            RuleOutcome::Evaluated(result)
        }
        Ok(Err(RuleEvaluationError::Parse { kind, error })) => {
            let mut context = rule_context(input, rule);
            context.insert("snapshot".to_string(), kind.to_string());
            context.extend(error.context());

            golden_rules::log_error!(codes::evaluation::SECTION_PARSE_FAILED, "Section extraction failed",
                "feature" => rule.feature_name(),
                "snapshot" => kind,
                "reason" => &error
            );
            RuleOutcome::Failed(failure(rule, FailureKind::Parse, error.to_string(), context))
        }
        Ok(Err(RuleEvaluationError::Internal(error))) => {
            let mut context = rule_context(input, rule);
            context.extend(error.context());

            golden_rules::log_error!(codes::evaluation::DIFF_INTERNAL_ERROR, "Diff failed",
                "feature" => rule.feature_name(),
                "reason" => &error
            );
            RuleOutcome::Failed(failure(rule, FailureKind::Internal, error.to_string(), context))
        }
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            let mut context = rule_context(input, rule);
            context.insert("panic".to_string(), reason.clone());

            golden_rules::log_error!(codes::evaluation::RULE_PANICKED, "Rule evaluation panicked",
                "feature" => rule.feature_name(),
                "reason" => &reason
            );
            RuleOutcome::Failed(failure(
                rule,
                FailureKind::Internal,
                format!("rule evaluation panicked: {}", reason),
                context,
            ))
        }
    }
}

fn compare(
    rule: &ComplianceRule,
    intended: &PreparedSnapshot,
    actual: &PreparedSnapshot,
    extractors: &ExtractorRegistry,
) -> Result<ComplianceResult, RuleEvaluationError> {
    let intended_section = extract_section(intended, rule, extractors).map_err(|error| RuleEvaluationError::Parse {
        kind: SnapshotKind::Intended,
        error,
    })?;
    let actual_section = extract_section(actual, rule, extractors).map_err(|error| RuleEvaluationError::Parse {
        kind: SnapshotKind::Actual,
        error,
    })?;

    let diff = diff_sections(&intended_section, &actual_section, rule).map_err(RuleEvaluationError::Internal)?;
    let compliant = diff.is_compliant();

    Ok(ComplianceResult {
        feature_name: rule.feature_name().to_string(),
        platform: rule.platform().to_string(),
        config_type: rule.config_type(),
        ordered: rule.is_ordered(),
        compliant,
        compliance_int: u8::from(compliant),
        intended: intended_section,
        actual: actual_section,
        missing: diff.missing,
        extra: diff.extra,
        misordered: diff.misordered,
        remediation_enabled: rule.remediation_enabled(),
    })
}

fn rule_context(input: &DeviceInput, rule: &ComplianceRule) -> BTreeMap<String, String> {
    let mut context = BTreeMap::new();
    context.insert("device".to_string(), input.device.clone());
    context.insert("platform".to_string(), input.platform.clone());
    context.insert("feature".to_string(), rule.feature_name().to_string());
    context.insert("config_type".to_string(), rule.config_type().to_string());
    context.insert("match".to_string(), rule.match_summary());
    context
}

fn failure(
    rule: &ComplianceRule,
    kind: FailureKind,
    message: String,
    context: BTreeMap<String, String>,
) -> RuleFailure {
    RuleFailure {
        feature_name: rule.feature_name().to_string(),
        config_type: rule.config_type(),
        kind,
        message,
        context,
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::SectionExtractor;
    use crate::types::FeatureSection;
    use assert_matches::assert_matches;
    use golden_rules::{ConfigType, RuleDefinition};

    struct PanickingExtractor;

    impl SectionExtractor for PanickingExtractor {
        fn strategy_name(&self) -> &str {
            "explode"
        }

        fn extract(
            &self,
            _snapshot: &PreparedSnapshot,
            _rule: &ComplianceRule,
        ) -> Result<FeatureSection, ParseError> {
            panic!("extractor bug")
        }
    }

    fn rules() -> RuleSet {
        let mut builder = RuleSet::builder();
        builder
            .register_definition(
                RuleDefinition::new("ntp", "cisco_ios", ConfigType::Ordered).with_anchors(["ntp"]),
            )
            .unwrap();
        builder
            .register_definition(
                RuleDefinition::new("aaa", "cisco_ios", ConfigType::UnorderedSingleLine)
                    .with_anchors(["aaa"]),
            )
            .unwrap();
        builder
            .register_definition(
                RuleDefinition::new("zz_custom", "cisco_ios", ConfigType::Custom).with_strategy("explode"),
            )
            .unwrap();
        builder.build()
    }

    fn input(intended: &str, actual: &str) -> DeviceInput {
        DeviceInput::new("r1", "cisco_ios")
            .with_intended(ConfigSnapshot::text("r1", "cisco_ios", SnapshotKind::Intended, intended))
            .with_actual(ConfigSnapshot::text("r1", "cisco_ios", SnapshotKind::Actual, actual))
    }

    fn extractors() -> ExtractorRegistry {
        let mut registry = ExtractorRegistry::with_builtins();
        registry.register(Box::new(PanickingExtractor)).unwrap();
        registry
    }

    #[test]
    fn test_panicking_rule_is_isolated() {
        let report = evaluate_device(
            &input("ntp server 1.1.1.1\naaa new-model", "ntp server 1.1.1.1\naaa new-model"),
            &rules(),
            &extractors(),
            None,
        );
        let summary = report.summary().unwrap();

        assert_eq!(summary.total_rules, 3);
        assert_eq!(summary.compliant_rules, 2);
        assert_eq!(summary.failed_rules, 1);
        assert!(!summary.compliant);

        let failure = summary.outcomes[2].failure().unwrap();
        assert_eq!(failure.feature_name, "zz_custom");
        assert_eq!(failure.kind, FailureKind::Internal);
        assert_eq!(failure.context.get("panic").map(String::as_str), Some("extractor bug"));
        assert_eq!(failure.context.get("device").map(String::as_str), Some("r1"));
    }

    #[test]
    fn test_missing_snapshot_fails_device() {
        let input = DeviceInput::new("r1", "cisco_ios").with_actual(ConfigSnapshot::text(
            "r1",
            "cisco_ios",
            SnapshotKind::Actual,
            "",
        ));
        let report = evaluate_device(&input, &rules(), &extractors(), None);
        assert_matches!(
            report,
            DeviceReport::Error(DeviceFailure { code: DeviceErrorCode::MissingSnapshot, .. })
        );
    }

    #[test]
    fn test_unreadable_snapshot_fails_device() {
        let input = DeviceInput::new("r1", "cisco_ios")
            .with_intended(ConfigSnapshot::text("r1", "cisco_ios", SnapshotKind::Intended, "ntp server a"))
            .with_actual(ConfigSnapshot::raw("r1", "cisco_ios", SnapshotKind::Actual, vec![0xc3, 0x28]));
        let report = evaluate_device(&input, &rules(), &extractors(), None);
        assert_matches!(
            report,
            DeviceReport::Error(DeviceFailure { code: DeviceErrorCode::UnreadableSnapshot, .. })
        );
    }

    #[test]
    fn test_expired_deadline_times_out() {
        let report = evaluate_device(
            &input("ntp server a", "ntp server a"),
            &rules(),
            &extractors(),
            Some(Instant::now()),
        );
        assert_matches!(
            report,
            DeviceReport::Error(DeviceFailure { code: DeviceErrorCode::Timeout, .. })
        );
    }

    #[test]
    fn test_result_fields() {
        let report = evaluate_device(
            &input("ntp server a\nntp server b", "ntp server b"),
            &rules(),
            &extractors(),
            None,
        );
        let summary = report.summary().unwrap();
        let ntp = summary
            .outcomes
            .iter()
            .find_map(|o| o.result().filter(|r| r.feature_name == "ntp"))
            .unwrap();

        assert!(!ntp.compliant);
        assert_eq!(ntp.compliance_int, 0);
        assert!(ntp.ordered);
        assert_eq!(ntp.missing.lines().unwrap(), ["ntp server a"]);
        assert!(ntp.extra.is_empty());
    }
}
