//! # Compliance Engine
//!
//! Evaluates a batch of devices against an immutable rule set and returns a
//! sorted, aggregated [`BatchReport`].
use super::config::EngineConfig;
use super::errors::EngineError;
use crate::execution::{evaluate_all, evaluate_device, CancellationToken, PoolSettings};
use crate::results::{
    aggregate_fleet, sort_reports, BatchReport, DeviceErrorCode, DeviceFailure, DeviceReport,
};
use crate::strategies::ExtractorRegistry;
use crate::types::DeviceInput;
use chrono::Utc;
use golden_rules::config::compile_time::batch::MAX_DEVICES_PER_BATCH;
use golden_rules::logging::codes;
use golden_rules::RuleSet;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Batch compliance engine
#[derive(Debug)]
pub struct ComplianceEngine {
    rules: Arc<RuleSet>,
    extractors: Arc<ExtractorRegistry>,
    config: EngineConfig,
}

impl ComplianceEngine {
    /// Create an engine, checking the config and that every custom
    /// strategy referenced by the rules has an extractor
    pub fn new(
        rules: RuleSet,
        extractors: ExtractorRegistry,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        extractors.validate_rule_set(&rules).map_err(|e| {
            let error = EngineError::from(e);
            golden_rules::log_error!(error.code(), "Engine rejected rule set", "reason" => &error);
            error
        })?;

        golden_rules::log_info!("Compliance engine ready",
            "rules" => rules.len(),
            "extractors" => extractors.names().join(","),
            "threads" => config.max_threads
        );

        Ok(Self {
            rules: Arc::new(rules),
            extractors: Arc::new(extractors),
            config,
        })
    }

    /// Engine with built-in extractors and default configuration
    pub fn with_defaults(rules: RuleSet) -> Result<Self, EngineError> {
        Self::new(rules, ExtractorRegistry::with_builtins(), EngineConfig::default())
    }

    pub fn run(&self, inputs: Vec<DeviceInput>) -> Result<BatchReport, EngineError> {
        self.run_with_cancellation(inputs, &CancellationToken::new())
    }

    /// Evaluate a batch; devices not started before `token` is cancelled are
    /// reported as cancelled
    pub fn run_with_cancellation(
        &self,
        inputs: Vec<DeviceInput>,
        token: &CancellationToken,
    ) -> Result<BatchReport, EngineError> {
        if inputs.len() > MAX_DEVICES_PER_BATCH {
            return Err(EngineError::TooManyDevices {
                count: inputs.len(),
                limit: MAX_DEVICES_PER_BATCH,
            });
        }

        let started_at = Utc::now();
        let timer = Instant::now();
        let total = inputs.len();

        golden_rules::log_info!("Batch started", "devices" => total);

        let mut occurrences: HashMap<String, usize> = HashMap::new();
        for input in &inputs {
            *occurrences.entry(input.device.clone()).or_default() += 1;
        }

        let mut reports = Vec::with_capacity(total);
        let mut runnable = Vec::with_capacity(total);
        for input in inputs {
            let count = occurrences.get(&input.device).copied().unwrap_or(0);
            if count > 1 {
                let failure = DeviceFailure::new(
                    &input.device,
                    &input.platform,
                    DeviceErrorCode::DuplicateDevice,
                    format!("device id appears {} times in the batch", count),
                );
                golden_rules::log_error!(codes::batch::DUPLICATE_DEVICE, "Duplicate device in batch",
                    "device" => &failure.device,
                    "occurrences" => count
                );
                reports.push(DeviceReport::Error(failure));
            } else {
                runnable.push(Arc::new(input));
            }
        }

        let settings = PoolSettings {
            threads: self.config.max_threads,
            device_timeout: self.config.device_timeout,
            progress_reporting: self.config.progress_reporting,
        };
        reports.extend(evaluate_all(
            &runnable,
            &self.rules,
            &self.extractors,
            settings,
            token,
        ));

        sort_reports(&mut reports);
        let fleet = aggregate_fleet(&reports);
        let cancelled = token.is_cancelled()
            || reports
                .iter()
                .any(|r| r.error().map(|e| e.code) == Some(DeviceErrorCode::Cancelled));

        let report = BatchReport {
            run_id: uuid::Uuid::new_v4().to_string(),
            generated_by: hostname::get()
                .ok()
                .and_then(|name| name.into_string().ok())
                .unwrap_or_else(|| "unknown".to_string()),
            started_at,
            finished_at: Utc::now(),
            duration_ms: u64::try_from(timer.elapsed().as_millis()).unwrap_or(u64::MAX),
            cancelled,
            devices: reports,
            fleet,
        };

        golden_rules::log_success!(codes::success::BATCH_COMPLETED, "Batch completed",
            "run_id" => &report.run_id,
            "devices" => report.fleet.total_devices,
            "compliant" => report.fleet.compliant_devices,
            "errored" => report.fleet.errored_devices,
            "cancelled" => report.cancelled,
            "duration_ms" => report.duration_ms
        );

        Ok(report)
    }

    /// Evaluate a single device on the caller thread
    pub fn evaluate_device(&self, input: &DeviceInput) -> DeviceReport {
        let deadline = self.config.device_timeout.map(|t| Instant::now() + t);
        evaluate_device(input, &self.rules, &self.extractors, deadline)
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn extractors(&self) -> &ExtractorRegistry {
        &self.extractors
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{DiffSet, FailureKind};
    use crate::strategies::{ParseError, SectionExtractor};
    use crate::types::{ConfigSnapshot, FeatureSection, PreparedSnapshot, SnapshotKind};
    use assert_matches::assert_matches;
    use golden_rules::{ComplianceRule, ConfigType, RuleDefinition};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::thread;
    use std::time::Duration;

    const NTP_INTENDED: &str = "hostname r1\nntp server 1.1.1.1\nntp server 2.2.2.2\n";
    const NTP_SWAPPED: &str = "hostname r1\nntp server 2.2.2.2\nntp server 1.1.1.1\n";

    struct SlowExtractor;

    impl SectionExtractor for SlowExtractor {
        fn strategy_name(&self) -> &str {
            "slow"
        }

        fn extract(
            &self,
            _snapshot: &PreparedSnapshot,
            _rule: &ComplianceRule,
        ) -> Result<FeatureSection, ParseError> {
            thread::sleep(Duration::from_millis(400));
            Ok(FeatureSection::Absent)
        }
    }

    struct CancellingExtractor {
        token: CancellationToken,
    }

    impl SectionExtractor for CancellingExtractor {
        fn strategy_name(&self) -> &str {
            "cancel"
        }

        fn extract(
            &self,
            snapshot: &PreparedSnapshot,
            _rule: &ComplianceRule,
        ) -> Result<FeatureSection, ParseError> {
            if snapshot.device() == "r1" {
                self.token.cancel();
            }
            Ok(FeatureSection::Absent)
        }
    }

    struct PanickingExtractor;

    impl SectionExtractor for PanickingExtractor {
        fn strategy_name(&self) -> &str {
            "broken"
        }

        fn extract(
            &self,
            _snapshot: &PreparedSnapshot,
            _rule: &ComplianceRule,
        ) -> Result<FeatureSection, ParseError> {
            panic!("index out of range")
        }
    }

    fn rule_set(definitions: Vec<RuleDefinition>) -> RuleSet {
        let mut builder = RuleSet::builder();
        for definition in definitions {
            builder.register_definition(definition).unwrap();
        }
        builder.build()
    }

    fn ntp_rule(config_type: ConfigType) -> RuleDefinition {
        RuleDefinition::new("ntp", "cisco_ios", config_type).with_anchors(["ntp server"])
    }

    fn engine(rules: RuleSet) -> ComplianceEngine {
        ComplianceEngine::new(rules, ExtractorRegistry::with_builtins(), EngineConfig::sequential())
            .unwrap()
    }

    fn cli_device(name: &str, intended: &str, actual: &str) -> DeviceInput {
        DeviceInput::new(name, "cisco_ios")
            .with_intended(ConfigSnapshot::text(name, "cisco_ios", SnapshotKind::Intended, intended))
            .with_actual(ConfigSnapshot::text(name, "cisco_ios", SnapshotKind::Actual, actual))
    }

    fn only_result(report: &BatchReport) -> &crate::results::ComplianceResult {
        report.devices[0].summary().unwrap().outcomes[0].result().unwrap()
    }

    #[test]
    fn test_identical_configs_are_compliant() {
        for config_type in [ConfigType::Ordered, ConfigType::UnorderedSingleLine] {
            let report = engine(rule_set(vec![ntp_rule(config_type)]))
                .run(vec![cli_device("r1", NTP_INTENDED, NTP_INTENDED)])
                .unwrap();
            let result = only_result(&report);

            assert!(result.compliant);
            assert_eq!(result.compliance_int, 1);
            assert!(result.missing.is_empty() && result.extra.is_empty());
            assert_eq!(report.fleet.mean_compliance_percent, Some(100.0));
        }
    }

    #[test]
    fn test_ntp_swap_unordered_is_compliant() {
        let report = engine(rule_set(vec![ntp_rule(ConfigType::UnorderedSingleLine)]))
            .run(vec![cli_device("r1", NTP_INTENDED, NTP_SWAPPED)])
            .unwrap();

        assert!(only_result(&report).compliant);
        assert!(report.devices[0].summary().unwrap().compliant);
    }

    #[test]
    fn test_ntp_swap_ordered_is_misordered() {
        let report = engine(rule_set(vec![ntp_rule(ConfigType::Ordered)]))
            .run(vec![cli_device("r1", NTP_INTENDED, NTP_SWAPPED)])
            .unwrap();
        let result = only_result(&report);

        assert!(!result.compliant);
        assert!(result.ordered);
        assert_eq!(result.misordered.len(), 1);
        assert_eq!(report.devices[0].summary().unwrap().compliance_percent, Some(0.0));
        assert!(report.has_non_compliant());
    }

    #[test]
    fn test_snmp_json_scenario() {
        let rules = rule_set(vec![
            RuleDefinition::new("snmp", "openconfig", ConfigType::Json).with_selector("$.snmp"),
        ]);
        let input = DeviceInput::new("r1", "openconfig")
            .with_intended(ConfigSnapshot::structured(
                "r1",
                "openconfig",
                SnapshotKind::Intended,
                json!({"snmp": {"community": "public"}}),
            ))
            .with_actual(ConfigSnapshot::text(
                "r1",
                "openconfig",
                SnapshotKind::Actual,
                r#"{"snmp": {"community": "private"}}"#,
            ));

        let report = engine(rules).run(vec![input]).unwrap();
        let result = only_result(&report);

        assert!(!result.compliant);
        assert_eq!(
            result.missing,
            DiffSet::Fields(BTreeMap::from([("snmp.community".to_string(), json!("public"))]))
        );
        assert_eq!(
            result.extra,
            DiffSet::Fields(BTreeMap::from([("snmp.community".to_string(), json!("private"))]))
        );
    }

    #[test]
    fn test_absent_sections() {
        let engine = engine(rule_set(vec![ntp_rule(ConfigType::Ordered)]));

        let report = engine
            .run(vec![cli_device("r1", "hostname r1", "hostname r1")])
            .unwrap();
        assert!(only_result(&report).compliant);

        let report = engine
            .run(vec![cli_device("r1", "hostname r1", NTP_INTENDED)])
            .unwrap();
        let result = only_result(&report);
        assert!(!result.compliant);
        assert_eq!(
            result.extra.lines().unwrap(),
            ["ntp server 1.1.1.1", "ntp server 2.2.2.2"]
        );
    }

    #[test]
    fn test_unreadable_snapshot_is_excluded_from_mean() {
        let engine = engine(rule_set(vec![ntp_rule(ConfigType::Ordered)]));
        let broken = DeviceInput::new("r2", "cisco_ios")
            .with_intended(ConfigSnapshot::text("r2", "cisco_ios", SnapshotKind::Intended, NTP_INTENDED))
            .with_actual(ConfigSnapshot::raw("r2", "cisco_ios", SnapshotKind::Actual, vec![0xff, 0xfe, 0x00]));

        let report = engine
            .run(vec![broken, cli_device("r1", NTP_INTENDED, NTP_INTENDED)])
            .unwrap();

        assert_eq!(report.devices.len(), 2);
        assert_eq!(report.devices[0].device(), "r1");
        assert_matches!(
            report.devices[1].error(),
            Some(DeviceFailure { code: DeviceErrorCode::UnreadableSnapshot, .. })
        );
        assert_eq!(report.fleet.errored_devices, 1);
        assert_eq!(report.fleet.mean_compliance_percent, Some(100.0));
        assert!(report.has_errors());
    }

    #[test]
    fn test_duplicate_devices_are_rejected() {
        let report = engine(rule_set(vec![ntp_rule(ConfigType::Ordered)]))
            .run(vec![
                cli_device("r1", NTP_INTENDED, NTP_INTENDED),
                cli_device("r2", NTP_INTENDED, NTP_INTENDED),
                cli_device("r1", NTP_INTENDED, NTP_SWAPPED),
            ])
            .unwrap();

        let duplicates = report
            .devices
            .iter()
            .filter(|r| r.error().map(|e| e.code) == Some(DeviceErrorCode::DuplicateDevice))
            .count();
        assert_eq!(duplicates, 2);
        assert!(report.find_device("r2").and_then(DeviceReport::summary).is_some());
    }

    #[test]
    fn test_pre_cancelled_batch() {
        let token = CancellationToken::new();
        token.cancel();

        let report = engine(rule_set(vec![ntp_rule(ConfigType::Ordered)]))
            .run_with_cancellation(
                vec![
                    cli_device("r1", NTP_INTENDED, NTP_INTENDED),
                    cli_device("r2", NTP_INTENDED, NTP_INTENDED),
                ],
                &token,
            )
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.fleet.errored_devices, 2);
        assert_eq!(report.fleet.mean_compliance_percent, None);
    }

    #[test]
    fn test_cancel_during_batch_keeps_finished_devices() {
        let token = CancellationToken::new();
        let rules = rule_set(vec![
            ntp_rule(ConfigType::Ordered),
            RuleDefinition::new("watch", "cisco_ios", ConfigType::Custom).with_strategy("cancel"),
        ]);
        let mut extractors = ExtractorRegistry::with_builtins();
        extractors
            .register(Box::new(CancellingExtractor { token: token.clone() }))
            .unwrap();
        let engine = ComplianceEngine::new(rules, extractors, EngineConfig::sequential()).unwrap();

        let report = engine
            .run_with_cancellation(
                vec![
                    cli_device("r1", NTP_INTENDED, NTP_INTENDED),
                    cli_device("r2", NTP_INTENDED, NTP_INTENDED),
                    cli_device("r3", NTP_INTENDED, NTP_INTENDED),
                ],
                &token,
            )
            .unwrap();

        assert!(report.cancelled);
        let finished = report.find_device("r1").and_then(DeviceReport::summary).unwrap();
        assert!(finished.compliant);
        assert_eq!(finished.total_rules, 2);
        for device in ["r2", "r3"] {
            assert_matches!(
                report.find_device(device).and_then(DeviceReport::error),
                Some(DeviceFailure { code: DeviceErrorCode::Cancelled, .. })
            );
        }
        assert_eq!(report.fleet.errored_devices, 2);
        assert_eq!(report.fleet.mean_compliance_percent, Some(100.0));
    }

    #[test]
    fn test_cancellation_after_last_device_is_reported() {
        let token = CancellationToken::new();
        let rules = rule_set(vec![
            RuleDefinition::new("watch", "cisco_ios", ConfigType::Custom).with_strategy("cancel"),
        ]);
        let mut extractors = ExtractorRegistry::with_builtins();
        extractors
            .register(Box::new(CancellingExtractor { token: token.clone() }))
            .unwrap();
        let engine = ComplianceEngine::new(rules, extractors, EngineConfig::sequential()).unwrap();

        let report = engine
            .run_with_cancellation(vec![cli_device("r1", "a", "a")], &token)
            .unwrap();

        assert!(report.devices[0].summary().is_some());
        assert!(report.cancelled);
    }

    #[test]
    fn test_unknown_strategy_rejected_at_construction() {
        let rules = rule_set(vec![
            RuleDefinition::new("motd", "cisco_ios", ConfigType::Custom).with_strategy("nonexistent"),
        ]);
        let result = ComplianceEngine::with_defaults(rules);
        assert_matches!(
            result,
            Err(EngineError::UnknownStrategy { strategy, .. }) if strategy == "nonexistent"
        );
    }

    #[test]
    fn test_slow_device_times_out() {
        let rules = rule_set(vec![
            RuleDefinition::new("slow", "cisco_ios", ConfigType::Custom).with_strategy("slow"),
        ]);
        let mut extractors = ExtractorRegistry::with_builtins();
        extractors.register(Box::new(SlowExtractor)).unwrap();
        let config = EngineConfig::sequential().with_device_timeout(Some(Duration::from_millis(50)));
        let engine = ComplianceEngine::new(rules, extractors, config).unwrap();

        let report = engine.run(vec![cli_device("r1", "a", "a")]).unwrap();
        assert_matches!(
            report.devices[0].error(),
            Some(DeviceFailure { code: DeviceErrorCode::Timeout, .. })
        );
        assert!(!report.cancelled);
    }

    #[test]
    fn test_panicking_rule_becomes_internal_failure() {
        let rules = rule_set(vec![
            ntp_rule(ConfigType::Ordered),
            RuleDefinition::new("broken", "cisco_ios", ConfigType::Custom).with_strategy("broken"),
        ]);
        let mut extractors = ExtractorRegistry::with_builtins();
        extractors.register(Box::new(PanickingExtractor)).unwrap();
        let engine = ComplianceEngine::new(rules, extractors, EngineConfig::sequential().with_max_threads(2)).unwrap();

        let report = engine
            .run(vec![
                cli_device("r1", NTP_INTENDED, NTP_INTENDED),
                cli_device("r2", NTP_INTENDED, NTP_INTENDED),
            ])
            .unwrap();

        for device in &report.devices {
            let summary = device.summary().unwrap();
            assert_eq!(summary.failed_rules, 1);
            assert_eq!(summary.compliant_rules, 1);
            assert_eq!(summary.compliance_percent, Some(50.0));
            assert!(!summary.compliant);
            assert_eq!(summary.outcomes[0].failure().unwrap().kind, FailureKind::Internal);
        }
        assert_eq!(report.fleet.per_feature["broken"].error_count, 2);
        assert_eq!(report.fleet.mean_compliance_percent, Some(50.0));
    }

    #[test]
    fn test_batch_limit() {
        let inputs: Vec<DeviceInput> = (0..=MAX_DEVICES_PER_BATCH)
            .map(|i| DeviceInput::new(format!("d{}", i), "cisco_ios"))
            .collect();
        assert_matches!(
            engine(rule_set(vec![ntp_rule(ConfigType::Ordered)])).run(inputs),
            Err(EngineError::TooManyDevices { .. })
        );
    }
}
