// src/commands.rs
//! `check` and `validate` command implementations

use crate::error::{CliError, ExitStatus};
use crate::manifest::DeviceManifest;
use golden_engine::{
    BatchReport, CancellationToken, ComplianceEngine, EngineConfig, ExtractorRegistry,
    ReportFormat, ReportGenerator,
};
use golden_rules::config::compile_time::batch::MAX_WORKER_THREADS;
use golden_rules::config::runtime::{LoggingPreferences, RuntimeConfig};
use golden_rules::logging::{self, codes};
use golden_rules::{load_rule_set, RuleSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Console,
    Structured,
}

/// Options shared by every command
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub log_format: Option<LogFormat>,
    pub verbose: u8,
}

#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub rules: PathBuf,
    pub devices: PathBuf,
    pub output: Option<PathBuf>,
    pub format: ReportFormat,
    /// 0 uses one worker per logical CPU
    pub threads: Option<usize>,
    /// 0 disables the per-device timeout
    pub timeout_ms: Option<u64>,
    pub batch_timeout_secs: Option<u64>,
}

/// Load the runtime configuration and start global logging
pub fn initialize(global: &GlobalOptions) -> Result<RuntimeConfig, CliError> {
    let runtime = match &global.config {
        Some(path) => RuntimeConfig::from_file(path)?,
        None => RuntimeConfig::default(),
    };

    let preferences = logging_preferences(&runtime.logging, global);
    logging::config::init_runtime_preferences(preferences)
        .map_err(|reason| CliError::Logging { reason })?;
    logging::init_global_logging().map_err(|reason| CliError::Logging { reason })?;

    golden_rules::log_debug!("Runtime configuration", "source" => golden_rules::config::build_info::source_info());
    Ok(runtime)
}

fn logging_preferences(base: &LoggingPreferences, global: &GlobalOptions) -> LoggingPreferences {
    use golden_rules::config::runtime::LogLevel;

    let mut preferences = base.clone();
    match global.log_format {
        Some(LogFormat::Structured) => preferences.use_structured_logging = true,
        Some(LogFormat::Console) => preferences.use_structured_logging = false,
        None => {}
    }
    if global.verbose > 0 {
        preferences.min_log_level = LogLevel::Debug;
    }
    preferences
}

fn engine_config(runtime: &RuntimeConfig, options: &CheckOptions) -> EngineConfig {
    let mut config = EngineConfig::from_preferences(&runtime.engine);

    match options.threads {
        Some(0) => config = config.with_max_threads(num_cpus::get().min(MAX_WORKER_THREADS)),
        Some(threads) => config = config.with_max_threads(threads),
        None => {}
    }
    match options.timeout_ms {
        Some(0) => config = config.with_device_timeout(None),
        Some(ms) => config = config.with_device_timeout(Some(Duration::from_millis(ms))),
        None => {}
    }
    config
}

fn load_rules(path: &Path, runtime: &RuntimeConfig) -> Result<RuleSet, CliError> {
    Ok(load_rule_set(path, &runtime.rules)?)
}

/// Evaluate the manifest's devices and emit the report
pub fn run_check(runtime: &RuntimeConfig, options: &CheckOptions) -> Result<ExitStatus, CliError> {
    let started = Instant::now();

    let rules = load_rules(&options.rules, runtime)?;
    let manifest = DeviceManifest::from_path(&options.devices)?;
    if manifest.is_empty() {
        golden_rules::log_warning!("Manifest lists no devices", "path" => options.devices.display());
    }

    let engine = ComplianceEngine::new(
        rules,
        ExtractorRegistry::with_builtins(),
        engine_config(runtime, options),
    )?;

    let token = match options.batch_timeout_secs {
        Some(secs) if secs > 0 => CancellationToken::with_timeout(Duration::from_secs(secs)),
        _ => CancellationToken::new(),
    };

    let report = engine.run_with_cancellation(manifest.to_inputs(), &token)?;
    emit_report(&report, options)?;

    let status = ExitStatus::for_report(&report);
    golden_rules::log_info!("Check finished",
        "devices" => report.devices.len(),
        "exit_status" => status.code(),
        "elapsed_ms" => started.elapsed().as_millis()
    );
    Ok(status)
}

fn emit_report(report: &BatchReport, options: &CheckOptions) -> Result<(), CliError> {
    match &options.output {
        Some(path) => {
            ReportGenerator::write_to(report, options.format, path).map_err(|e| {
                golden_rules::log_error!(codes::report::REPORT_WRITE_FAILED, "Report not written",
                    "path" => path.display(),
                    "reason" => &e
                );
                e
            })?;
        }
        None => {
            let rendered = ReportGenerator::render(report, options.format)?;
            println!("{}", rendered.trim_end());
        }
    }
    Ok(())
}

/// Validate rule files and the strategies they reference
pub fn run_validate(runtime: &RuntimeConfig, rules: &Path) -> Result<ExitStatus, CliError> {
    let rule_set = load_rules(rules, runtime)?;
    let extractors = ExtractorRegistry::with_builtins();
    extractors
        .validate_rule_set(&rule_set)
        .map_err(golden_engine::EngineError::from)?;

    println!(
        "{} rules across {} platforms, {} cleaning directives: OK",
        rule_set.len(),
        rule_set.platforms().len(),
        rule_set.directive_count()
    );
    for platform in rule_set.platforms() {
        let features: Vec<String> = rule_set
            .rules_for_platform(&platform)
            .iter()
            .map(|rule| format!("{} ({})", rule.feature_name(), rule.config_type()))
            .collect();
        println!("  {}: {}", platform, features.join(", "));
    }

    Ok(ExitStatus::Compliant)
}
