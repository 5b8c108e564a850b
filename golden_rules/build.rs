// build.rs - TOML-driven compile-time limit generation
use std::env;
use std::fs;
use std::path::Path;

#[derive(serde::Deserialize)]
struct CompileTimeConfig {
    snapshot: SnapshotLimits,
    rules: RuleLimits,
    diff: DiffLimits,
    batch: BatchLimits,
    logging: LoggingLimits,
}

#[derive(serde::Deserialize)]
struct SnapshotLimits {
    max_snapshot_bytes: u64,
    max_snapshot_lines: usize,
}

#[derive(serde::Deserialize)]
struct RuleLimits {
    max_feature_name_length: usize,
    max_match_entries: usize,
    max_selector_depth: usize,
    max_rules_per_set: usize,
    max_rule_files: usize,
}

#[derive(serde::Deserialize)]
struct DiffLimits {
    max_alignment_cells: u64,
    max_structured_depth: usize,
}

#[derive(serde::Deserialize)]
struct BatchLimits {
    max_worker_threads: usize,
    default_device_timeout_ms: u64,
    max_device_timeout_ms: u64,
    max_devices_per_batch: usize,
}

#[derive(serde::Deserialize)]
struct LoggingLimits {
    log_buffer_size: usize,
    max_log_message_length: usize,
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=GOLDEN_BUILD_PROFILE");
    println!("cargo:rerun-if-env-changed=GOLDEN_CONFIG_DIR");

    let profile = env::var("GOLDEN_BUILD_PROFILE").unwrap_or_else(|_| "development".to_string());
    let config_dir = env::var("GOLDEN_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

    // Workspace root is the parent of golden_rules
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = Path::new(&manifest_dir)
        .parent()
        .expect("Could not find workspace root (parent directory)");

    let config_path = workspace_root
        .join(&config_dir)
        .join(format!("{}.toml", profile));

    println!("cargo:rerun-if-changed={}", config_path.display());

    if !config_path.exists() {
        panic!(
            "Configuration file not found: {}\nLooking for: {}/{}/{}.toml",
            config_path.display(),
            workspace_root.display(),
            config_dir,
            profile
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", config_path.display(), e));

    let config: CompileTimeConfig = toml::from_str(&config_content)
        .unwrap_or_else(|e| panic!("Invalid TOML in {}: {}", config_path.display(), e));

    validate_limits(&config, &profile);
    generate_constants(&config, &profile);
}

fn validate_limits(config: &CompileTimeConfig, profile: &str) {
    const ABSOLUTE_MAX_SNAPSHOT_BYTES: u64 = 1_073_741_824;
    const ABSOLUTE_MAX_ALIGNMENT_CELLS: u64 = 1_000_000_000;
    const ABSOLUTE_MAX_WORKER_THREADS: usize = 1024;

    if config.snapshot.max_snapshot_bytes > ABSOLUTE_MAX_SNAPSHOT_BYTES {
        panic!("LIMITS: max_snapshot_bytes exceeds absolute maximum");
    }

    if config.diff.max_alignment_cells > ABSOLUTE_MAX_ALIGNMENT_CELLS {
        panic!("LIMITS: max_alignment_cells exceeds absolute maximum");
    }

    if config.batch.max_worker_threads == 0
        || config.batch.max_worker_threads > ABSOLUTE_MAX_WORKER_THREADS
    {
        panic!("LIMITS: max_worker_threads must be between 1 and {ABSOLUTE_MAX_WORKER_THREADS}");
    }

    if config.batch.default_device_timeout_ms > config.batch.max_device_timeout_ms {
        panic!("LIMITS: default_device_timeout_ms exceeds max_device_timeout_ms");
    }

    if config.rules.max_selector_depth == 0 || config.diff.max_structured_depth == 0 {
        panic!("LIMITS: depth limits must be non-zero");
    }

    if profile == "production" {
        if config.snapshot.max_snapshot_bytes > 64 * 1024 * 1024 {
            panic!("PRODUCTION: max_snapshot_bytes too high for production");
        }
        if config.batch.max_device_timeout_ms > 900_000 {
            panic!("PRODUCTION: max_device_timeout_ms too high for production");
        }
    }
}

fn generate_constants(config: &CompileTimeConfig, profile: &str) {
    let out_dir = env::var("OUT_DIR").unwrap();
    let output_path = Path::new(&out_dir).join("constants.rs");

    let constants_code = format!(
        r#"
// Generated compile-time limits from TOML configuration
// Profile: {}
// DO NOT EDIT - Generated by build.rs

pub mod compile_time {{
    pub mod snapshot {{
        pub const MAX_SNAPSHOT_BYTES: u64 = {};
        pub const MAX_SNAPSHOT_LINES: usize = {};
    }}

    pub mod rules {{
        pub const MAX_FEATURE_NAME_LENGTH: usize = {};
        pub const MAX_MATCH_ENTRIES: usize = {};
        pub const MAX_SELECTOR_DEPTH: usize = {};
        pub const MAX_RULES_PER_SET: usize = {};
        pub const MAX_RULE_FILES: usize = {};
    }}

    pub mod diff {{
        pub const MAX_ALIGNMENT_CELLS: u64 = {};
        pub const MAX_STRUCTURED_DEPTH: usize = {};
    }}

    pub mod batch {{
        pub const MAX_WORKER_THREADS: usize = {};
        pub const DEFAULT_DEVICE_TIMEOUT_MS: u64 = {};
        pub const MAX_DEVICE_TIMEOUT_MS: u64 = {};
        pub const MAX_DEVICES_PER_BATCH: usize = {};
    }}

    pub mod logging {{
        pub const LOG_BUFFER_SIZE: usize = {};
        pub const MAX_LOG_MESSAGE_LENGTH: usize = {};
    }}
}}
"#,
        profile,
        config.snapshot.max_snapshot_bytes,
        config.snapshot.max_snapshot_lines,
        config.rules.max_feature_name_length,
        config.rules.max_match_entries,
        config.rules.max_selector_depth,
        config.rules.max_rules_per_set,
        config.rules.max_rule_files,
        config.diff.max_alignment_cells,
        config.diff.max_structured_depth,
        config.batch.max_worker_threads,
        config.batch.default_device_timeout_ms,
        config.batch.max_device_timeout_ms,
        config.batch.max_devices_per_batch,
        config.logging.log_buffer_size,
        config.logging.max_log_message_length,
    );

    fs::write(output_path, constants_code).unwrap();
}
