// RUNTIME PREFERENCES (User Experience)
//
// Every preference defaults from a GOLDEN_* environment variable and may be
// overridden by an engine TOML file. Values are clamped to compile-time limits.

use super::compile_time;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnginePreferences {
    /// Worker threads for device evaluation
    pub max_threads: usize,

    /// Per-device evaluation budget in milliseconds; 0 disables the timeout
    pub device_timeout_ms: u64,

    /// Whether to log per-device progress while a batch runs
    pub progress_reporting: bool,
}

impl Default for EnginePreferences {
    fn default() -> Self {
        Self {
            max_threads: env::var("GOLDEN_MAX_THREADS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_thread_count),
            device_timeout_ms: env::var("GOLDEN_DEVICE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(compile_time::batch::DEFAULT_DEVICE_TIMEOUT_MS),
            progress_reporting: env::var("GOLDEN_PROGRESS_REPORTING")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }
}

impl EnginePreferences {
    /// Thread count clamped to `1..=MAX_WORKER_THREADS`
    pub fn effective_threads(&self) -> usize {
        self.max_threads
            .clamp(1, compile_time::batch::MAX_WORKER_THREADS)
    }

    /// Device timeout clamped to `MAX_DEVICE_TIMEOUT_MS`; `None` when disabled
    pub fn effective_device_timeout(&self) -> Option<Duration> {
        if self.device_timeout_ms == 0 {
            return None;
        }
        Some(Duration::from_millis(
            self.device_timeout_ms
                .min(compile_time::batch::MAX_DEVICE_TIMEOUT_MS),
        ))
    }
}

fn default_thread_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8))
        .unwrap_or(4)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadPreferences {
    /// Descend into subdirectories when loading a rule directory
    pub recursive: bool,

    /// Stop discovery after this many rule files
    pub max_files: Option<usize>,
}

impl Default for LoadPreferences {
    fn default() -> Self {
        Self {
            recursive: env::var("GOLDEN_RULES_RECURSIVE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            max_files: env::var("GOLDEN_RULES_MAX_FILES")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingPreferences {
    /// Whether to use structured JSON logging
    pub use_structured_logging: bool,

    /// Whether to enable console output
    pub enable_console_logging: bool,

    /// Minimum level written by the global service
    pub min_log_level: LogLevel,

    /// Whether events carry the device currently under evaluation
    pub include_device_context: bool,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env::var("GOLDEN_LOGGING_USE_STRUCTURED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            enable_console_logging: env::var("GOLDEN_LOGGING_ENABLE_CONSOLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            min_log_level: env::var("GOLDEN_LOGGING_MIN_LEVEL")
                .ok()
                .and_then(|v| parse_log_level(&v))
                .unwrap_or(LogLevel::Info),
            include_device_context: env::var("GOLDEN_LOGGING_INCLUDE_DEVICE_CONTEXT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Convert to events::LogLevel
    pub fn to_events_log_level(&self) -> crate::logging::events::LogLevel {
        match self {
            LogLevel::Error => crate::logging::events::LogLevel::Error,
            LogLevel::Warning => crate::logging::events::LogLevel::Warning,
            LogLevel::Info => crate::logging::events::LogLevel::Info,
            LogLevel::Debug => crate::logging::events::LogLevel::Debug,
        }
    }
}

/// Parse log level from string (used for environment variables and CLI flags)
pub fn parse_log_level(level: &str) -> Option<LogLevel> {
    match level.to_lowercase().as_str() {
        "error" | "0" => Some(LogLevel::Error),
        "warning" | "warn" | "1" => Some(LogLevel::Warning),
        "info" | "2" => Some(LogLevel::Info),
        "debug" | "3" => Some(LogLevel::Debug),
        _ => None,
    }
}

/// Errors raised while reading an engine configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read configuration file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration in '{path}': {reason}")]
    Parse { path: String, reason: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub engine: EnginePreferences,
    pub rules: LoadPreferences,
    pub logging: LoggingPreferences,
}

impl RuntimeConfig {
    /// Parse a TOML document; missing tables and keys fall back to env defaults
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load an engine configuration file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

/// Environment variable names for configuration
pub mod env_vars {
    // Engine
    pub const MAX_THREADS: &str = "GOLDEN_MAX_THREADS";
    pub const DEVICE_TIMEOUT_MS: &str = "GOLDEN_DEVICE_TIMEOUT_MS";
    pub const PROGRESS_REPORTING: &str = "GOLDEN_PROGRESS_REPORTING";

    // Rule loading
    pub const RULES_RECURSIVE: &str = "GOLDEN_RULES_RECURSIVE";
    pub const RULES_MAX_FILES: &str = "GOLDEN_RULES_MAX_FILES";

    // Logging
    pub const LOGGING_USE_STRUCTURED: &str = "GOLDEN_LOGGING_USE_STRUCTURED";
    pub const LOGGING_ENABLE_CONSOLE: &str = "GOLDEN_LOGGING_ENABLE_CONSOLE";
    pub const LOGGING_MIN_LEVEL: &str = "GOLDEN_LOGGING_MIN_LEVEL";
    pub const LOGGING_INCLUDE_DEVICE_CONTEXT: &str = "GOLDEN_LOGGING_INCLUDE_DEVICE_CONTEXT";
}
