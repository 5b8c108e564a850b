//! Configuration module for the golden compliance workspace
//!
//! Hard limits are generated at build time from `config/<profile>.toml`;
//! user preferences live in [`runtime`] and may be tuned per run.

// Generated by build.rs from the selected TOML profile
include!(concat!(env!("OUT_DIR"), "/constants.rs"));

pub mod runtime;

pub use runtime::{ConfigError, EnginePreferences, LoadPreferences, LoggingPreferences, RuntimeConfig};

/// Build information and configuration metadata
pub mod build_info {
    /// Returns the configuration profile used during build
    pub fn profile() -> &'static str {
        option_env!("GOLDEN_BUILD_PROFILE").unwrap_or("development")
    }

    /// Returns the configuration directory used during build
    pub fn config_dir() -> &'static str {
        option_env!("GOLDEN_CONFIG_DIR").unwrap_or("config")
    }

    /// Returns configuration source information
    pub fn source_info() -> String {
        format!("Generated from {}/{}.toml", config_dir(), profile())
    }
}

#[cfg(test)]
mod tests {
    use super::compile_time;

    #[test]
    fn test_generated_limits_are_sane() {
        assert!(compile_time::snapshot::MAX_SNAPSHOT_BYTES > 0);
        assert!(compile_time::rules::MAX_MATCH_ENTRIES > 0);
        assert!(compile_time::batch::MAX_WORKER_THREADS >= 1);
        assert!(
            compile_time::batch::DEFAULT_DEVICE_TIMEOUT_MS
                <= compile_time::batch::MAX_DEVICE_TIMEOUT_MS
        );
    }

    #[test]
    fn test_source_info_names_profile() {
        assert!(super::build_info::source_info().ends_with(".toml"));
    }
}
