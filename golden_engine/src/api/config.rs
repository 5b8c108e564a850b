//! # Engine Configuration

use super::errors::EngineError;
use golden_rules::config::compile_time::batch::{MAX_DEVICE_TIMEOUT_MS, MAX_WORKER_THREADS};
use golden_rules::config::runtime::EnginePreferences;
use std::time::Duration;

/// Configuration for the [`ComplianceEngine`](super::ComplianceEngine)
///
/// Controls worker count, per-device timeout and progress output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Worker threads; 1 evaluates on the caller thread
    pub max_threads: usize,

    /// Per-device evaluation budget; `None` disables the timeout
    pub device_timeout: Option<Duration>,

    /// Print per-device progress to stderr
    pub progress_reporting: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_preferences(&EnginePreferences::default())
    }
}

impl EngineConfig {
    /// Build from runtime preferences, clamped to compile-time limits
    pub fn from_preferences(preferences: &EnginePreferences) -> Self {
        Self {
            max_threads: preferences.effective_threads(),
            device_timeout: preferences.effective_device_timeout(),
            progress_reporting: preferences.progress_reporting,
        }
    }

    /// Single worker, no timeout
    pub fn sequential() -> Self {
        Self {
            max_threads: 1,
            device_timeout: None,
            progress_reporting: false,
        }
    }

    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads;
        self
    }

    pub fn with_device_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.device_timeout = timeout;
        self
    }

    pub fn with_progress_reporting(mut self, enabled: bool) -> Self {
        self.progress_reporting = enabled;
        self
    }

    /// Reject values outside the compile-time limits
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.max_threads == 0 || self.max_threads > MAX_WORKER_THREADS {
            return Err(EngineError::InvalidConfig {
                reason: format!(
                    "max_threads must be between 1 and {}, got {}",
                    MAX_WORKER_THREADS, self.max_threads
                ),
            });
        }

        if let Some(timeout) = self.device_timeout {
            if timeout.is_zero() {
                return Err(EngineError::InvalidConfig {
                    reason: "device_timeout must be positive; use None to disable it".to_string(),
                });
            }
            if timeout > Duration::from_millis(MAX_DEVICE_TIMEOUT_MS) {
                return Err(EngineError::InvalidConfig {
                    reason: format!(
                        "device_timeout of {} ms exceeds the limit of {} ms",
                        timeout.as_millis(),
                        MAX_DEVICE_TIMEOUT_MS
                    ),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_preferences_are_clamped() {
        let preferences = EnginePreferences {
            max_threads: MAX_WORKER_THREADS + 10,
            device_timeout_ms: 0,
            progress_reporting: true,
        };
        let config = EngineConfig::from_preferences(&preferences);

        assert_eq!(config.max_threads, MAX_WORKER_THREADS);
        assert_eq!(config.device_timeout, None);
        assert!(config.progress_reporting);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert_matches!(
            EngineConfig::sequential().with_max_threads(0).validate(),
            Err(EngineError::InvalidConfig { .. })
        );
        assert_matches!(
            EngineConfig::sequential()
                .with_device_timeout(Some(Duration::ZERO))
                .validate(),
            Err(EngineError::InvalidConfig { .. })
        );
        assert_matches!(
            EngineConfig::sequential()
                .with_device_timeout(Some(Duration::from_millis(MAX_DEVICE_TIMEOUT_MS + 1)))
                .validate(),
            Err(EngineError::InvalidConfig { .. })
        );
    }
}
