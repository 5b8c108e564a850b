// src/types/input.rs
//! Per-device engine input

use super::snapshot::ConfigSnapshot;

/// One device to evaluate. A missing snapshot is reported as a device error.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInput {
    pub device: String,
    pub platform: String,
    pub intended: Option<ConfigSnapshot>,
    pub actual: Option<ConfigSnapshot>,
}

impl DeviceInput {
    pub fn new(device: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            platform: platform.into(),
            intended: None,
            actual: None,
        }
    }

    pub fn with_intended(mut self, snapshot: ConfigSnapshot) -> Self {
        self.intended = Some(snapshot);
        self
    }

    pub fn with_actual(mut self, snapshot: ConfigSnapshot) -> Self {
        self.actual = Some(snapshot);
        self
    }
}
