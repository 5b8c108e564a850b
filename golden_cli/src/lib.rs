//! # Golden Compliance CLI
//!
//! Command implementations behind the `golden-compliance` binary.

pub mod commands;
pub mod error;
pub mod manifest;

pub use commands::{initialize, run_check, run_validate, CheckOptions, GlobalOptions, LogFormat};
pub use error::{CliError, ExitStatus};
pub use manifest::{DeviceManifest, ManifestEntry, ManifestError, SnapshotFormat};
