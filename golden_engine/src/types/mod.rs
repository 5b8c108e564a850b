//! # Engine Types
//!
//! Snapshots, extracted sections and device inputs.

pub mod input;
pub mod section;
pub mod snapshot;

pub use input::DeviceInput;
pub use section::FeatureSection;
pub use snapshot::{ConfigSnapshot, PreparedSnapshot, SnapshotContent, SnapshotError, SnapshotKind};
