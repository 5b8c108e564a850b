//! # Public API
//!
//! High-level engine interface over the execution, results and strategy modules.

pub mod config;
pub mod engine;
pub mod errors;

pub use config::EngineConfig;
pub use engine::ComplianceEngine;
pub use errors::EngineError;
