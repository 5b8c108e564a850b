//! # Execution Module
//!
//! Device evaluation, the worker pool and batch cancellation.

pub mod cancellation;
pub mod evaluator;
pub mod pool;

pub use cancellation::CancellationToken;
pub use evaluator::evaluate_device;
pub use pool::{evaluate_all, PoolSettings};
