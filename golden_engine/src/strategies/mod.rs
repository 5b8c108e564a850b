//! # Extraction Strategies
//!
//! Capability trait and registry for custom section extraction.

pub mod banner;
pub mod errors;
pub mod registry;
pub mod traits;

pub use banner::{BannerExtractor, BANNER_STRATEGY};
pub use errors::{ParseError, StrategyError};
pub use registry::ExtractorRegistry;
pub use traits::SectionExtractor;
