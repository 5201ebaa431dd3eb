//! Polite beer and brewery data harvester for Great British Beer.
//!
//! A single-process, best-effort batch harvester: per-source rate limiting,
//! robots.txt compliance, bounded retries, field normalization, and
//! validation, feeding a create-if-absent persistence boundary.

pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod images;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod politeness;
pub mod scrapers;
pub mod storage;
pub mod validate;

// Commonly used types
pub use domain::{BeerRecord, BreweryRecord, RawRecord, ScraperStats};
pub use error::{Result, ScraperError};
