//! Harvest configuration: per-source rate limits, retry knobs, and image
//! downloader settings, loadable from TOML with sensible defaults.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::constants::{
    BREWERY_SITE_RATE_CLASS, BREWERY_SITE_SOURCE_PREFIX, OPEN_BREWERY_DB_SOURCE, RATINGS_SOURCE,
};
use crate::error::{Result, ScraperError};
use crate::politeness::RetryStrategy;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Seconds between requests, keyed by source id or rate class.
    pub rate_limits: HashMap<String, f64>,
    pub default_rate_limit: f64,
    /// Master switch; individual API sources may still opt out.
    pub check_robots: bool,
    /// Cap on records fetched per call, when set.
    pub limit: Option<usize>,
    pub retry: RetryConfig,
    pub images: ImageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: f64,
    pub max_delay: f64,
    pub backoff_factor: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub max_workers: usize,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        let mut rate_limits = HashMap::new();
        rate_limits.insert(OPEN_BREWERY_DB_SOURCE.to_string(), 1.0);
        rate_limits.insert(RATINGS_SOURCE.to_string(), 2.0);
        rate_limits.insert(BREWERY_SITE_RATE_CLASS.to_string(), 3.0);
        Self {
            rate_limits,
            default_rate_limit: 2.0,
            check_robots: true,
            limit: None,
            retry: RetryConfig::default(),
            images: ImageConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: 5.0,
            max_delay: 60.0,
            backoff_factor: 2.0,
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_workers: 5,
            timeout_secs: 30,
            max_retries: 2,
        }
    }
}

impl HarvestConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| ScraperError::Api {
            message: format!("invalid config {}: {e}", path.display()),
        })
    }

    /// Resolve the interval for a source: exact id first, then the shared
    /// brewery-site class, then the default.
    pub fn rate_limit_for(&self, source: &str) -> f64 {
        if let Some(interval) = self.rate_limits.get(source) {
            return *interval;
        }
        if source.starts_with(BREWERY_SITE_SOURCE_PREFIX) {
            if let Some(interval) = self.rate_limits.get(BREWERY_SITE_RATE_CLASS) {
                return *interval;
            }
        }
        self.default_rate_limit
    }

    pub fn retry_strategy(&self) -> RetryStrategy {
        RetryStrategy::new(
            self.retry.max_attempts,
            self.retry.base_delay,
            self.retry.max_delay,
            self.retry.backoff_factor,
        )
    }
}
