//! Shared transport and validation for all source scrapers.
//!
//! Every request a concrete scraper makes goes through [`ScraperClient`]:
//! robots policy first, then the per-source rate limit, then the retried
//! HTTP call. That single choke point is what makes the whole pipeline
//! polite and resilient; scrapers must not open their own connections.

use std::sync::Mutex;
use std::time::Duration;

use rand::seq::SliceRandom;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT,
};
use reqwest::Method;
use tracing::{error, info, warn};

use crate::config::HarvestConfig;
use crate::constants::{DEFAULT_USER_AGENT, USER_AGENT_POOL};
use crate::domain::{BeerRecord, BreweryRecord, RawRecord, ScraperStats};
use crate::error::Result;
use crate::normalize::{normalize_beer_record, normalize_brewery_record};
use crate::politeness::{RateLimiter, RetryStrategy, RobotsChecker};
use crate::validate::{validate_beer, validate_brewery};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ScraperClient {
    source_name: String,
    http: reqwest::Client,
    rate_limiter: RateLimiter,
    robots: RobotsChecker,
    retry: RetryStrategy,
    check_robots: bool,
    stats: Mutex<ScraperStats>,
}

impl ScraperClient {
    pub fn new(source_name: &str, config: &HarvestConfig, check_robots: bool) -> Self {
        let user_agent = pick_user_agent();
        let http = reqwest::Client::builder()
            .default_headers(browser_headers(user_agent))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        let client = Self {
            source_name: source_name.to_string(),
            http,
            rate_limiter: RateLimiter::fixed(source_name, config.rate_limit_for(source_name)),
            robots: RobotsChecker::new(user_agent),
            retry: config.retry_strategy(),
            check_robots,
            stats: Mutex::new(ScraperStats::default()),
        };
        info!("initialized scraper client for {source_name}");
        client
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn robots(&self) -> &RobotsChecker {
        &self.robots
    }

    /// Robots-checked, rate-limited, retried GET. `Ok(None)` means the URL
    /// is disallowed by robots.txt: skip it, do not retry it.
    pub async fn get(&self, url: &str) -> Result<Option<reqwest::Response>> {
        self.request(Method::GET, url, &[]).await
    }

    pub async fn get_with_query(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Option<reqwest::Response>> {
        self.request(Method::GET, url, query).await
    }

    pub async fn request(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Option<reqwest::Response>> {
        if self.check_robots && !self.robots.can_fetch(url).await {
            return Ok(None);
        }

        self.rate_limiter.wait(&self.source_name).await;

        let outcome = self
            .retry
            .execute(|| {
                let request = self.http.request(method.clone(), url).query(query);
                async move { request.send().await?.error_for_status() }
            })
            .await;

        match outcome {
            Ok(response) => {
                self.with_stats(|stats| stats.requests_made += 1);
                Ok(Some(response))
            }
            Err(e) => {
                error!("request failed for {url}: {e}");
                self.with_stats(|stats| stats.http_errors += 1);
                Err(e.into())
            }
        }
    }

    /// Normalize then validate one beer record. A failing record is logged
    /// and counted, and the caller skips it; one bad record must not abort
    /// a batch.
    pub fn validate_and_normalize_beer(&self, raw: &RawRecord) -> Option<BeerRecord> {
        let beer = normalize_beer_record(raw);
        let report = validate_beer(&beer);
        if !report.is_valid() {
            warn!("beer validation failed: {:?}", report.errors);
            self.with_stats(|stats| stats.validation_errors += 1);
            return None;
        }
        Some(beer)
    }

    pub fn validate_and_normalize_brewery(&self, raw: &RawRecord) -> Option<BreweryRecord> {
        let brewery = normalize_brewery_record(raw);
        let report = validate_brewery(&brewery);
        if !report.is_valid() {
            warn!("brewery validation failed: {:?}", report.errors);
            self.with_stats(|stats| stats.validation_errors += 1);
            return None;
        }
        Some(brewery)
    }

    pub fn record_beer_scraped(&self) {
        self.with_stats(|stats| stats.beers_scraped += 1);
    }

    pub fn record_brewery_scraped(&self) {
        self.with_stats(|stats| stats.breweries_scraped += 1);
    }

    pub fn stats(&self) -> ScraperStats {
        self.stats
            .lock()
            .map(|stats| stats.clone())
            .unwrap_or_default()
    }

    pub fn reset_stats(&self) {
        self.with_stats(|stats| stats.reset());
        info!("reset statistics for {}", self.source_name);
    }

    fn with_stats(&self, update: impl FnOnce(&mut ScraperStats)) {
        if let Ok(mut stats) = self.stats.lock() {
            update(&mut stats);
        }
    }
}

fn pick_user_agent() -> &'static str {
    USER_AGENT_POOL
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(DEFAULT_USER_AGENT)
}

fn browser_headers(user_agent: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(user_agent));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-GB,en;q=0.9"));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        "Upgrade-Insecure-Requests",
        HeaderValue::from_static("1"),
    );
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> ScraperClient {
        ScraperClient::new("test_source", &HarvestConfig::default(), false)
    }

    #[test]
    fn validation_failure_counts_and_skips() {
        let client = client();
        let raw = json!({"name": "", "style": "IPA"});
        assert!(client.validate_and_normalize_beer(&raw).is_none());
        assert_eq!(client.stats().validation_errors, 1);
    }

    #[test]
    fn valid_records_pass_through() {
        let client = client();
        let raw = json!({
            "name": "Punk IPA (330ml)",
            "brewery": "BrewDog",
            "style": "American IPA",
            "abv": "5.6%",
        });
        let beer = client.validate_and_normalize_beer(&raw).unwrap();
        assert_eq!(beer.name.as_deref(), Some("Punk IPA"));
        assert_eq!(beer.category.as_deref(), Some("IPA"));
        assert_eq!(client.stats().validation_errors, 0);
    }

    #[test]
    fn stats_reset() {
        let client = client();
        client.record_beer_scraped();
        client.record_brewery_scraped();
        assert_eq!(client.stats().beers_scraped, 1);
        client.reset_stats();
        assert_eq!(client.stats(), ScraperStats::default());
    }

    #[test]
    fn user_agent_pool_always_yields_something() {
        let agent = pick_user_agent();
        assert!(agent.starts_with("Mozilla/5.0"));
    }
}
