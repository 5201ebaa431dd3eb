//! Per-source request spacing with jitter.
//!
//! One request in flight per source with enforced spacing is the whole
//! concurrency model for scraping; callers run sequentially and simply
//! await `wait` before each request.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::Rng;
use tokio::sync::Mutex;
use tracing::debug;

/// Minimum effective delay once jitter is applied.
const JITTER_FLOOR_SECS: f64 = 0.5;

#[derive(Debug, Default)]
struct SourceState {
    last_request: Option<Instant>,
    requests: u64,
}

#[derive(Debug)]
pub struct RateLimiter {
    intervals: HashMap<String, f64>,
    default_interval: f64,
    state: Mutex<HashMap<String, SourceState>>,
}

impl RateLimiter {
    pub fn new(intervals: HashMap<String, f64>, default_interval: f64) -> Self {
        Self {
            intervals,
            default_interval,
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Limiter with a single known source, the common case for a scraper
    /// that owns its own throttle.
    pub fn fixed(source: &str, interval: f64) -> Self {
        let mut intervals = HashMap::new();
        intervals.insert(source.to_string(), interval);
        Self::new(intervals, interval)
    }

    pub fn interval_for(&self, source: &str) -> f64 {
        self.intervals
            .get(source)
            .copied()
            .unwrap_or(self.default_interval)
    }

    /// Block until at least the source's interval has elapsed since the last
    /// call for the same source, with ±20% jitter. Never fails; a first call
    /// for a source returns immediately.
    pub async fn wait(&self, source: &str) {
        self.wait_with_jitter(source, true).await;
    }

    pub async fn wait_with_jitter(&self, source: &str, jitter: bool) {
        let mut delay = self.interval_for(source);
        if jitter {
            let factor = rand::thread_rng().gen_range(0.8..=1.2);
            delay = (delay * factor).max(JITTER_FLOOR_SECS);
        }

        // The guard is held across the sleep so the wait and the timestamp
        // update are one atomic step.
        let mut state = self.state.lock().await;
        let entry = state.entry(source.to_string()).or_default();
        if let Some(last) = entry.last_request {
            let elapsed = last.elapsed().as_secs_f64();
            if elapsed < delay {
                let sleep_for = delay - elapsed;
                debug!(source, "rate limiting: sleeping {:.2}s", sleep_for);
                tokio::time::sleep(Duration::from_secs_f64(sleep_for)).await;
            }
        }
        entry.last_request = Some(Instant::now());
        entry.requests += 1;
    }

    /// Clear state for one source, or for all sources when `None`.
    pub async fn reset(&self, source: Option<&str>) {
        let mut state = self.state.lock().await;
        match source {
            Some(source) => {
                state.remove(source);
            }
            None => state.clear(),
        }
    }

    pub async fn request_count(&self, source: &str) -> u64 {
        self.state
            .lock()
            .await
            .get(source)
            .map(|entry| entry.requests)
            .unwrap_or(0)
    }
}
