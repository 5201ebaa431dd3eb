//! Transport politeness: request spacing, robots.txt compliance, and
//! bounded retry with backoff.

pub mod rate_limiter;
pub mod retry;
pub mod robots;

pub use rate_limiter::RateLimiter;
pub use retry::RetryStrategy;
pub use robots::{RobotsChecker, RobotsPolicy};
