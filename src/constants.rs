//! Source identifiers and shared fixed strings.

/// Open Brewery DB directory API.
pub const OPEN_BREWERY_DB_SOURCE: &str = "openbrewerydb";

/// Unofficial ratings-platform client (behind the `ratings-platform` feature).
pub const RATINGS_SOURCE: &str = "ratings";

/// Every per-brewery website source id starts with this prefix, which is how
/// the config resolves the shared `brewery_sites` rate-limit class.
pub const BREWERY_SITE_SOURCE_PREFIX: &str = "brewery_";

/// Rate-limit class shared by all brewery-website sources.
pub const BREWERY_SITE_RATE_CLASS: &str = "brewery_sites";

/// Identity announced when no browser-like user agent is wanted.
pub const BOT_USER_AGENT: &str = "GreatBritishBeerBot/1.0 (+https://greatbritish.beer)";

/// Fallback when the rotation pool yields nothing.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Browser-like user agents; one is picked per scraper instance.
pub const USER_AGENT_POOL: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
];

/// Category assigned when a beer style cannot be mapped.
pub const DEFAULT_CATEGORY: &str = "Golden Ale";
