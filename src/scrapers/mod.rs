//! Source scrapers.
//!
//! Each data source implements [`BeerSource`]; shared transport, politeness,
//! and validation live in [`client::ScraperClient`]. "This source has no
//! such data" is an empty list, never an error.

pub mod brewery_site;
pub mod client;
pub mod openbrewerydb;
#[cfg(feature = "ratings-platform")]
pub mod ratings;
pub mod sites;

use async_trait::async_trait;

use crate::config::HarvestConfig;
use crate::constants::{OPEN_BREWERY_DB_SOURCE, RATINGS_SOURCE};
use crate::domain::{BeerRecord, BreweryRecord, ScraperStats};
use crate::error::Result;

pub use client::ScraperClient;

#[async_trait]
pub trait BeerSource: Send + Sync {
    /// Identifier used for rate limiting, logging, and CLI selection.
    fn source_name(&self) -> &str;

    /// Fetch breweries, up to `limit` when set.
    async fn fetch_breweries(&self, limit: Option<usize>) -> Result<Vec<BreweryRecord>>;

    /// Fetch beers, optionally restricted to one brewery.
    async fn fetch_beers(
        &self,
        brewery: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<BeerRecord>>;

    fn stats(&self) -> ScraperStats;
}

/// Whether the bundled ratings-platform client was compiled in. Check this
/// before asking for the `ratings` source.
pub fn platform_client_available() -> bool {
    cfg!(feature = "ratings-platform")
}

/// Instantiate a source by id. Unknown ids, including `ratings` in a build
/// without the feature, come back as `None`.
pub fn create_source(source_id: &str, config: &HarvestConfig) -> Option<Box<dyn BeerSource>> {
    match source_id {
        OPEN_BREWERY_DB_SOURCE => Some(Box::new(openbrewerydb::OpenBreweryDbScraper::new(config))),
        #[cfg(feature = "ratings-platform")]
        RATINGS_SOURCE => Some(Box::new(ratings::RatingsScraper::new(config))),
        _ => sites::by_id(source_id, config).map(|s| Box::new(s) as Box<dyn BeerSource>),
    }
}

pub fn available_sources() -> Vec<&'static str> {
    let mut sources = vec![OPEN_BREWERY_DB_SOURCE];
    if platform_client_available() {
        sources.push(RATINGS_SOURCE);
    }
    sources.extend(sites::site_ids());
    sources
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_resolves_known_sources() {
        let config = HarvestConfig::default();
        assert!(create_source(OPEN_BREWERY_DB_SOURCE, &config).is_some());
        assert!(create_source("brewery_dark_star", &config).is_some());
        assert!(create_source("nope", &config).is_none());
    }

    #[test]
    fn ratings_source_tracks_the_feature_flag() {
        let config = HarvestConfig::default();
        assert_eq!(
            create_source(RATINGS_SOURCE, &config).is_some(),
            platform_client_available()
        );
    }

    #[test]
    fn directory_source_is_always_listed() {
        assert!(available_sources().contains(&OPEN_BREWERY_DB_SOURCE));
    }
}
