use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use gbb_scraper::domain::{BeerRecord, BreweryRecord, ScraperStats};
use gbb_scraper::error::Result;
use gbb_scraper::normalize::{normalize_beer_record, normalize_brewery_record};
use gbb_scraper::pipeline::Harvest;
use gbb_scraper::scrapers::BeerSource;
use gbb_scraper::storage::InMemoryStore;
use gbb_scraper::validate::{validate_beer, validate_brewery};

/// Source that replays fixed records, standing in for a live scraper.
struct FixtureSource {
    breweries: Vec<BreweryRecord>,
    beers: Vec<BeerRecord>,
}

#[async_trait]
impl BeerSource for FixtureSource {
    fn source_name(&self) -> &str {
        "fixture"
    }

    async fn fetch_breweries(&self, limit: Option<usize>) -> Result<Vec<BreweryRecord>> {
        let mut breweries = self.breweries.clone();
        if let Some(limit) = limit {
            breweries.truncate(limit);
        }
        Ok(breweries)
    }

    async fn fetch_beers(
        &self,
        _brewery: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<BeerRecord>> {
        let mut beers = self.beers.clone();
        if let Some(limit) = limit {
            beers.truncate(limit);
        }
        Ok(beers)
    }

    fn stats(&self) -> ScraperStats {
        ScraperStats::default()
    }
}

fn fixture() -> FixtureSource {
    // Raw scrape shapes, run through the same normalize path the scrapers use.
    let raw_beer = json!({
        "name": "  Punk IPA (330ml)  ",
        "brewery": "BrewDog",
        "abv": "5,6%",
        "ibu": "",
        "style": "American IPA",
    });
    let raw_brewery = json!({
        "name": "BrewDog Brewery Ltd.",
        "location": "Aberdeen, Scotland",
        "website": "www.brewdog.com",
    });
    FixtureSource {
        breweries: vec![normalize_brewery_record(&raw_brewery)],
        beers: vec![normalize_beer_record(&raw_beer)],
    }
}

#[test]
fn fixtures_normalize_to_valid_records() {
    let source = fixture();

    let beer = &source.beers[0];
    assert_eq!(beer.name.as_deref(), Some("Punk IPA"));
    assert_eq!(beer.abv, Some(5.6));
    assert_eq!(beer.ibu, None);
    assert_eq!(beer.category.as_deref(), Some("IPA"));
    assert!(validate_beer(beer).is_valid());

    let brewery = &source.breweries[0];
    assert_eq!(brewery.name.as_deref(), Some("BrewDog"));
    assert_eq!(brewery.location.as_deref(), Some("Aberdeen"));
    assert_eq!(brewery.website.as_deref(), Some("https://www.brewdog.com"));
    assert!(validate_brewery(brewery).is_valid());
}

#[tokio::test]
async fn rerunning_a_harvest_creates_no_duplicates() {
    let source = fixture();
    let store = Arc::new(InMemoryStore::new());
    let harvest = Harvest::new(store.clone());

    let first = harvest.run_breweries(&source, None).await;
    assert_eq!((first.found, first.created, first.skipped), (1, 1, 0));

    let first_beers = harvest.run_beers(&source, Some("BrewDog"), None).await;
    assert_eq!((first_beers.found, first_beers.created), (1, 1));
    assert_eq!(store.beer_count().await, 1);
    assert_eq!(store.category_count().await, 1);
    // The beer's brewery already existed; no stub row was added.
    assert_eq!(store.brewery_count().await, 1);

    // Same batch again: everything dedupes on natural keys.
    let second = harvest.run_breweries(&source, None).await;
    assert_eq!((second.created, second.skipped), (0, 1));
    let second_beers = harvest.run_beers(&source, Some("BrewDog"), None).await;
    assert_eq!((second_beers.created, second_beers.skipped), (0, 1));
    assert_eq!(store.beer_count().await, 1);
    assert_eq!(store.brewery_count().await, 1);
}

#[tokio::test]
async fn beer_harvest_creates_missing_referents() {
    let source = fixture();
    let store = Arc::new(InMemoryStore::new());
    let harvest = Harvest::new(store.clone());

    // No brewery run first: the beer brings a stub brewery and its category.
    let summary = harvest.run_beers(&source, Some("BrewDog"), None).await;
    assert_eq!(summary.created, 1);
    assert_eq!(store.brewery_count().await, 1);
    assert_eq!(store.category_count().await, 1);
}

#[tokio::test]
async fn fetch_limit_is_honored() {
    let mut source = fixture();
    let extra = BeerRecord {
        name: Some("Elvis Juice".to_string()),
        ..source.beers[0].clone()
    };
    source.beers.push(extra);

    let store = Arc::new(InMemoryStore::new());
    let harvest = Harvest::new(store.clone());
    let summary = harvest.run_beers(&source, Some("BrewDog"), Some(1)).await;
    assert_eq!(summary.found, 1);
    assert_eq!(store.beer_count().await, 1);
}

#[tokio::test]
async fn invalid_records_fail_storage_without_stopping_the_batch() {
    let mut source = fixture();
    // A record that lost its name upstream cannot be keyed.
    source.beers.push(BeerRecord {
        brewery: Some("BrewDog".to_string()),
        ..Default::default()
    });

    let store = Arc::new(InMemoryStore::new());
    let harvest = Harvest::new(store.clone());
    let summary = harvest.run_beers(&source, Some("BrewDog"), None).await;
    assert_eq!(summary.found, 2);
    assert_eq!(summary.created, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(store.beer_count().await, 1);
}
