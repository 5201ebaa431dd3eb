//! Unofficial ratings-platform scraper, behind the `ratings-platform`
//! feature.
//!
//! Delegates search and brewery listings to the bundled [`platform`] client
//! and converts its payloads into the shared raw-record shape before the
//! normal normalize/validate path. Orchestrators should check
//! [`super::platform_client_available`] before asking for this source.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use super::{BeerSource, ScraperClient};
use crate::config::HarvestConfig;
use crate::constants::RATINGS_SOURCE;
use crate::domain::{BeerRecord, BreweryRecord, ScraperStats};
use crate::error::Result;

/// Thin client for the platform's public JSON endpoints. Unofficial: the
/// endpoints are undocumented and may break without notice. All requests go
/// through the shared [`ScraperClient`] choke point.
mod platform {
    use serde_json::Value;

    use crate::error::Result;
    use crate::scrapers::ScraperClient;

    const SEARCH_URL: &str = "https://www.ratebeer.com/json/search.json";
    const BREWERY_URL: &str = "https://www.ratebeer.com/json/brewery.json";

    pub async fn search(client: &ScraperClient, query: &str) -> Result<Value> {
        let params = [("query", query.to_string())];
        match client.get_with_query(SEARCH_URL, &params).await? {
            Some(response) => Ok(response.json().await?),
            None => Ok(Value::Null),
        }
    }

    pub async fn brewery_detail(client: &ScraperClient, brewery_id: &str) -> Result<Value> {
        let params = [("id", brewery_id.to_string())];
        match client.get_with_query(BREWERY_URL, &params).await? {
            Some(response) => Ok(response.json().await?),
            None => Ok(Value::Null),
        }
    }
}

pub struct RatingsScraper {
    client: ScraperClient,
}

impl RatingsScraper {
    pub fn new(config: &HarvestConfig) -> Self {
        let client = ScraperClient::new(RATINGS_SOURCE, config, config.check_robots);
        info!("initialized ratings-platform client");
        Self { client }
    }

    /// Convert one platform beer payload into a validated record. The
    /// platform reports style, ABV, and IBU alongside the name.
    fn process_beer(&self, data: &Value, brewery_name: &str) -> Option<BeerRecord> {
        let raw = json!({
            "name": data.get("name").cloned().unwrap_or(Value::Null),
            "brewery": brewery_name,
            "style": data.get("style").cloned().unwrap_or_else(|| Value::String("Ale".to_string())),
            "abv": data.get("abv").cloned().unwrap_or(Value::Null),
            "ibu": data.get("ibu").cloned().unwrap_or(Value::Null),
            "description": data.get("description").cloned().unwrap_or(Value::Null),
        });
        let beer = self.client.validate_and_normalize_beer(&raw);
        match &beer {
            Some(beer) => debug!("processed beer: {:?}", beer.name),
            None => warn!(
                "validation failed for beer: {:?}",
                data.get("name").and_then(serde_json::Value::as_str)
            ),
        }
        beer
    }

    /// Search the platform for one beer by name and return its full record.
    pub async fn search_beer(&self, beer_name: &str) -> Result<Option<BeerRecord>> {
        info!("searching for beer: '{beer_name}'");
        let results = platform::search(&self.client, beer_name).await?;
        let Some(beer) = results
            .get("beers")
            .and_then(Value::as_array)
            .and_then(|beers| beers.first())
        else {
            warn!("no results for '{beer_name}'");
            return Ok(None);
        };
        let brewery_name = beer
            .get("brewery")
            .and_then(|brewery| brewery.get("name").or(Some(brewery)))
            .and_then(Value::as_str)
            .unwrap_or("Unknown Brewery")
            .to_string();
        Ok(self.process_beer(beer, &brewery_name))
    }
}

#[async_trait]
impl BeerSource for RatingsScraper {
    fn source_name(&self) -> &str {
        RATINGS_SOURCE
    }

    async fn fetch_breweries(&self, _limit: Option<usize>) -> Result<Vec<BreweryRecord>> {
        warn!("use the brewery directory for brewery data; the ratings platform covers beers");
        Ok(Vec::new())
    }

    async fn fetch_beers(
        &self,
        brewery: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<BeerRecord>> {
        let Some(brewery_name) = brewery else {
            warn!("brewery name required for a ratings-platform search");
            return Ok(Vec::new());
        };

        info!("searching ratings platform for beers from '{brewery_name}'");
        let results = match platform::search(&self.client, brewery_name).await {
            Ok(results) => results,
            Err(e) => {
                error!("ratings search failed for '{brewery_name}': {e}");
                return Ok(Vec::new());
            }
        };
        let Some(brewery_entry) = results
            .get("breweries")
            .and_then(Value::as_array)
            .and_then(|breweries| breweries.first())
        else {
            warn!("no breweries found for '{brewery_name}'");
            return Ok(Vec::new());
        };
        let Some(brewery_id) = entry_id(brewery_entry) else {
            warn!("no brewery id in search results for '{brewery_name}'");
            return Ok(Vec::new());
        };
        info!(
            "found brewery {:?} (id {brewery_id})",
            brewery_entry.get("name").and_then(serde_json::Value::as_str)
        );

        let detail = match platform::brewery_detail(&self.client, &brewery_id).await {
            Ok(detail) => detail,
            Err(e) => {
                error!("could not fetch brewery {brewery_id}: {e}");
                return Ok(Vec::new());
            }
        };
        let Some(beer_list) = detail.get("beers").and_then(Value::as_array) else {
            warn!("no beers found for brewery {brewery_id}");
            return Ok(Vec::new());
        };

        let mut beers = Vec::new();
        for data in beer_list {
            if let Some(beer) = self.process_beer(data, brewery_name) {
                beers.push(beer);
                self.client.record_beer_scraped();
                if limit.is_some_and(|limit| beers.len() >= limit) {
                    info!("reached limit of {} beers", beers.len());
                    break;
                }
            }
        }
        info!("fetched {} beers for '{brewery_name}'", beers.len());
        Ok(beers)
    }

    fn stats(&self) -> ScraperStats {
        self.client.stats()
    }
}

/// Platform ids arrive as either numbers or strings.
fn entry_id(entry: &Value) -> Option<String> {
    match entry.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
