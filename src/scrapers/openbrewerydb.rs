//! Open Brewery DB API scraper (<https://www.openbrewerydb.org/>).
//!
//! Free directory API, no key required. Brewery data only; the API has no
//! beer-level records.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use super::{BeerSource, ScraperClient};
use crate::config::HarvestConfig;
use crate::constants::OPEN_BREWERY_DB_SOURCE;
use crate::domain::{BeerRecord, BreweryRecord, ScraperStats};
use crate::error::Result;
use crate::normalize::title_case;

const BASE_URL: &str = "https://api.openbrewerydb.org/v1/breweries";
/// API page-size maximum.
const PER_PAGE: usize = 50;

pub struct OpenBreweryDbScraper {
    client: ScraperClient,
}

impl OpenBreweryDbScraper {
    pub fn new(config: &HarvestConfig) -> Self {
        // Trusted API endpoint: robots checking is skipped for this source.
        Self {
            client: ScraperClient::new(OPEN_BREWERY_DB_SOURCE, config, false),
        }
    }

    /// Map one API record into a validated brewery record.
    fn process_brewery(&self, data: &Value) -> Option<BreweryRecord> {
        let brewery_type = data
            .get("brewery_type")
            .and_then(Value::as_str)
            .unwrap_or("brewery");
        let raw = json!({
            "name": data.get("name").and_then(Value::as_str).unwrap_or(""),
            "location": build_location(data),
            "website": data.get("website_url").cloned().unwrap_or(Value::Null),
            "description": format!("{} brewery", title_case(brewery_type)),
        });
        let brewery = self.client.validate_and_normalize_brewery(&raw);
        match &brewery {
            Some(brewery) => debug!("processed brewery: {:?}", brewery.name),
            None => warn!(
                "validation failed for brewery: {:?}",
                data.get("name").and_then(serde_json::Value::as_str)
            ),
        }
        brewery
    }

    /// Search the directory for one brewery by name.
    pub async fn brewery_by_name(&self, name: &str) -> Result<Option<BreweryRecord>> {
        let query = [
            ("by_name", name.to_string()),
            ("by_country", "united_kingdom".to_string()),
        ];
        let Some(response) = self.client.get_with_query(BASE_URL, &query).await? else {
            return Ok(None);
        };
        let data: Vec<Value> = response.json().await?;
        Ok(data.first().and_then(|entry| self.process_brewery(entry)))
    }
}

#[async_trait]
impl BeerSource for OpenBreweryDbScraper {
    fn source_name(&self) -> &str {
        OPEN_BREWERY_DB_SOURCE
    }

    /// Paginate the directory until a short or empty page, or the limit.
    /// Page-level failures end the walk but keep whatever was harvested.
    async fn fetch_breweries(&self, limit: Option<usize>) -> Result<Vec<BreweryRecord>> {
        let mut breweries = Vec::new();
        let mut page = 1usize;
        info!("fetching breweries from Open Brewery DB");

        loop {
            let query = [
                ("by_country", "England".to_string()),
                ("per_page", PER_PAGE.to_string()),
                ("page", page.to_string()),
            ];
            debug!("fetching page {page} (per_page={PER_PAGE})");

            let response = match self.client.get_with_query(BASE_URL, &query).await {
                Ok(Some(response)) => response,
                Ok(None) => {
                    warn!("no response for page {page}");
                    break;
                }
                Err(e) => {
                    error!("error fetching page {page}: {e}");
                    break;
                }
            };
            let data: Vec<Value> = match response.json().await {
                Ok(data) => data,
                Err(e) => {
                    error!("error decoding page {page}: {e}");
                    break;
                }
            };
            if data.is_empty() {
                info!("no more breweries after page {}", page - 1);
                break;
            }

            for entry in &data {
                if let Some(brewery) = self.process_brewery(entry) {
                    breweries.push(brewery);
                    self.client.record_brewery_scraped();
                    if limit.is_some_and(|limit| breweries.len() >= limit) {
                        info!("reached limit of {} breweries", breweries.len());
                        return Ok(breweries);
                    }
                }
            }

            info!(
                "fetched {} breweries from page {page} (total: {})",
                data.len(),
                breweries.len()
            );
            if data.len() < PER_PAGE {
                info!("reached last page");
                break;
            }
            page += 1;
        }

        info!(
            "fetched total of {} breweries from Open Brewery DB",
            breweries.len()
        );
        Ok(breweries)
    }

    async fn fetch_beers(
        &self,
        _brewery: Option<&str>,
        _limit: Option<usize>,
    ) -> Result<Vec<BeerRecord>> {
        warn!("Open Brewery DB does not provide beer-level data");
        Ok(Vec::new())
    }

    fn stats(&self) -> ScraperStats {
        self.client.stats()
    }
}

/// Location string from the API's city and state fields, falling back to
/// the country when neither is present.
fn build_location(data: &Value) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(city) = data
        .get("city")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    {
        parts.push(city);
    }
    let state = data
        .get("state_province")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            data.get("state")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        });
    if let Some(state) = state {
        parts.push(state);
    }
    if parts.is_empty() {
        "United Kingdom".to_string()
    } else {
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_record() -> Value {
        json!({
            "id": "b54b16e1-ac3b-4bff-a11f-f7ae9ddc27e0",
            "name": "BrewDog Brewery",
            "brewery_type": "large",
            "city": "Aberdeen",
            "state_province": "Scotland",
            "country": "United Kingdom",
            "website_url": "https://www.brewdog.com",
        })
    }

    #[test]
    fn api_record_maps_to_normalized_brewery() {
        let scraper = OpenBreweryDbScraper::new(&HarvestConfig::default());
        let brewery = scraper.process_brewery(&api_record()).unwrap();
        assert_eq!(brewery.name.as_deref(), Some("BrewDog"));
        // ", Scotland" is a literal trailing suffix and gets stripped.
        assert_eq!(brewery.location.as_deref(), Some("Aberdeen"));
        assert_eq!(brewery.website.as_deref(), Some("https://www.brewdog.com"));
        assert_eq!(brewery.description.as_deref(), Some("Large brewery"));
    }

    #[test]
    fn nameless_record_is_rejected() {
        let scraper = OpenBreweryDbScraper::new(&HarvestConfig::default());
        let mut record = api_record();
        record["name"] = Value::String(String::new());
        assert!(scraper.process_brewery(&record).is_none());
        assert_eq!(scraper.stats().validation_errors, 1);
    }

    #[test]
    fn location_assembly() {
        assert_eq!(
            build_location(&json!({"city": "Lewes", "state": "England"})),
            "Lewes, England"
        );
        assert_eq!(build_location(&json!({"city": "Leeds"})), "Leeds");
        assert_eq!(build_location(&json!({})), "United Kingdom");
        // state_province wins over state when both are present
        assert_eq!(
            build_location(&json!({"state_province": "Wales", "state": "Cymru"})),
            "Wales"
        );
    }
}
