//! Data shapes shared across the harvesting pipeline.

use serde::{Deserialize, Serialize};

/// Untyped field map captured straight off a source, before normalization.
/// Ephemeral: produced by a scraper, consumed once by the normalizers.
pub type RawRecord = serde_json::Value;

/// Beer record after field normalization. Field absence means the source
/// did not supply a usable value; validation decides what is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeerRecord {
    pub name: Option<String>,
    pub brewery: Option<String>,
    pub style: Option<String>,
    pub category: Option<String>,
    pub abv: Option<f64>,
    pub ibu: Option<u32>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub image_url: Option<String>,
}

/// Brewery record after field normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BreweryRecord {
    pub name: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    /// Kept as scraped; validation coerces it so a malformed year is
    /// reported instead of silently dropped.
    pub founded_year: Option<String>,
}

impl BeerRecord {
    /// Persistence identity: lowercased (name, brewery), present only when
    /// both parts are usable.
    pub fn natural_key(&self) -> Option<(String, String)> {
        let name = non_blank(self.name.as_deref())?;
        let brewery = non_blank(self.brewery.as_deref())?;
        Some((name, brewery))
    }
}

impl BreweryRecord {
    /// Persistence identity: lowercased name.
    pub fn natural_key(&self) -> Option<String> {
        non_blank(self.name.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

/// Per-scraper-instance counters. Created with the scraper, incremented
/// during operation, read on demand, resettable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScraperStats {
    pub requests_made: u64,
    pub breweries_scraped: u64,
    pub beers_scraped: u64,
    pub validation_errors: u64,
    pub http_errors: u64,
}

impl ScraperStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beer_natural_key_requires_both_parts() {
        let beer = BeerRecord {
            name: Some("Punk IPA".to_string()),
            brewery: Some("BrewDog".to_string()),
            ..Default::default()
        };
        assert_eq!(
            beer.natural_key(),
            Some(("punk ipa".to_string(), "brewdog".to_string()))
        );

        let nameless = BeerRecord {
            brewery: Some("BrewDog".to_string()),
            ..Default::default()
        };
        assert_eq!(nameless.natural_key(), None);

        let blank = BeerRecord {
            name: Some("   ".to_string()),
            brewery: Some("BrewDog".to_string()),
            ..Default::default()
        };
        assert_eq!(blank.natural_key(), None);
    }

    #[test]
    fn stats_reset_clears_counters() {
        let mut stats = ScraperStats {
            requests_made: 4,
            http_errors: 1,
            ..Default::default()
        };
        stats.reset();
        assert_eq!(stats, ScraperStats::default());
    }
}
