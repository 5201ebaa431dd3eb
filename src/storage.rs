//! Create-if-absent persistence boundary.
//!
//! The harvester does not own a database. Callers bring a [`CatalogStore`]
//! keyed by natural identity: brewery by name, beer by (name, brewery),
//! category by name. The in-memory store backs the CLI and tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{BeerRecord, BreweryRecord};
use crate::error::{Result, ScraperError};

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Returns true when a new row was created, false when a brewery with
    /// the same name already existed.
    async fn create_brewery_if_absent(&self, brewery: &BreweryRecord) -> Result<bool>;

    /// Beer identity is (name, brewery).
    async fn create_beer_if_absent(&self, beer: &BeerRecord) -> Result<bool>;

    async fn create_category_if_absent(&self, name: &str) -> Result<bool>;
}

#[derive(Default)]
pub struct InMemoryStore {
    breweries: Mutex<HashMap<String, BreweryRecord>>,
    beers: Mutex<HashMap<(String, String), BeerRecord>>,
    categories: Mutex<HashSet<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn brewery_count(&self) -> usize {
        self.breweries.lock().await.len()
    }

    pub async fn beer_count(&self) -> usize {
        self.beers.lock().await.len()
    }

    pub async fn category_count(&self) -> usize {
        self.categories.lock().await.len()
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn create_brewery_if_absent(&self, brewery: &BreweryRecord) -> Result<bool> {
        let key = brewery
            .natural_key()
            .ok_or_else(|| ScraperError::MissingField("brewery name".to_string()))?;
        let mut breweries = self.breweries.lock().await;
        if breweries.contains_key(&key) {
            return Ok(false);
        }
        breweries.insert(key, brewery.clone());
        Ok(true)
    }

    async fn create_beer_if_absent(&self, beer: &BeerRecord) -> Result<bool> {
        let key = beer
            .natural_key()
            .ok_or_else(|| ScraperError::MissingField("beer name and brewery".to_string()))?;
        let mut beers = self.beers.lock().await;
        if beers.contains_key(&key) {
            return Ok(false);
        }
        beers.insert(key, beer.clone());
        Ok(true)
    }

    async fn create_category_if_absent(&self, name: &str) -> Result<bool> {
        let key = name.trim().to_lowercase();
        if key.is_empty() {
            return Err(ScraperError::MissingField("category name".to_string()));
        }
        Ok(self.categories.lock().await.insert(key))
    }
}
