//! Batch harvest orchestration.
//!
//! Fetch from a source, persist create-if-absent, and always run to
//! completion: one failing record or source costs only itself, and the run
//! ends with a summary of counts rather than an early abort.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::config::HarvestConfig;
use crate::domain::{BeerRecord, BreweryRecord};
use crate::scrapers::{self, BeerSource};
use crate::storage::CatalogStore;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HarvestSummary {
    pub found: u64,
    pub created: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl HarvestSummary {
    pub fn absorb(&mut self, other: &HarvestSummary) {
        self.found += other.found;
        self.created += other.created;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

pub struct Harvest {
    store: Arc<dyn CatalogStore>,
}

impl Harvest {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Harvest breweries from one source and persist them.
    pub async fn run_breweries(
        &self,
        source: &dyn BeerSource,
        limit: Option<usize>,
    ) -> HarvestSummary {
        let started = Utc::now();
        let mut summary = HarvestSummary::default();

        let breweries = match source.fetch_breweries(limit).await {
            Ok(breweries) => breweries,
            Err(e) => {
                error!("brewery fetch failed for {}: {e}", source.source_name());
                summary.failed += 1;
                return summary;
            }
        };
        summary.found = breweries.len() as u64;

        for brewery in &breweries {
            self.store_brewery(brewery, &mut summary).await;
        }

        info!(
            "brewery harvest for {} finished in {}s: {} found, {} created, {} skipped, {} failed",
            source.source_name(),
            (Utc::now() - started).num_seconds(),
            summary.found,
            summary.created,
            summary.skipped,
            summary.failed
        );
        summary
    }

    /// Harvest beers from one source, creating brewery and category rows as
    /// needed so every stored beer has its referents.
    pub async fn run_beers(
        &self,
        source: &dyn BeerSource,
        brewery: Option<&str>,
        limit: Option<usize>,
    ) -> HarvestSummary {
        let started = Utc::now();
        let mut summary = HarvestSummary::default();

        let beers = match source.fetch_beers(brewery, limit).await {
            Ok(beers) => beers,
            Err(e) => {
                error!("beer fetch failed for {}: {e}", source.source_name());
                summary.failed += 1;
                return summary;
            }
        };
        summary.found = beers.len() as u64;

        for beer in &beers {
            self.ensure_referents(beer).await;
            match self.store.create_beer_if_absent(beer).await {
                Ok(true) => summary.created += 1,
                Ok(false) => summary.skipped += 1,
                Err(e) => {
                    warn!("could not store beer {:?}: {e}", beer.name);
                    summary.failed += 1;
                }
            }
        }

        info!(
            "beer harvest for {} finished in {}s: {} found, {} created, {} skipped, {} failed",
            source.source_name(),
            (Utc::now() - started).num_seconds(),
            summary.found,
            summary.created,
            summary.skipped,
            summary.failed
        );
        summary
    }

    /// Process a caller-supplied worklist of (brewery name, source id)
    /// pairs. Unknown sources are counted and skipped; the batch never
    /// stops early.
    pub async fn run_worklist(
        &self,
        worklist: &[(String, String)],
        config: &HarvestConfig,
    ) -> HarvestSummary {
        let mut total = HarvestSummary::default();
        for (brewery_name, source_id) in worklist {
            info!("processing {brewery_name} via {source_id}");
            let Some(source) = scrapers::create_source(source_id, config) else {
                warn!("unknown source: {source_id}");
                total.failed += 1;
                continue;
            };
            let summary = self
                .run_beers(source.as_ref(), Some(brewery_name), config.limit)
                .await;
            total.absorb(&summary);
        }
        total
    }

    async fn store_brewery(&self, brewery: &BreweryRecord, summary: &mut HarvestSummary) {
        match self.store.create_brewery_if_absent(brewery).await {
            Ok(true) => summary.created += 1,
            Ok(false) => summary.skipped += 1,
            Err(e) => {
                warn!("could not store brewery {:?}: {e}", brewery.name);
                summary.failed += 1;
            }
        }
    }

    /// Create the category and a stub brewery row for a beer when they are
    /// not stored yet. Failures here are logged only; the beer row decides
    /// the summary counts.
    async fn ensure_referents(&self, beer: &BeerRecord) {
        if let Some(category) = beer.category.as_deref() {
            if let Err(e) = self.store.create_category_if_absent(category).await {
                warn!("could not store category {category:?}: {e}");
            }
        }
        if let Some(name) = beer.brewery.as_deref() {
            let stub = BreweryRecord {
                name: Some(name.to_string()),
                location: Some("United Kingdom".to_string()),
                description: Some(format!("{name} brewery")),
                ..Default::default()
            };
            if let Err(e) = self.store.create_brewery_if_absent(&stub).await {
                warn!("could not store brewery {name:?}: {e}");
            }
        }
    }
}
