//! Heuristic scraper for individual brewery websites.
//!
//! Every brewery's markup is different, so extraction is best-effort: find
//! repeated product blocks by class-name convention, fall back to anchors
//! that point at beer or product pages, and skip any block that does not
//! yield a usable name. Listing pages rarely carry ABV or style, so only
//! the name is required of a block.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::json;
use tracing::{debug, error, info, warn};

use super::{BeerSource, ScraperClient};
use crate::config::HarvestConfig;
use crate::domain::{BeerRecord, BreweryRecord, ScraperStats};
use crate::error::Result;
use crate::normalize::normalize_beer_record;

/// Static description of one brewery's website.
#[derive(Debug, Clone)]
pub struct SiteSpec {
    pub id: &'static str,
    pub brewery_name: &'static str,
    pub base_url: &'static str,
    pub beers_path: &'static str,
}

static BLOCK_CLASS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)product|beer|brew").unwrap());
static NAME_CLASS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)title|name|product").unwrap());
static DESCRIPTION_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)description|excerpt").unwrap());

static BLOCK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("div, article").unwrap());
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[href*="/beer/"], a[href*="/product/"]"#).unwrap());
static NAME_CANDIDATE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h2, h3, h4, a").unwrap());
static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static IMG_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());
static TEXT_BLOCK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("p, div").unwrap());

pub struct BrewerySiteScraper {
    spec: SiteSpec,
    client: ScraperClient,
}

impl BrewerySiteScraper {
    pub fn new(spec: SiteSpec, config: &HarvestConfig) -> Self {
        let client = ScraperClient::new(spec.id, config, config.check_robots);
        Self { spec, client }
    }

    pub fn brewery_name(&self) -> &str {
        self.spec.brewery_name
    }

    fn beers_url(&self) -> String {
        format!(
            "{}{}",
            self.spec.base_url.trim_end_matches('/'),
            self.spec.beers_path
        )
    }

    fn parse_listing(&self, html: &str, limit: Option<usize>) -> Vec<BeerRecord> {
        let document = Html::parse_document(html);
        let mut blocks: Vec<ElementRef<'_>> = document
            .select(&BLOCK_SELECTOR)
            .filter(|element| class_matches(element, &BLOCK_CLASS))
            .collect();
        if blocks.is_empty() {
            blocks = document.select(&LINK_SELECTOR).collect();
        }
        info!(
            "found {} candidate beer blocks on {}",
            blocks.len(),
            self.spec.id
        );

        let mut beers = Vec::new();
        for block in blocks {
            match self.parse_block(block) {
                Some(beer) => {
                    beers.push(beer);
                    self.client.record_beer_scraped();
                    if limit.is_some_and(|limit| beers.len() >= limit) {
                        break;
                    }
                }
                None => debug!("skipping block without a usable name"),
            }
        }
        beers
    }

    fn parse_block(&self, block: ElementRef<'_>) -> Option<BeerRecord> {
        let name = block_name(block)?;
        let image_url = block
            .select(&IMG_SELECTOR)
            .next()
            .and_then(|img| self.resolve_image_url(img));
        let description = block
            .select(&TEXT_BLOCK_SELECTOR)
            .find(|element| class_matches(element, &DESCRIPTION_CLASS))
            .and_then(element_text)
            .unwrap_or_default();

        let raw = json!({
            "name": name,
            "brewery": self.spec.brewery_name,
            "image_url": image_url,
            "description": description,
        });
        let beer = normalize_beer_record(&raw);
        if beer.name.as_deref().map_or(true, |n| n.is_empty()) {
            return None;
        }
        debug!("parsed beer: {:?}", beer.name);
        Some(beer)
    }

    /// Absolute image URL from src or data-src, resolving protocol-relative
    /// and site-relative paths against the site's base URL.
    fn resolve_image_url(&self, img: ElementRef<'_>) -> Option<String> {
        let src = img
            .value()
            .attr("src")
            .or_else(|| img.value().attr("data-src"))?;
        let base = self.spec.base_url.trim_end_matches('/');
        if src.starts_with("//") {
            Some(format!("https:{src}"))
        } else if src.starts_with('/') {
            Some(format!("{base}{src}"))
        } else if !src.starts_with("http") {
            Some(format!("{base}/{src}"))
        } else {
            Some(src.to_string())
        }
    }
}

#[async_trait]
impl BeerSource for BrewerySiteScraper {
    fn source_name(&self) -> &str {
        self.spec.id
    }

    /// A single brewery's site carries no brewery directory; the brewery
    /// row itself comes from the caller's worklist.
    async fn fetch_breweries(&self, _limit: Option<usize>) -> Result<Vec<BreweryRecord>> {
        Ok(Vec::new())
    }

    async fn fetch_beers(
        &self,
        _brewery: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<BeerRecord>> {
        let url = self.beers_url();
        info!("fetching beers from {url}");

        let response = match self.client.get(&url).await {
            Ok(Some(response)) => response,
            Ok(None) => {
                warn!(
                    "beer listing for {} skipped (robots.txt)",
                    self.spec.brewery_name
                );
                return Ok(Vec::new());
            }
            Err(e) => {
                error!("could not fetch beer listing for {}: {e}", self.spec.brewery_name);
                return Ok(Vec::new());
            }
        };
        let html = response.text().await?;

        let beers = self.parse_listing(&html, limit);
        info!("scraped {} beers from {}", beers.len(), self.spec.brewery_name);
        Ok(beers)
    }

    fn stats(&self) -> ScraperStats {
        self.client.stats()
    }
}

fn class_matches(element: &ElementRef<'_>, pattern: &Regex) -> bool {
    element
        .value()
        .attr("class")
        .is_some_and(|classes| pattern.is_match(classes))
}

fn element_text(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<String>().trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn block_name(block: ElementRef<'_>) -> Option<String> {
    // In anchor-fallback mode the block itself is the link.
    if block.value().name() == "a" {
        return element_text(block);
    }
    block
        .select(&NAME_CANDIDATE_SELECTOR)
        .find(|element| class_matches(element, &NAME_CLASS))
        .or_else(|| block.select(&ANCHOR_SELECTOR).next())
        .and_then(element_text)
}
