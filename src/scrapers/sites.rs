//! Known brewery websites.
//!
//! One entry per brewery storefront. Markup differs per site; the shared
//! heuristics in [`BrewerySiteScraper`] do the extraction, so an entry is
//! just the site coordinates.

use super::brewery_site::{BrewerySiteScraper, SiteSpec};
use crate::config::HarvestConfig;

pub const SITES: &[SiteSpec] = &[
    SiteSpec {
        id: "brewery_dark_star",
        brewery_name: "Dark Star Brewing Co",
        base_url: "https://www.darkstarbrewing.co.uk",
        beers_path: "/beers",
    },
    SiteSpec {
        id: "brewery_harveys",
        brewery_name: "Harveys & Son",
        base_url: "https://www.harveys.org.uk",
        beers_path: "/beers",
    },
    SiteSpec {
        id: "brewery_brighton_bier",
        brewery_name: "Brighton Bier",
        base_url: "https://brightonbier.com",
        beers_path: "/shop",
    },
    SiteSpec {
        id: "brewery_burning_sky",
        brewery_name: "Burning Sky Brewery",
        base_url: "https://www.burningskybeer.com",
        beers_path: "/beers",
    },
];

pub fn spec_by_id(id: &str) -> Option<&'static SiteSpec> {
    SITES.iter().find(|spec| spec.id == id)
}

pub fn by_id(id: &str, config: &HarvestConfig) -> Option<BrewerySiteScraper> {
    spec_by_id(id).map(|spec| BrewerySiteScraper::new(spec.clone(), config))
}

pub fn site_ids() -> Vec<&'static str> {
    SITES.iter().map(|spec| spec.id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::BREWERY_SITE_SOURCE_PREFIX;

    #[test]
    fn all_site_ids_carry_the_brewery_prefix() {
        for spec in SITES {
            assert!(spec.id.starts_with(BREWERY_SITE_SOURCE_PREFIX), "{}", spec.id);
        }
    }

    #[test]
    fn lookup_by_id() {
        assert!(spec_by_id("brewery_dark_star").is_some());
        assert!(spec_by_id("brewery_unknown").is_none());
        assert!(by_id("brewery_harveys", &HarvestConfig::default()).is_some());
    }
}
