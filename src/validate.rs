//! Structural and range validation of normalized records.
//!
//! Validators never mutate input and never short-circuit: every violation
//! lands in the report so a batch operator sees the complete picture in one
//! pass. Run normalization first when canonical values are wanted.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{BeerRecord, BreweryRecord};

pub const MAX_NAME_LENGTH: usize = 200;
pub const MAX_STYLE_LENGTH: usize = 100;
pub const MAX_LOCATION_LENGTH: usize = 200;
pub const IBU_MAX: u32 = 120;

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://[^\s/$.?#].[^\s]*$").unwrap());

const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp"];

/// Outcome of validating one record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn preview(value: &str) -> String {
    value.chars().take(50).collect()
}

pub fn validate_beer(beer: &BeerRecord) -> ValidationReport {
    let mut errors = Vec::new();

    let mut missing = Vec::new();
    if is_blank(&beer.name) {
        missing.push("name");
    }
    if is_blank(&beer.brewery) {
        missing.push("brewery");
    }
    if is_blank(&beer.category) {
        missing.push("category");
    }
    if beer.abv.is_none() {
        missing.push("abv");
    }
    if is_blank(&beer.style) {
        missing.push("style");
    }
    if !missing.is_empty() {
        errors.push(format!("Missing required fields: {}", missing.join(", ")));
    }

    if let Some(abv) = beer.abv {
        if !(0.0..=50.0).contains(&abv) {
            errors.push(format!("ABV must be between 0 and 50, got {abv}"));
        }
    }
    if let Some(ibu) = beer.ibu {
        if ibu > IBU_MAX {
            errors.push(format!("IBU must be between 0 and 120, got {ibu}"));
        }
    }
    if let Some(name) = &beer.name {
        if name.chars().count() > MAX_NAME_LENGTH {
            errors.push(format!(
                "Beer name too long (max {MAX_NAME_LENGTH} characters): {}...",
                preview(name)
            ));
        }
    }
    if let Some(style) = &beer.style {
        if style.chars().count() > MAX_STYLE_LENGTH {
            errors.push(format!(
                "Beer style too long (max {MAX_STYLE_LENGTH} characters): {}...",
                preview(style)
            ));
        }
    }

    ValidationReport { errors }
}

pub fn validate_brewery(brewery: &BreweryRecord) -> ValidationReport {
    let mut errors = Vec::new();

    let mut missing = Vec::new();
    if is_blank(&brewery.name) {
        missing.push("name");
    }
    if is_blank(&brewery.location) {
        missing.push("location");
    }
    if !missing.is_empty() {
        errors.push(format!("Missing required fields: {}", missing.join(", ")));
    }

    if let Some(name) = &brewery.name {
        if name.chars().count() > MAX_NAME_LENGTH {
            errors.push(format!(
                "Brewery name too long (max {MAX_NAME_LENGTH} characters): {}...",
                preview(name)
            ));
        }
    }
    if let Some(location) = &brewery.location {
        if location.chars().count() > MAX_LOCATION_LENGTH {
            errors.push(format!(
                "Location too long (max {MAX_LOCATION_LENGTH} characters): {}...",
                preview(location)
            ));
        }
    }
    if let Some(website) = brewery.website.as_deref().map(str::trim) {
        if !website.is_empty()
            && !website.starts_with("http://")
            && !website.starts_with("https://")
        {
            errors.push(format!(
                "Invalid website URL (must start with http:// or https://): {website}"
            ));
        }
    }
    if let Some(year) = brewery.founded_year.as_deref().map(str::trim) {
        if !year.is_empty() {
            match year.parse::<i32>() {
                Ok(year) if (1000..=2030).contains(&year) => {}
                Ok(year) => errors.push(format!(
                    "Invalid founded year (must be between 1000 and 2030): {year}"
                )),
                Err(_) => errors.push(format!("Invalid founded year format: {year}")),
            }
        }
    }

    ValidationReport { errors }
}

/// Basic structural URL check.
pub fn validate_url(url: &str) -> bool {
    !url.is_empty() && URL_PATTERN.is_match(url)
}

/// Permissive image-URL check: a known extension anywhere in the URL, or a
/// query string (CDN image URLs often carry no extension).
pub fn validate_image_url(url: &str) -> bool {
    if !validate_url(url) {
        return false;
    }
    let lowered = url.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lowered.contains(ext)) || url.contains('?')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_beer() -> BeerRecord {
        BeerRecord {
            name: Some("Punk IPA".to_string()),
            brewery: Some("BrewDog".to_string()),
            style: Some("American IPA".to_string()),
            category: Some("IPA".to_string()),
            abv: Some(5.6),
            ibu: Some(45),
            ..Default::default()
        }
    }

    fn valid_brewery() -> BreweryRecord {
        BreweryRecord {
            name: Some("BrewDog".to_string()),
            location: Some("Aberdeen".to_string()),
            website: Some("https://www.brewdog.com".to_string()),
            founded_year: Some("2007".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn complete_beer_passes() {
        assert!(validate_beer(&valid_beer()).is_valid());
    }

    #[test]
    fn missing_fields_are_reported_together() {
        let beer = BeerRecord {
            name: None,
            abv: None,
            ..valid_beer()
        };
        let report = validate_beer(&beer);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("name"));
        assert!(report.errors[0].contains("abv"));
    }

    #[test]
    fn violations_accumulate_without_short_circuit() {
        let beer = BeerRecord {
            name: Some("x".repeat(201)),
            abv: Some(60.0),
            ibu: Some(130),
            ..valid_beer()
        };
        let report = validate_beer(&beer);
        assert_eq!(report.errors.len(), 3);
    }

    #[test]
    fn whitespace_only_name_counts_as_missing() {
        let beer = BeerRecord {
            name: Some("   ".to_string()),
            ..valid_beer()
        };
        let report = validate_beer(&beer);
        assert!(report.errors[0].contains("name"));
    }

    #[test]
    fn style_length_is_capped() {
        let beer = BeerRecord {
            style: Some("y".repeat(101)),
            ..valid_beer()
        };
        assert!(!validate_beer(&beer).is_valid());
    }

    #[test]
    fn complete_brewery_passes() {
        assert!(validate_brewery(&valid_brewery()).is_valid());
    }

    #[test]
    fn brewery_requires_name_and_location() {
        let report = validate_brewery(&BreweryRecord::default());
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("name"));
        assert!(report.errors[0].contains("location"));
    }

    #[test]
    fn brewery_website_scheme_is_checked() {
        let brewery = BreweryRecord {
            website: Some("www.brewdog.com".to_string()),
            ..valid_brewery()
        };
        let report = validate_brewery(&brewery);
        assert!(report.errors[0].contains("website URL"));
    }

    #[test]
    fn founded_year_bounds_and_format() {
        let out_of_range = BreweryRecord {
            founded_year: Some("2031".to_string()),
            ..valid_brewery()
        };
        assert!(validate_brewery(&out_of_range).errors[0].contains("between 1000 and 2030"));

        let malformed = BreweryRecord {
            founded_year: Some("soon".to_string()),
            ..valid_brewery()
        };
        assert!(validate_brewery(&malformed).errors[0].contains("format"));

        let ancient = BreweryRecord {
            founded_year: Some("1040".to_string()),
            ..valid_brewery()
        };
        assert!(validate_brewery(&ancient).is_valid());
    }

    #[test]
    fn url_helpers() {
        assert!(validate_url("https://example.com/beers"));
        assert!(!validate_url("example.com"));
        assert!(!validate_url(""));

        assert!(validate_image_url("https://cdn.example.com/punk.jpg"));
        assert!(validate_image_url("https://cdn.example.com/img?id=42"));
        assert!(!validate_image_url("https://example.com/page.html"));
    }
}
