//! Field normalizers for scraped beer and brewery data.
//!
//! Pure functions: raw strings in, canonical values out. Unknown tokens and
//! unparseable input degrade to `None`, never to an error, so one bad field
//! cannot sink a whole record.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::constants::DEFAULT_CATEGORY;
use crate::domain::{BeerRecord, BreweryRecord, RawRecord};

/// Default cap applied by the record-level description normalization.
pub const DESCRIPTION_MAX_LENGTH: usize = 1000;

/// Tokens sources use for "we do not know". Compared case-insensitively.
const UNKNOWN_TOKENS: &[&str] = &["n/a", "tbc", "unknown", "varies", "-", "null", "none"];

/// Style to category mapping. Order matters: the containment fallback in
/// [`style_to_category`] walks this list top to bottom and the first hit wins.
pub static STYLE_TO_CATEGORY: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        // IPA variations
        ("american ipa", "IPA"),
        ("english ipa", "IPA"),
        ("british ipa", "IPA"),
        ("ipa", "IPA"),
        ("india pale ale", "IPA"),
        ("double ipa", "IPA"),
        ("imperial ipa", "IPA"),
        ("session ipa", "IPA"),
        ("new england ipa", "IPA"),
        ("neipa", "IPA"),
        ("west coast ipa", "IPA"),
        // Pale Ale variations
        ("pale ale", "Pale Ale"),
        ("american pale ale", "Pale Ale"),
        ("english pale ale", "Pale Ale"),
        ("apa", "Pale Ale"),
        ("epa", "Pale Ale"),
        // Bitter variations
        ("bitter", "Bitter"),
        ("best bitter", "Bitter"),
        ("extra special bitter", "Bitter"),
        ("esb", "Bitter"),
        ("premium bitter", "Bitter"),
        ("session bitter", "Bitter"),
        // Stout variations
        ("stout", "Stout"),
        ("dry stout", "Stout"),
        ("irish stout", "Stout"),
        ("milk stout", "Stout"),
        ("sweet stout", "Stout"),
        ("cream stout", "Stout"),
        ("oatmeal stout", "Stout"),
        ("imperial stout", "Stout"),
        ("russian imperial stout", "Stout"),
        ("chocolate stout", "Stout"),
        ("coffee stout", "Stout"),
        // Porter variations
        ("porter", "Porter"),
        ("robust porter", "Porter"),
        ("baltic porter", "Porter"),
        ("brown porter", "Porter"),
        // Lager variations
        ("lager", "Lager"),
        ("pilsner", "Lager"),
        ("pilsener", "Lager"),
        ("pils", "Lager"),
        ("helles", "Lager"),
        ("munich helles", "Lager"),
        ("vienna lager", "Lager"),
        ("märzen", "Lager"),
        ("oktoberfest", "Lager"),
        ("bock", "Lager"),
        ("doppelbock", "Lager"),
        ("dunkel", "Lager"),
        ("schwarzbier", "Lager"),
        // Wheat beer variations
        ("wheat", "Wheat Beer"),
        ("wheat beer", "Wheat Beer"),
        ("weizen", "Wheat Beer"),
        ("weissbier", "Wheat Beer"),
        ("hefeweizen", "Wheat Beer"),
        ("witbier", "Wheat Beer"),
        ("white beer", "Wheat Beer"),
        // Golden Ale variations
        ("golden ale", "Golden Ale"),
        ("blonde ale", "Golden Ale"),
        ("blonde", "Golden Ale"),
        ("summer ale", "Golden Ale"),
        // Amber Ale variations
        ("amber ale", "Amber Ale"),
        ("amber", "Amber Ale"),
        ("red ale", "Amber Ale"),
        ("irish red ale", "Amber Ale"),
        // Brown Ale variations
        ("brown ale", "Brown Ale"),
        ("brown", "Brown Ale"),
        ("english brown ale", "Brown Ale"),
        ("american brown ale", "Brown Ale"),
        ("nut brown ale", "Brown Ale"),
        // Mild variations
        ("mild", "Mild"),
        ("dark mild", "Mild"),
        ("light mild", "Mild"),
        // Strong Ale variations
        ("strong ale", "Strong Ale"),
        ("old ale", "Strong Ale"),
        ("barley wine", "Strong Ale"),
        ("barleywine", "Strong Ale"),
        ("english strong ale", "Strong Ale"),
        ("scotch ale", "Strong Ale"),
        ("wee heavy", "Strong Ale"),
    ]
});

/// Corporate suffixes stripped from brewery names, checked in order against
/// the current value in a single pass. Legal forms come first so that
/// "BrewDog Brewery Ltd." sheds " Ltd." and then " Brewery".
const BREWERY_SUFFIXES: &[&str] = &[
    " Ltd.",
    " Ltd",
    " Limited",
    " plc",
    " PLC",
    " Brewery",
    " Brewing Company",
    " Brewing Co.",
    " Brewing",
    " Brewers",
    " Beer Company",
    " Beer Co.",
];

/// Literal trailing suffixes stripped from locations. Bare nation names with
/// no leading comma ("Scotland" alone) are deliberately left untouched.
const LOCATION_SUFFIXES: &[&str] = &[
    ", UK",
    ", United Kingdom",
    ", England",
    ", Scotland",
    ", Wales",
    ", Northern Ireland",
    ", GB",
    ", Great Britain",
];

static NUMERIC_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+[.,]\d+|\d+)").unwrap());
static INT_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)").unwrap());
static VOLUME_PARENS_ML: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\(\d+ml\)").unwrap());
static VOLUME_PARENS_CL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\(\d+\s*cl\)").unwrap());
static VOLUME_TRAILING_ML: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\d+ml").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn is_unknown_token(value: &str) -> bool {
    let lowered = value.to_lowercase();
    UNKNOWN_TOKENS.contains(&lowered.as_str())
}

/// Extract an ABV percentage from formats like "4.5%", "4,5%" or "ABV: 4.5".
/// Out-of-range values and unknown tokens come back as `None`.
pub fn normalize_abv(raw: &str) -> Option<f64> {
    let value = raw.trim();
    if value.is_empty() || is_unknown_token(value) {
        return None;
    }
    let token = NUMERIC_TOKEN.find(value)?.as_str().replace(',', ".");
    let abv: f64 = token.parse().ok()?;
    (0.0..=50.0).contains(&abv).then_some(abv)
}

/// Extract an IBU reading. IBU is optional everywhere, so anything that does
/// not parse cleanly, including out-of-range values, degrades to `None`.
pub fn normalize_ibu(raw: &str) -> Option<u32> {
    let value = raw.trim();
    if value.is_empty() || is_unknown_token(value) {
        return None;
    }
    let ibu: u32 = INT_TOKEN.find(value)?.as_str().parse().ok()?;
    (ibu <= 120).then_some(ibu)
}

/// Map a beer style to one of the canonical categories: exact lookup first,
/// then substring containment in table order, then the default category.
pub fn style_to_category(raw_style: &str) -> &'static str {
    let style = raw_style.trim().to_lowercase();
    if style.is_empty() {
        return DEFAULT_CATEGORY;
    }
    for (key, category) in STYLE_TO_CATEGORY.iter() {
        if *key == style {
            return category;
        }
    }
    for (key, category) in STYLE_TO_CATEGORY.iter() {
        if style.contains(key) || key.contains(style.as_str()) {
            return category;
        }
    }
    DEFAULT_CATEGORY
}

/// Strip corporate suffixes from a brewery name, one pass over the list.
pub fn normalize_brewery_name(raw: &str) -> String {
    let mut name = raw.trim().to_string();
    for suffix in BREWERY_SUFFIXES {
        if let Some(stripped) = name.strip_suffix(suffix) {
            name = stripped.trim().to_string();
        }
    }
    name
}

/// Trim a beer name, drop volume annotations like "(330ml)" or "500ml", and
/// collapse internal whitespace runs.
pub fn normalize_beer_name(raw: &str) -> String {
    let name = raw.trim();
    let name = VOLUME_PARENS_ML.replace_all(name, "");
    let name = VOLUME_PARENS_CL.replace_all(&name, "");
    let name = VOLUME_TRAILING_ML.replace_all(&name, "");
    WHITESPACE_RUN.replace_all(&name, " ").trim().to_string()
}

/// Strip a literal trailing country or nation suffix from a location.
pub fn normalize_location(raw: &str) -> String {
    let mut location = raw.trim().to_string();
    for suffix in LOCATION_SUFFIXES {
        if let Some(stripped) = location.strip_suffix(suffix) {
            location = stripped.trim().to_string();
        }
    }
    location
}

/// Default the scheme to https and upgrade plain http.
pub fn normalize_url(raw: &str) -> Option<String> {
    let url = raw.trim();
    if url.is_empty() {
        return None;
    }
    let url = if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    };
    Some(match url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => url,
    })
}

/// Collapse whitespace runs and cap the length, replacing the tail with
/// "..." when truncation happens.
pub fn normalize_description(raw: &str, max_length: usize) -> String {
    let description = WHITESPACE_RUN.replace_all(raw, " ");
    let description = description.trim();
    if description.chars().count() > max_length {
        let keep: String = description
            .chars()
            .take(max_length.saturating_sub(3))
            .collect();
        format!("{keep}...")
    } else {
        description.to_string()
    }
}

/// Title-case a color and fold common compound names into their base color.
pub fn normalize_color(raw: &str) -> String {
    let color = title_case(raw.trim());
    match color.as_str() {
        "Golden Yellow" | "Light Golden" => "Golden".to_string(),
        "Pale Yellow" => "Pale".to_string(),
        "Light Amber" | "Deep Amber" => "Amber".to_string(),
        "Dark Brown" | "Light Brown" => "Brown".to_string(),
        "Ruby Red" => "Red".to_string(),
        _ => color,
    }
}

pub(crate) fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Pull a field out of a raw record as text. Numbers are rendered so that
/// "abv": 5.6 and "abv": "5.6" normalize identically.
fn field_str(raw: &RawRecord, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim().to_string();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Apply the per-field normalizers to every present key of a raw beer
/// record. Absent keys stay absent; `category` is inferred from `style`
/// only when the source did not provide one.
pub fn normalize_beer_record(raw: &RawRecord) -> BeerRecord {
    let style = field_str(raw, "style").and_then(non_empty);
    let category = field_str(raw, "category")
        .and_then(non_empty)
        .or_else(|| style.as_deref().map(|s| style_to_category(s).to_string()));
    BeerRecord {
        name: field_str(raw, "name").map(|s| normalize_beer_name(&s)),
        brewery: field_str(raw, "brewery").and_then(non_empty),
        style,
        category,
        abv: field_str(raw, "abv").and_then(|s| normalize_abv(&s)),
        ibu: field_str(raw, "ibu").and_then(|s| normalize_ibu(&s)),
        description: field_str(raw, "description")
            .map(|s| normalize_description(&s, DESCRIPTION_MAX_LENGTH)),
        color: field_str(raw, "color").map(|s| normalize_color(&s)),
        image_url: field_str(raw, "image_url").and_then(non_empty),
    }
}

/// Apply the per-field normalizers to every present key of a raw brewery
/// record. `founded_year` passes through untouched for validation to judge.
pub fn normalize_brewery_record(raw: &RawRecord) -> BreweryRecord {
    BreweryRecord {
        name: field_str(raw, "name").map(|s| normalize_brewery_name(&s)),
        location: field_str(raw, "location").map(|s| normalize_location(&s)),
        website: field_str(raw, "website").and_then(|s| normalize_url(&s)),
        description: field_str(raw, "description")
            .map(|s| normalize_description(&s, DESCRIPTION_MAX_LENGTH)),
        founded_year: field_str(raw, "founded_year").and_then(non_empty),
    }
}
