use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Gender tags recognised in seed keyword lists.
const GENDER_TAGS: [&str; 6] = ["boys", "girls", "unisex", "boy", "girl", "kids"];

/// A curated product entity used as the baseline row before enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedProduct {
    pub title: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price_min: Option<Decimal>,
    #[serde(default)]
    pub price_max: Option<Decimal>,
    #[serde(default)]
    pub popularity: u8,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl SeedProduct {
    /// Search text used to enrich this seed: brand followed by title, unless
    /// the title already leads with the brand.
    #[must_use]
    pub fn search_query(&self) -> String {
        match self.brand.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
            Some(brand)
                if !self
                    .title
                    .to_lowercase()
                    .starts_with(&brand.to_lowercase()) =>
            {
                format!("{brand} {}", self.title)
            }
            _ => self.title.clone(),
        }
    }

    /// Case-insensitive match of any query token against title, brand,
    /// category, or keyword tags. An empty query matches everything.
    #[must_use]
    pub fn matches_query(&self, query: &str) -> bool {
        let tokens: Vec<String> = query
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        if tokens.is_empty() {
            return true;
        }
        let mut haystack = self.title.to_lowercase();
        for extra in [&self.brand, &self.category].into_iter().flatten() {
            haystack.push(' ');
            haystack.push_str(&extra.to_lowercase());
        }
        for keyword in &self.keywords {
            haystack.push(' ');
            haystack.push_str(&keyword.to_lowercase());
        }
        tokens.iter().any(|t| haystack.contains(t.as_str()))
    }

    /// Gender filter: a seed with no gender tags at all is suitable for anyone.
    #[must_use]
    pub fn suits_gender(&self, gender: &str) -> bool {
        let wanted = gender.trim().to_lowercase();
        let tags: Vec<String> = self
            .keywords
            .iter()
            .map(|k| k.to_lowercase())
            .filter(|k| GENDER_TAGS.contains(&k.as_str()))
            .collect();
        if tags.is_empty() || wanted.is_empty() {
            return true;
        }
        let singular = wanted.trim_end_matches('s');
        tags.iter().any(|t| {
            t.trim_end_matches('s') == singular || t == "unisex" || t == "kids"
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SeedsFile {
    pub seeds: Vec<SeedProduct>,
}

/// Load and validate the curated seed list from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_seeds(path: &Path) -> Result<SeedsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SeedsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_seeds(&content)
}

/// Parse and validate seed YAML already in memory.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML does not parse or fails validation.
pub fn parse_seeds(content: &str) -> Result<SeedsFile, ConfigError> {
    let seeds_file: SeedsFile =
        serde_yaml::from_str(content).map_err(ConfigError::SeedsFileParse)?;
    validate_seeds(&seeds_file)?;
    Ok(seeds_file)
}

fn validate_seeds(seeds_file: &SeedsFile) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for seed in &seeds_file.seeds {
        if seed.title.trim().is_empty() {
            return Err(ConfigError::Validation(
                "seed title must be non-empty".to_string(),
            ));
        }

        if seed.popularity > 100 {
            return Err(ConfigError::Validation(format!(
                "seed '{}' has popularity {}; must be between 0 and 100",
                seed.title, seed.popularity
            )));
        }

        if let (Some(min), Some(max)) = (seed.price_min, seed.price_max) {
            if min > max {
                return Err(ConfigError::Validation(format!(
                    "seed '{}' has price_min {min} above price_max {max}",
                    seed.title
                )));
            }
        }

        let key = (
            seed.title.trim().to_lowercase(),
            seed.brand.as_deref().unwrap_or("").trim().to_lowercase(),
        );
        if !seen.insert(key) {
            return Err(ConfigError::Validation(format!(
                "duplicate seed: '{}'",
                seed.title
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(title: &str, brand: Option<&str>) -> SeedProduct {
        SeedProduct {
            title: title.to_string(),
            brand: brand.map(str::to_string),
            category: None,
            price_min: None,
            price_max: None,
            popularity: 50,
            keywords: Vec::new(),
        }
    }

    #[test]
    fn search_query_prefixes_brand() {
        assert_eq!(
            seed("Friends Heartlake City Resort", Some("LEGO")).search_query(),
            "LEGO Friends Heartlake City Resort"
        );
    }

    #[test]
    fn search_query_does_not_repeat_brand() {
        assert_eq!(
            seed("LEGO Friends Heartlake City Resort", Some("lego")).search_query(),
            "LEGO Friends Heartlake City Resort"
        );
    }

    #[test]
    fn matches_query_checks_keywords() {
        let mut s = seed("Heartlake Resort", Some("LEGO"));
        s.keywords = vec!["friends".to_string()];
        assert!(s.matches_query("Friends"));
        assert!(s.matches_query(""));
        assert!(!s.matches_query("dinosaur"));
    }

    #[test]
    fn gender_filter_keeps_untagged_seeds() {
        let mut s = seed("Nerf Elite Blaster", Some("Nerf"));
        assert!(s.suits_gender("girls"));
        s.keywords = vec!["boys".to_string()];
        assert!(s.suits_gender("boy"));
        assert!(!s.suits_gender("girls"));
        s.keywords.push("unisex".to_string());
        assert!(s.suits_gender("girls"));
    }

    #[test]
    fn parse_seeds_accepts_valid_yaml() {
        let yaml = r"
seeds:
  - title: Friends Heartlake City Resort
    brand: LEGO
    category: building-sets
    price_min: 49.99
    price_max: 89.99
    popularity: 95
    keywords: [friends, girls]
  - title: Classic Wooden Train Set
    popularity: 40
";
        let parsed = parse_seeds(yaml).unwrap();
        assert_eq!(parsed.seeds.len(), 2);
        assert_eq!(parsed.seeds[0].popularity, 95);
        assert!(parsed.seeds[1].brand.is_none());
    }

    #[test]
    fn parse_seeds_rejects_duplicates_case_insensitively() {
        let yaml = r"
seeds:
  - title: Magna-Tiles 32 Piece Set
    brand: Magna-Tiles
  - title: magna-tiles 32 piece set
    brand: MAGNA-TILES
";
        let err = parse_seeds(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("duplicate")));
    }

    #[test]
    fn parse_seeds_rejects_inverted_price_range() {
        let yaml = r"
seeds:
  - title: Play Kitchen
    price_min: 120
    price_max: 80
";
        let err = parse_seeds(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("price_min")));
    }

    #[test]
    fn parse_seeds_rejects_out_of_range_popularity() {
        let yaml = r"
seeds:
  - title: Play Kitchen
    popularity: 140
";
        let err = parse_seeds(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("popularity")));
    }
}
