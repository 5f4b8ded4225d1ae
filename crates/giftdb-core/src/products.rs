//! Data model shared by the discovery pipeline and its consumers.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::seeds::SeedProduct;

/// An unverified search hit: a URL plus whatever the provider told us about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl Candidate {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            snippet: None,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A price as found on a page: numeric when it parses, raw text otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Price {
    Amount(Decimal),
    Text(String),
}

impl Price {
    /// Interpret a raw price string such as `"$1,299.99"` or `"24.99 USD"`.
    ///
    /// Only a single number with comma thousands separators becomes an
    /// amount. Ranges like `"$10 - $20"` and decimal-comma prices like
    /// `"12,99 €"` are kept as text. Returns `None` for empty input.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let mut numbers = trimmed
            .split(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
            .map(|token| token.trim_matches(|c| c == '.' || c == ','))
            .filter(|token| token.chars().any(|c| c.is_ascii_digit()));
        let amount = match (numbers.next(), numbers.next()) {
            (Some(token), None) => parse_amount(token),
            _ => None,
        };
        Some(match amount {
            Some(amount) => Price::Amount(amount),
            None => Price::Text(trimmed.to_string()),
        })
    }

    #[must_use]
    pub fn amount(&self) -> Option<Decimal> {
        match self {
            Price::Amount(d) => Some(*d),
            Price::Text(_) => None,
        }
    }
}

/// `1,299.99` style: optional comma-grouped thousands, at most one dot.
fn parse_amount(token: &str) -> Option<Decimal> {
    let (whole, fraction) = match token.split_once('.') {
        Some((whole, fraction)) if !fraction.contains(['.', ',']) => (whole, Some(fraction)),
        Some(_) => return None,
        None => (token, None),
    };
    let mut groups = whole.split(',');
    let lead = groups.next()?;
    let rest: Vec<&str> = groups.collect();
    if !rest.is_empty() && (lead.is_empty() || lead.len() > 3 || rest.iter().any(|g| g.len() != 3))
    {
        return None;
    }
    let mut digits = whole.replace(',', "");
    if let Some(fraction) = fraction {
        digits.push('.');
        digits.push_str(fraction);
    }
    Decimal::from_str(&digits).ok()
}

/// Structured data recovered from one candidate page.
///
/// `product_url` is always the URL the record was extracted from, even when
/// every other field is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retailer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ProductRecord {
    #[must_use]
    pub fn for_url(product_url: impl Into<String>) -> Self {
        Self {
            product_url: product_url.into(),
            title: None,
            image_url: None,
            price: None,
            retailer: None,
            brand: None,
            model: None,
            category: None,
        }
    }
}

/// Optional narrowing supplied alongside a free-text query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryFilters {
    pub gender: Option<String>,
    pub category: Option<String>,
    pub max_price: Option<Decimal>,
}

impl QueryFilters {
    /// Append gender/category terms to a search string.
    #[must_use]
    pub fn apply_to_query(&self, query: &str) -> String {
        let mut out = query.trim().to_string();
        if let Some(gender) = self.gender.as_deref().map(str::trim).filter(|g| !g.is_empty()) {
            out.push_str(" for ");
            out.push_str(gender);
        }
        if let Some(category) = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            out.push(' ');
            out.push_str(&category.replace('-', " "));
        }
        out
    }

    /// `true` unless the price is numeric and above the ceiling.
    #[must_use]
    pub fn price_allows(&self, price: Option<&Price>) -> bool {
        match (self.max_price, price.and_then(Price::amount)) {
            (Some(ceiling), Some(amount)) => amount <= ceiling,
            _ => true,
        }
    }
}

/// Caller-facing row: a curated seed plus whatever enrichment resolved.
///
/// Always renderable: unresolved enrichment fields stay `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRow {
    pub title: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub popularity: u8,
    pub keywords: Vec<String>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub retailer: Option<String>,
    pub product_url: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<Price>,
}

impl CatalogRow {
    #[must_use]
    pub fn from_seed(seed: &SeedProduct) -> Self {
        Self {
            title: seed.title.clone(),
            brand: seed.brand.clone(),
            category: seed.category.clone(),
            popularity: seed.popularity,
            keywords: seed.keywords.clone(),
            price_min: seed.price_min,
            price_max: seed.price_max,
            retailer: None,
            product_url: None,
            image_url: None,
            price: None,
        }
    }

    /// Copy resolved retailer fields onto the row. Fields the record lacks
    /// leave the row's existing values untouched.
    #[must_use]
    pub fn with_record(mut self, record: &ProductRecord) -> Self {
        self.product_url = Some(record.product_url.clone());
        if record.retailer.is_some() {
            self.retailer.clone_from(&record.retailer);
        }
        if record.image_url.is_some() {
            self.image_url.clone_from(&record.image_url);
        }
        if record.price.is_some() {
            self.price.clone_from(&record.price);
        }
        self
    }

    #[must_use]
    pub fn is_enriched(&self) -> bool {
        self.product_url.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_parse_strips_currency_and_separators() {
        assert_eq!(
            Price::parse("$1,299.99"),
            Some(Price::Amount(Decimal::from_str("1299.99").unwrap()))
        );
        assert_eq!(
            Price::parse("24.99 USD"),
            Some(Price::Amount(Decimal::from_str("24.99").unwrap()))
        );
    }

    #[test]
    fn price_parse_keeps_unparseable_text() {
        assert_eq!(
            Price::parse("See price in cart"),
            Some(Price::Text("See price in cart".to_string()))
        );
        assert_eq!(Price::parse("   "), None);
    }

    #[test]
    fn ranges_and_decimal_commas_stay_text() {
        assert_eq!(
            Price::parse("$10 - $20"),
            Some(Price::Text("$10 - $20".to_string()))
        );
        assert_eq!(
            Price::parse("12,99 €"),
            Some(Price::Text("12,99 €".to_string()))
        );
        assert_eq!(
            Price::parse("1.299.00"),
            Some(Price::Text("1.299.00".to_string()))
        );
    }

    #[test]
    fn range_text_is_not_dropped_by_price_ceiling() {
        let filters = QueryFilters {
            max_price: Some(Decimal::from(50)),
            ..QueryFilters::default()
        };
        let range = Price::parse("$10 - $20");
        assert!(filters.price_allows(range.as_ref()));
    }

    #[test]
    fn thousands_separators_and_bare_integers_parse() {
        assert_eq!(
            Price::parse("USD 12,345"),
            Some(Price::Amount(Decimal::from(12345)))
        );
        assert_eq!(Price::parse("$15"), Some(Price::Amount(Decimal::from(15))));
        assert_eq!(
            Price::parse("19.99."),
            Some(Price::Amount(Decimal::from_str("19.99").unwrap()))
        );
    }

    #[test]
    fn filters_append_gender_and_category() {
        let filters = QueryFilters {
            gender: Some("girls".to_string()),
            category: Some("building-sets".to_string()),
            max_price: None,
        };
        assert_eq!(
            filters.apply_to_query(" lego friends "),
            "lego friends for girls building sets"
        );
    }

    #[test]
    fn price_ceiling_only_rejects_numeric_prices_above_it() {
        let filters = QueryFilters {
            max_price: Some(Decimal::from(50)),
            ..QueryFilters::default()
        };
        assert!(filters.price_allows(None));
        assert!(filters.price_allows(Some(&Price::Text("call".to_string()))));
        assert!(filters.price_allows(Some(&Price::Amount(Decimal::from(50)))));
        assert!(!filters.price_allows(Some(&Price::Amount(Decimal::from(51)))));
    }

    #[test]
    fn row_keeps_seed_fields_when_record_is_sparse() {
        let seed = SeedProduct {
            title: "Magna-Tiles Clear Colors 32 Piece Set".to_string(),
            brand: Some("Magna-Tiles".to_string()),
            category: Some("building-sets".to_string()),
            price_min: None,
            price_max: None,
            popularity: 80,
            keywords: vec!["magnetic".to_string()],
        };
        let record = ProductRecord::for_url("https://www.target.com/p/magna-tiles/-/A-1");
        let row = CatalogRow::from_seed(&seed).with_record(&record);
        assert!(row.is_enriched());
        assert_eq!(row.title, seed.title);
        assert!(row.image_url.is_none());
        assert!(row.retailer.is_none());
    }
}
