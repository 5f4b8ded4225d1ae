//! Per-retailer product-URL patterns for raw listing text.
//!
//! Each retailer owns one absolute and one relative pattern. Relative matches
//! must appear as a quoted attribute value or a markdown link target and are
//! resolved against the retailer's canonical origin, not the page that was
//! fetched.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::html::absolutize_url;
use crate::allowlist::{canonicalize_url, is_allowed_url, Retailer};

struct RetailerPatterns {
    absolute: Regex,
    relative: Regex,
}

fn compile(absolute: &str, relative: &str) -> RetailerPatterns {
    RetailerPatterns {
        absolute: Regex::new(absolute).expect("valid absolute product regex"),
        relative: Regex::new(relative).expect("valid relative product regex"),
    }
}

static AMAZON: LazyLock<RetailerPatterns> = LazyLock::new(|| {
    compile(
        r"https?://(?:www\.)?amazon\.com/(?:[A-Za-z0-9%-]+/)?(?:dp|gp/product)/[A-Z0-9]{10}",
        r#"["'(](/(?:[A-Za-z0-9%-]+/)?(?:dp|gp/product)/[A-Z0-9]{10})"#,
    )
});

static TARGET: LazyLock<RetailerPatterns> = LazyLock::new(|| {
    compile(
        r"https?://(?:www\.)?target\.com/p/[A-Za-z0-9-]+/-/A-\d+",
        r#"["'(](/p/[A-Za-z0-9-]+/-/A-\d+)"#,
    )
});

static WALMART: LazyLock<RetailerPatterns> = LazyLock::new(|| {
    compile(
        r"https?://(?:www\.)?walmart\.com/ip/(?:[A-Za-z0-9-]+/)?\d+",
        r#"["'(](/ip/(?:[A-Za-z0-9-]+/)?\d+)"#,
    )
});

static LEGO: LazyLock<RetailerPatterns> = LazyLock::new(|| {
    compile(
        r"https?://(?:www\.)?lego\.com/[a-z]{2}-[a-z]{2}/product/[a-z0-9-]+",
        r#"["'(](/[a-z]{2}-[a-z]{2}/product/[a-z0-9-]+)"#,
    )
});

static BESTBUY: LazyLock<RetailerPatterns> = LazyLock::new(|| {
    compile(
        r"https?://(?:www\.)?bestbuy\.com/site/[a-z0-9-]+/\d+\.p",
        r#"["'(](/site/[a-z0-9-]+/\d+\.p)"#,
    )
});

static ETSY: LazyLock<RetailerPatterns> = LazyLock::new(|| {
    compile(
        r"https?://(?:www\.)?etsy\.com/listing/\d+(?:/[a-z0-9-]+)?",
        r#"["'(](/listing/\d+(?:/[a-z0-9-]+)?)"#,
    )
});

fn patterns_for(retailer: Retailer) -> &'static RetailerPatterns {
    match retailer {
        Retailer::Amazon => &AMAZON,
        Retailer::Target => &TARGET,
        Retailer::Walmart => &WALMART,
        Retailer::Lego => &LEGO,
        Retailer::BestBuy => &BESTBUY,
        Retailer::Etsy => &ETSY,
    }
}

/// Product URLs for one retailer, with the byte offset where each was found.
fn positioned_urls(retailer: Retailer, text: &str) -> Vec<(usize, String)> {
    let patterns = patterns_for(retailer);
    let mut found: Vec<(usize, String)> = patterns
        .absolute
        .find_iter(text)
        .map(|m| (m.start(), m.as_str().to_string()))
        .collect();

    for cap in patterns.relative.captures_iter(text) {
        let Some(path) = cap.get(1) else {
            continue;
        };
        if let Some(url) = absolutize_url(retailer.origin(), path.as_str()) {
            found.push((path.start(), url));
        }
    }
    found
}

/// Canonical, allow-listed product URLs for a single retailer in order of
/// appearance, de-duplicated.
#[must_use]
pub fn extract_retailer_urls(retailer: Retailer, text: &str, max: usize) -> Vec<String> {
    finalize(positioned_urls(retailer, text), max)
}

/// Product URLs for every allow-listed retailer, in order of appearance.
#[must_use]
pub fn extract_product_urls(text: &str, max: usize) -> Vec<String> {
    let found = Retailer::ALL
        .into_iter()
        .flat_map(|r| positioned_urls(r, text))
        .collect();
    finalize(found, max)
}

fn finalize(mut found: Vec<(usize, String)>, max: usize) -> Vec<String> {
    found.sort_by_key(|(pos, _)| *pos);
    let mut seen = HashSet::new();
    found
        .into_iter()
        .filter_map(|(_, url)| canonicalize_url(&url))
        .filter(|url| is_allowed_url(url))
        .filter(|url| seen.insert(url.clone()))
        .take(max)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_and_relative_target_links() {
        let html = r#"
            <a href="https://www.target.com/p/lego-friends-mall/-/A-111?preselect=1">Mall</a>
            <a href="/p/lego-friends-cafe/-/A-222#reviews">Cafe</a>
        "#;
        let urls = extract_retailer_urls(Retailer::Target, html, 10);
        assert_eq!(
            urls,
            vec![
                "https://www.target.com/p/lego-friends-mall/-/A-111",
                "https://www.target.com/p/lego-friends-cafe/-/A-222",
            ]
        );
    }

    #[test]
    fn relative_match_inside_absolute_url_is_deduplicated() {
        let html = r#"<a href="https://www.amazon.com/LEGO-Friends/dp/B0CFW6XJ7M">x</a>"#;
        let urls = extract_retailer_urls(Retailer::Amazon, html, 10);
        assert_eq!(urls, vec!["https://www.amazon.com/LEGO-Friends/dp/B0CFW6XJ7M"]);
    }

    #[test]
    fn mixed_retailers_keep_page_order_and_respect_cap() {
        let text = "
            [one](https://www.walmart.com/ip/barbie-dreamhouse/123456)
            [two](https://www.etsy.com/listing/987654/wooden-puzzle)
            [three](https://www.bestbuy.com/site/switch-oled/6470923.p?skuId=6470923)
        ";
        let urls = extract_product_urls(text, 2);
        assert_eq!(
            urls,
            vec![
                "https://www.walmart.com/ip/barbie-dreamhouse/123456",
                "https://www.etsy.com/listing/987654/wooden-puzzle",
            ]
        );
    }

    #[test]
    fn category_and_search_pages_are_ignored() {
        let html = r#"
            <a href="https://www.target.com/c/toys/-/N-5xtb0">Toys</a>
            <a href="https://www.amazon.com/s?k=lego">Search</a>
            <a href="https://www.lego.com/en-us/themes/friends">Theme</a>
        "#;
        assert!(extract_product_urls(html, 10).is_empty());
    }

    #[test]
    fn lookalike_hosts_do_not_match() {
        let text = "https://www.notlego.com/en-us/product/fake-set-1";
        assert!(extract_product_urls(text, 10).is_empty());
    }
}
