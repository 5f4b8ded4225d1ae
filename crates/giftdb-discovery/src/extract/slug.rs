//! Title recovery from a product URL's path when the page itself is unusable.

use giftdb_core::ProductRecord;
use percent_encoding::percent_decode_str;
use reqwest::Url;

use crate::allowlist::Retailer;

/// What a retailer's URL path says about the product name.
#[derive(Debug, PartialEq, Eq)]
enum SlugHint<'a> {
    /// A readable product-name segment.
    Slug(&'a str),
    /// A product page whose URL carries only an opaque identifier.
    Opaque,
}

/// Derive a minimal [`ProductRecord`] from the URL alone.
///
/// Returns `None` when the host is not an allow-listed retailer or the path
/// has no product segment at all. Product pages with opaque identifiers get
/// a generic placeholder title.
#[must_use]
pub fn record_from_url(url: &str) -> Option<ProductRecord> {
    let parsed = Url::parse(url).ok()?;
    let retailer = parsed.host_str().and_then(Retailer::from_host)?;
    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let title = match slug_hint(retailer, &segments)? {
        SlugHint::Slug(slug) => humanize_slug(slug)?,
        SlugHint::Opaque => placeholder_title(retailer).to_string(),
    };

    let mut record = ProductRecord::for_url(url);
    record.title = Some(title);
    record.retailer = Some(retailer.display_name().to_string());
    Some(record)
}

fn slug_hint<'a>(retailer: Retailer, segments: &[&'a str]) -> Option<SlugHint<'a>> {
    match retailer {
        Retailer::Amazon => amazon_hint(segments),
        Retailer::Target => segment_after(segments, "p").map(readable_or_opaque),
        Retailer::Walmart => segment_after(segments, "ip").map(readable_or_opaque),
        Retailer::Lego => segment_after(segments, "product").map(readable_or_opaque),
        Retailer::BestBuy => segment_after(segments, "site")
            .filter(|s| *s != "searchpage.jsp")
            .map(readable_or_opaque),
        Retailer::Etsy => etsy_hint(segments),
    }
}

/// `/{slug}/dp/{asin}` or bare `/dp/{asin}` / `/gp/product/{asin}`.
fn amazon_hint<'a>(segments: &[&'a str]) -> Option<SlugHint<'a>> {
    if let Some(idx) = segments.iter().position(|s| *s == "dp") {
        segments.get(idx + 1)?;
        return Some(match idx.checked_sub(1).and_then(|i| segments.get(i)) {
            Some(slug) if is_readable(slug) => SlugHint::Slug(slug),
            _ => SlugHint::Opaque,
        });
    }
    if segments.windows(2).any(|w| w == ["gp", "product"]) {
        return Some(SlugHint::Opaque);
    }
    None
}

/// Target `/p/-/A-{id}`, Walmart `/ip/{id}`, LEGO `/product/{number}` and
/// Best Buy `/site/{sku}.p` carry no name.
fn readable_or_opaque(segment: &str) -> SlugHint<'_> {
    if is_readable(segment) {
        SlugHint::Slug(segment)
    } else {
        SlugHint::Opaque
    }
}

/// `/listing/{id}/{slug}` or `/listing/{id}`.
fn etsy_hint<'a>(segments: &[&'a str]) -> Option<SlugHint<'a>> {
    let idx = segments.iter().position(|s| *s == "listing")?;
    segments.get(idx + 1)?;
    match segments.get(idx + 2) {
        Some(slug) if is_readable(slug) => Some(SlugHint::Slug(slug)),
        _ => Some(SlugHint::Opaque),
    }
}

fn segment_after<'a>(segments: &[&'a str], marker: &str) -> Option<&'a str> {
    let idx = segments.iter().position(|s| *s == marker)?;
    segments.get(idx + 1).copied()
}

/// A segment is readable when it contains letters and is not a bare
/// identifier like `B0CFW6XJ7M` or `5012345678`.
fn is_readable(segment: &str) -> bool {
    segment.contains('-') && segment.chars().any(|c| c.is_ascii_alphabetic())
}

fn placeholder_title(retailer: Retailer) -> &'static str {
    match retailer {
        Retailer::Amazon => "Amazon product",
        Retailer::Target => "Target product",
        Retailer::Walmart => "Walmart item",
        Retailer::Lego => "LEGO set",
        Retailer::BestBuy => "Best Buy product",
        Retailer::Etsy => "Etsy listing",
    }
}

/// `lego-friends-heartlake-city` -> `Lego Friends Heartlake City`.
pub(crate) fn humanize_slug(slug: &str) -> Option<String> {
    let decoded = percent_decode_str(slug).decode_utf8_lossy();
    let stem = decoded
        .trim_end_matches(".p")
        .trim_end_matches(".jsp")
        .trim_end_matches(".html");
    let words: Vec<String> = stem
        .split(['-', '_', '+', ' '])
        .filter(|w| !w.is_empty())
        .map(title_case_word)
        .collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
