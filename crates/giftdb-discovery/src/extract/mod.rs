//! Turning fetched pages and raw listing text into product data.

mod html;
mod jsonld;
mod patterns;
mod slug;

pub use jsonld::extract_product_jsonld;
pub use patterns::{extract_product_urls, extract_retailer_urls};
pub use slug::record_from_url;

use giftdb_core::ProductRecord;

/// Where an extracted record's title came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    StructuredData,
    UrlSlug,
}

impl Provenance {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Provenance::StructuredData => "structured",
            Provenance::UrlSlug => "slug",
        }
    }
}

/// Extract a [`ProductRecord`] from a fetched product page.
///
/// Structured data wins; a Product block without an image borrows the
/// page's `og:image`. Pages with no titled Product block fall back to the
/// URL slug heuristic.
#[must_use]
pub fn extract_product(page_html: &str, page_url: &str) -> Option<(ProductRecord, Provenance)> {
    match extract_product_jsonld(page_html, page_url) {
        Some(mut record) => {
            if record.image_url.is_none() {
                record.image_url = html::find_meta_content(page_html, "property", "og:image")
                    .and_then(|raw| html::absolutize_url(page_url, &raw));
            }
            Some((record, Provenance::StructuredData))
        }
        None => record_from_url(page_url).map(|record| (record, Provenance::UrlSlug)),
    }
}
