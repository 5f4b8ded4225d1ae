//! Retailer allow-list and URL canonicalisation.

use reqwest::Url;
use serde::Serialize;

/// A retailer whose product pages the pipeline trusts enough to extract from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Retailer {
    Amazon,
    Target,
    Walmart,
    Lego,
    BestBuy,
    Etsy,
}

impl Retailer {
    pub const ALL: [Retailer; 6] = [
        Retailer::Amazon,
        Retailer::Target,
        Retailer::Walmart,
        Retailer::Lego,
        Retailer::BestBuy,
        Retailer::Etsy,
    ];

    /// Registrable domain, without any `www.` label.
    #[must_use]
    pub fn domain(self) -> &'static str {
        match self {
            Retailer::Amazon => "amazon.com",
            Retailer::Target => "target.com",
            Retailer::Walmart => "walmart.com",
            Retailer::Lego => "lego.com",
            Retailer::BestBuy => "bestbuy.com",
            Retailer::Etsy => "etsy.com",
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Retailer::Amazon => "Amazon",
            Retailer::Target => "Target",
            Retailer::Walmart => "Walmart",
            Retailer::Lego => "LEGO",
            Retailer::BestBuy => "Best Buy",
            Retailer::Etsy => "Etsy",
        }
    }

    /// Canonical storefront origin used to resolve relative links.
    #[must_use]
    pub fn origin(self) -> &'static str {
        match self {
            Retailer::Amazon => "https://www.amazon.com",
            Retailer::Target => "https://www.target.com",
            Retailer::Walmart => "https://www.walmart.com",
            Retailer::Lego => "https://www.lego.com",
            Retailer::BestBuy => "https://www.bestbuy.com",
            Retailer::Etsy => "https://www.etsy.com",
        }
    }

    /// Path and query of the retailer's own search-results page for `query`
    /// (already percent-encoded).
    #[must_use]
    pub fn search_path(self, encoded_query: &str) -> String {
        match self {
            Retailer::Amazon => format!("/s?k={encoded_query}"),
            Retailer::Target => format!("/s?searchTerm={encoded_query}"),
            Retailer::Walmart => format!("/search?q={encoded_query}"),
            Retailer::Lego => format!("/en-us/search?q={encoded_query}"),
            Retailer::BestBuy => format!("/site/searchpage.jsp?st={encoded_query}"),
            Retailer::Etsy => format!("/search?q={encoded_query}"),
        }
    }

    /// Resolve the retailer owning `url`, if it is on the allow-list.
    #[must_use]
    pub fn from_url(url: &str) -> Option<Retailer> {
        let parsed = Url::parse(url).ok()?;
        Self::from_host(parsed.host_str()?)
    }

    /// Match a host (case-insensitive, leading `www.` ignored) against the
    /// allow-list. Subdomains of an allowed domain also match.
    #[must_use]
    pub fn from_host(host: &str) -> Option<Retailer> {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host);
        Self::ALL.into_iter().find(|r| {
            let domain = r.domain();
            host == domain
                || host
                    .strip_suffix(domain)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

impl std::fmt::Display for Retailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// `true` when `url` parses, uses http(s), and its host is on the allow-list.
/// Malformed input is rejected, never an error.
#[must_use]
pub fn is_allowed_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url.trim()) else {
        return false;
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }
    parsed
        .host_str()
        .and_then(Retailer::from_host)
        .is_some()
}

/// Drop fragment and query, and a trailing slash on non-root paths.
#[must_use]
pub fn canonicalize_url(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw.trim()).ok()?;

    url.set_fragment(None);
    url.set_query(None);

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    Some(url.to_string())
}

/// Dedup key combining origin and path, ignoring query and fragment.
#[must_use]
pub fn origin_path_key(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    let path = url.path().trim_end_matches('/');
    Some(format!(
        "{}{}",
        url.origin().ascii_serialization().to_ascii_lowercase(),
        path
    ))
}

/// Retailer display name for a URL, falling back to its bare host.
#[must_use]
pub fn retailer_label(url: &str) -> Option<String> {
    if let Some(retailer) = Retailer::from_url(url) {
        return Some(retailer.display_name().to_string());
    }
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}
