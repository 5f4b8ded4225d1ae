//! Timeout-bounded HTTP fetching with soft-block detection.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::DiscoveryError;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const DEFAULT_BLOCK_MARKERS: [&str; 10] = [
    "captcha",
    "unusual traffic",
    "are you a robot",
    "not a robot",
    "access denied",
    "you have been blocked",
    "request blocked",
    "attention required! | cloudflare",
    "/cdn-cgi/challenge-platform/",
    "robot check",
];

const DEFAULT_MIN_BODY_LEN: usize = 256;

/// Heuristic recogniser for bot-detection interstitials.
///
/// Detection is best-effort: markers and the minimum length are tunable, and
/// a page carrying embedded structured data is always considered usable.
#[derive(Debug, Clone)]
pub struct BlockDetector {
    markers: Vec<String>,
    min_body_len: usize,
}

impl Default for BlockDetector {
    fn default() -> Self {
        Self {
            markers: DEFAULT_BLOCK_MARKERS.iter().map(|m| (*m).to_string()).collect(),
            min_body_len: DEFAULT_MIN_BODY_LEN,
        }
    }
}

impl BlockDetector {
    #[must_use]
    pub fn new(markers: impl IntoIterator<Item = impl Into<String>>, min_body_len: usize) -> Self {
        Self {
            markers: markers
                .into_iter()
                .map(|m| m.into().to_ascii_lowercase())
                .collect(),
            min_body_len,
        }
    }

    /// Reason the body looks like a soft block, or `None` if it is usable.
    #[must_use]
    pub fn block_reason(&self, body: &str) -> Option<String> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Some("empty body".to_string());
        }
        let lowered = trimmed.to_ascii_lowercase();
        if lowered.contains("application/ld+json") {
            return None;
        }
        if let Some(marker) = self.markers.iter().find(|m| lowered.contains(m.as_str())) {
            return Some(format!("matched \"{marker}\""));
        }
        if trimmed.len() < self.min_body_len {
            return Some(format!("body too short ({} bytes)", trimmed.len()));
        }
        None
    }
}

/// Shared HTTP plumbing for every adapter that reads web pages.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    timeout: Duration,
    detector: BlockDetector,
    origin_override: Option<Url>,
}

impl PageFetcher {
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Http`] if the `reqwest::Client` cannot be
    /// constructed.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, DiscoveryError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            timeout,
            detector: BlockDetector::default(),
            origin_override: None,
        })
    }

    #[must_use]
    pub fn with_detector(mut self, detector: BlockDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Send every request to `origin` instead of the URL's own host, keeping
    /// path and query. Used to point the pipeline at a local mock server.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::InvalidUrl`] if `origin` does not parse.
    pub fn with_origin_override(mut self, origin: &str) -> Result<Self, DiscoveryError> {
        let parsed = Url::parse(origin).map_err(|e| DiscoveryError::InvalidUrl {
            url: origin.to_string(),
            reason: e.to_string(),
        })?;
        self.origin_override = Some(parsed);
        Ok(self)
    }

    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn route(&self, url: &str) -> Result<Url, DiscoveryError> {
        let invalid = |reason: String| DiscoveryError::InvalidUrl {
            url: url.to_string(),
            reason,
        };
        let mut target = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
        if let Some(origin) = &self.origin_override {
            target
                .set_scheme(origin.scheme())
                .map_err(|()| invalid("cannot rewrite scheme".to_string()))?;
            target
                .set_host(origin.host_str())
                .map_err(|e| invalid(e.to_string()))?;
            target
                .set_port(origin.port())
                .map_err(|()| invalid("cannot rewrite port".to_string()))?;
        }
        Ok(target)
    }

    /// GET `url` and return its body, bounded by the fetcher's timeout.
    ///
    /// # Errors
    ///
    /// - [`DiscoveryError::Timeout`] when the budget expires.
    /// - [`DiscoveryError::UnexpectedStatus`] on a non-2xx response.
    /// - [`DiscoveryError::Http`] on transport failure.
    /// - [`DiscoveryError::InvalidUrl`] if `url` does not parse.
    pub async fn fetch_text(&self, url: &str) -> Result<String, DiscoveryError> {
        let target = self.route(url)?;
        let request = async {
            let response = self
                .client
                .get(target)
                .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                return Err(DiscoveryError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }
            Ok(response.text().await?)
        };

        match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(DiscoveryError::Timeout {
                url: url.to_string(),
                budget_ms: self.timeout.as_millis(),
            }),
        }
    }

    /// Like [`fetch_text`](Self::fetch_text), but a body that looks like a
    /// bot-detection interstitial is reported as [`DiscoveryError::Blocked`].
    ///
    /// # Errors
    ///
    /// Everything [`fetch_text`](Self::fetch_text) returns, plus
    /// [`DiscoveryError::Blocked`].
    pub async fn fetch_page(&self, url: &str) -> Result<String, DiscoveryError> {
        let body = self.fetch_text(url).await?;
        if let Some(reason) = self.detector.block_reason(&body) {
            tracing::debug!(url, reason = %reason, "soft block detected");
            return Err(DiscoveryError::Blocked {
                url: url.to_string(),
                reason,
            });
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_page(inner: &str) -> String {
        format!("<html><body>{inner}{}</body></html>", " ".repeat(300) + &"x".repeat(300))
    }

    #[test]
    fn captcha_page_is_blocked() {
        let detector = BlockDetector::default();
        let reason = detector
            .block_reason(&long_page("Please complete the CAPTCHA to continue"))
            .unwrap();
        assert!(reason.contains("captcha"));
    }

    #[test]
    fn short_body_is_blocked() {
        let detector = BlockDetector::default();
        let reason = detector.block_reason("<html>ok</html>").unwrap();
        assert!(reason.contains("too short"));
        assert!(detector.block_reason("   ").is_some());
    }

    #[test]
    fn structured_data_overrides_markers() {
        let detector = BlockDetector::default();
        let page = r#"<script type="application/ld+json">{"@type":"Product"}</script> captcha"#;
        assert!(detector.block_reason(page).is_none());
    }

    #[test]
    fn ordinary_page_is_usable_and_markers_are_tunable() {
        let page = long_page("LEGO Friends results");
        assert!(BlockDetector::default().block_reason(&page).is_none());
        let strict = BlockDetector::new(["Friends"], 0);
        assert!(strict.block_reason(&page).is_some());
    }

    #[test]
    fn origin_override_keeps_path_and_query() {
        let fetcher = PageFetcher::new(DEFAULT_USER_AGENT, Duration::from_secs(1))
            .unwrap()
            .with_origin_override("http://127.0.0.1:9999")
            .unwrap();
        let routed = fetcher
            .route("https://www.target.com/p/cafe/-/A-1?x=1")
            .unwrap();
        assert_eq!(routed.as_str(), "http://127.0.0.1:9999/p/cafe/-/A-1?x=1");
    }
}
