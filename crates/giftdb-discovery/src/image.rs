//! Image URL liveness check.

use std::time::Duration;

use reqwest::{header::CONTENT_TYPE, Client, Url};

pub struct ImageValidator {
    client: Client,
    timeout: Duration,
}

impl ImageValidator {
    #[must_use]
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// `true` only for a 2xx HEAD response whose `content-type` starts with
    /// `image/`, received within the timeout. Every failure is `false`.
    pub async fn validate(&self, image_url: &str) -> bool {
        let Ok(url) = Url::parse(image_url.trim()) else {
            return false;
        };
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }

        match tokio::time::timeout(self.timeout, self.client.head(url).send()).await {
            Ok(Ok(response)) => {
                let ok = response.status().is_success()
                    && response
                        .headers()
                        .get(CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .is_some_and(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"));
                if !ok {
                    tracing::debug!(
                        url = image_url,
                        status = response.status().as_u16(),
                        "image rejected"
                    );
                }
                ok
            }
            Ok(Err(e)) => {
                tracing::debug!(url = image_url, error = %e, "image request failed");
                false
            }
            Err(_) => {
                tracing::debug!(url = image_url, "image request timed out");
                false
            }
        }
    }
}
