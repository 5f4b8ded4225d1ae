//! Structured search API adapter (Google Programmable Search response shape).

use std::time::Duration;

use async_trait::async_trait;
use giftdb_core::{Candidate, SearchApiCredentials};
use reqwest::{Client, Url};
use serde::Deserialize;

use super::{sanitize_candidates, Provider, ProviderKind};
use crate::error::DiscoveryError;

const PROVIDER: &str = "search_api";
/// The API refuses `num` above 10.
const MAX_PAGE_SIZE: usize = 10;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: String,
    title: Option<String>,
    snippet: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct SearchApiProvider {
    client: Client,
    credentials: SearchApiCredentials,
    base_url: String,
    timeout: Duration,
    max_results: usize,
}

impl SearchApiProvider {
    #[must_use]
    pub fn new(
        client: Client,
        credentials: SearchApiCredentials,
        base_url: &str,
        timeout: Duration,
        max_results: usize,
    ) -> Self {
        Self {
            client,
            credentials,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            max_results,
        }
    }

    fn build_url(&self, query: &str) -> Result<Url, DiscoveryError> {
        let endpoint = format!("{}/customsearch/v1", self.base_url);
        let num = self.max_results.clamp(1, MAX_PAGE_SIZE).to_string();
        Url::parse_with_params(
            &endpoint,
            &[
                ("key", self.credentials.api_key.as_str()),
                ("cx", self.credentials.engine_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ],
        )
        .map_err(|e| DiscoveryError::InvalidUrl {
            url: endpoint.clone(),
            reason: e.to_string(),
        })
    }

    async fn request(&self, url: Url) -> Result<Vec<Candidate>, DiscoveryError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            return Err(DiscoveryError::Api {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| DiscoveryError::Deserialize {
                context: "search API results".to_string(),
                source: e,
            })?;

        let candidates = parsed
            .items
            .into_iter()
            .map(|item| Candidate {
                url: item.link,
                title: item.title,
                snippet: item.snippet,
            })
            .collect();
        Ok(sanitize_candidates(candidates, self.max_results))
    }
}

#[async_trait]
impl Provider for SearchApiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Api
    }

    async fn search(&self, query: &str) -> Result<Vec<Candidate>, DiscoveryError> {
        let url = self.build_url(query)?;
        match tokio::time::timeout(self.timeout, self.request(url)).await {
            Ok(result) => result,
            Err(_) => Err(DiscoveryError::Timeout {
                url: format!("{}/customsearch/v1", self.base_url),
                budget_ms: self.timeout.as_millis(),
            }),
        }
    }
}
