//! Google Custom Search backend.
//!
//! The Custom Search JSON API has no batch endpoint, so a batch fans out into
//! concurrent single-query GETs. Per-query failures are isolated: one failed
//! query yields an empty list without affecting its siblings.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use leadscout_shared::{LeadScoutError, QuerySpec, Result, SearchResult};

use super::{ResultsByQuery, SearchProvider, total_results};

/// Default Custom Search endpoint.
const GOOGLE_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// Maximum results per query the API allows.
const MAX_RESULTS: u32 = 10;

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("leadscout/", env!("CARGO_PKG_VERSION"));

/// Google Custom Search backend; concurrent per-query requests.
pub struct GoogleSearchProvider {
    client: Client,
    api_key: String,
    cx: String,
    endpoint: String,
}

impl GoogleSearchProvider {
    /// Create a provider with the given API key, engine id, and timeout.
    pub fn new(
        api_key: impl Into<String>,
        cx: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LeadScoutError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            cx: cx.into(),
            endpoint: GOOGLE_ENDPOINT.to_string(),
        })
    }

    /// Point the provider at a different endpoint (integration tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Execute one query; failures collapse to an empty list.
    async fn search_one(&self, query: &str) -> Vec<SearchResult> {
        let response = match self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("key", self.api_key.as_str()),
                ("cx", self.cx.as_str()),
                ("num", &MAX_RESULTS.to_string()),
            ])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(%query, error = %e, "google search request failed");
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            warn!(%query, status = %response.status(), "google search returned error status");
            return Vec::new();
        }

        match response.json::<GoogleResponse>().await {
            Ok(body) => body.items.into_iter().map(Into::into).collect(),
            Err(e) => {
                warn!(%query, error = %e, "google search response unreadable");
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    items: Vec<GoogleItem>,
}

#[derive(Debug, Deserialize)]
struct GoogleItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

impl From<GoogleItem> for SearchResult {
    fn from(item: GoogleItem) -> Self {
        Self {
            title: item.title,
            link: item.link,
            snippet: item.snippet,
        }
    }
}

#[async_trait]
impl SearchProvider for GoogleSearchProvider {
    async fn search_batch(&self, specs: &[QuerySpec]) -> Result<ResultsByQuery> {
        if specs.is_empty() {
            return Ok(Vec::new());
        }

        if self.api_key.is_empty() || self.cx.is_empty() {
            warn!("google search not configured (missing api key or cx)");
            return Ok(specs.iter().map(|s| (s.query.clone(), Vec::new())).collect());
        }

        // Concurrent fan-out; output position i corresponds to specs[i], so
        // submitted-query order is preserved regardless of completion order.
        let futures = specs.iter().map(|spec| self.search_one(&spec.query));
        let results = futures::future::join_all(futures).await;

        let batch: ResultsByQuery = specs
            .iter()
            .zip(results)
            .map(|(spec, results)| (spec.query.clone(), results))
            .collect();

        debug!(
            queries = specs.len(),
            results = total_results(&batch),
            "google batch complete"
        );
        Ok(batch)
    }

    fn name(&self) -> &str {
        "google"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn batch_fans_out_per_query() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::query_param("q", "acme official website"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"title": "Acme Co", "link": "https://acme.com", "snippet": "Official site"}
                ]
            })))
            .mount(&server)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::query_param("q", "acme sales manager"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let provider = GoogleSearchProvider::new("key", "cx", 5)
            .unwrap()
            .with_endpoint(server.uri());

        let batch = provider
            .search_batch(&[
                QuerySpec::global("acme official website"),
                QuerySpec::global("acme sales manager"),
            ])
            .await
            .unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].1.len(), 1);
        assert_eq!(batch[0].1[0].title, "Acme Co");
        assert!(batch[1].1.is_empty());
    }

    #[tokio::test]
    async fn failed_query_does_not_sink_batch() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::query_param("q", "good"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{"title": "t", "link": "https://example.com", "snippet": "s"}]
            })))
            .mount(&server)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::query_param("q", "bad"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let provider = GoogleSearchProvider::new("key", "cx", 5)
            .unwrap()
            .with_endpoint(server.uri());

        let batch = provider
            .search_batch(&[QuerySpec::global("good"), QuerySpec::global("bad")])
            .await
            .unwrap();

        assert_eq!(batch[0].1.len(), 1);
        assert!(batch[1].1.is_empty());
    }

    #[tokio::test]
    async fn unconfigured_provider_returns_empty_lists() {
        let provider = GoogleSearchProvider::new("", "", 5).unwrap();
        let batch = provider
            .search_batch(&[QuerySpec::global("anything")])
            .await
            .unwrap();
        assert_eq!(batch.len(), 1);
        assert!(batch[0].1.is_empty());
    }
}
