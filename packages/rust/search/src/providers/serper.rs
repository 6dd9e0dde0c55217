//! Serper.dev search backend.
//!
//! Serper accepts a whole batch in one POST (a JSON array of query payloads),
//! which keeps a multi-query discovery round at a single network round trip.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use leadscout_shared::{LeadScoutError, QuerySpec, Result, SearchResult};

use super::{ResultsByQuery, SearchProvider, total_results};

/// Default Serper search endpoint.
const SERPER_ENDPOINT: &str = "https://google.serper.dev/search";

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("leadscout/", env!("CARGO_PKG_VERSION"));

/// Serper.dev backend; batches all queries into a single request.
pub struct SerperProvider {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl SerperProvider {
    /// Create a provider with the given API key and timeout.
    pub fn new(api_key: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LeadScoutError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: SERPER_ENDPOINT.to_string(),
        })
    }

    /// Point the provider at a different endpoint (integration tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// One query payload in the batched request body.
#[derive(Debug, Serialize)]
struct SerperQuery<'a> {
    q: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    gl: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hl: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
}

impl<'a> From<&'a QuerySpec> for SerperQuery<'a> {
    fn from(spec: &'a QuerySpec) -> Self {
        Self {
            q: &spec.query,
            gl: spec.region.as_deref(),
            hl: spec.language.as_deref(),
            location: spec.location.as_deref(),
        }
    }
}

/// One query's response in the batched reply.
#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperOrganic>,
}

#[derive(Debug, Deserialize)]
struct SerperOrganic {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

impl From<SerperOrganic> for SearchResult {
    fn from(item: SerperOrganic) -> Self {
        Self {
            title: item.title,
            link: item.link,
            snippet: item.snippet,
        }
    }
}

#[async_trait]
impl SearchProvider for SerperProvider {
    async fn search_batch(&self, specs: &[QuerySpec]) -> Result<ResultsByQuery> {
        if specs.is_empty() {
            return Ok(Vec::new());
        }

        let payload: Vec<SerperQuery<'_>> = specs.iter().map(SerperQuery::from).collect();

        let response = match self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "serper request failed");
                return Ok(empty_batch(specs));
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "serper returned error status");
            return Ok(empty_batch(specs));
        }

        // A single-query batch may come back as a bare object instead of an array.
        let body: serde_json::Value = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "serper response body unreadable");
                return Ok(empty_batch(specs));
            }
        };

        let per_query: Vec<SerperResponse> = match body {
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(|item| serde_json::from_value(item).unwrap_or(SerperResponse { organic: vec![] }))
                .collect(),
            single => vec![
                serde_json::from_value(single).unwrap_or(SerperResponse { organic: vec![] }),
            ],
        };

        let mut responses = per_query.into_iter();
        let batch: ResultsByQuery = specs
            .iter()
            .map(|spec| {
                let results = responses
                    .next()
                    .map(|r| r.organic.into_iter().map(Into::into).collect())
                    .unwrap_or_default();
                (spec.query.clone(), results)
            })
            .collect();

        debug!(
            queries = specs.len(),
            results = total_results(&batch),
            "serper batch complete"
        );
        Ok(batch)
    }

    fn name(&self) -> &str {
        "serper"
    }
}

/// An all-empty batch matching the submitted query order.
fn empty_batch(specs: &[QuerySpec]) -> ResultsByQuery {
    specs.iter().map(|s| (s.query.clone(), Vec::new())).collect()
}
