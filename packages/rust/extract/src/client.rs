//! Model inference client.
//!
//! [`ModelClient`] is the narrow interface the extraction engine depends on:
//! a plain prompt→text call and a schema-constrained prompt→JSON call. The
//! production implementation talks to OpenRouter's chat-completions API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use leadscout_shared::{LeadScoutError, Result};

/// Default OpenRouter chat-completions endpoint.
const OPENROUTER_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";

/// User-Agent string for model requests.
const USER_AGENT: &str = concat!("leadscout/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A language-model backend.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Plain prompt → response text.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Schema-constrained prompt → JSON value already shaped by `schema`.
    async fn complete_structured(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value>;
}

// ---------------------------------------------------------------------------
// OpenRouter implementation
// ---------------------------------------------------------------------------

/// OpenRouter-backed model client.
pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenRouterClient {
    /// Create a client for the given model with the given API key.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LeadScoutError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            endpoint: OPENROUTER_ENDPOINT.to_string(),
        })
    }

    /// Point the client at a different endpoint (integration tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Issue one chat request and return the first choice's content.
    async fn chat(&self, request: &ChatRequest<'_>) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| LeadScoutError::Network(format!("model request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LeadScoutError::Extraction(format!(
                "model returned HTTP {status}: {}",
                &body[..body.len().min(200)]
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| LeadScoutError::Extraction(format!("invalid model response: {e}")))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(LeadScoutError::Extraction("model returned empty output".into()));
        }

        debug!(model = %self.model, content_len = content.len(), "model call complete");
        Ok(content)
    }
}

#[async_trait]
impl ModelClient for OpenRouterClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
            response_format: None,
        };
        self.chat(&request).await
    }

    async fn complete_structured(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
            response_format: Some(ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaSpec {
                    name: "extraction",
                    strict: true,
                    schema,
                },
            }),
        };

        let content = self.chat(&request).await?;
        serde_json::from_str(&content).map_err(|e| {
            LeadScoutError::Extraction(format!("structured output is not valid JSON: {e}"))
        })
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    json_schema: JsonSchemaSpec<'a>,
}

#[derive(Debug, Serialize)]
struct JsonSchemaSpec<'a> {
    name: &'a str,
    strict: bool,
    schema: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}
