use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};

use crate::error::{ProviderError, Result};
use crate::types::{MessagesRequest, MessagesResponse, WireMessage};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Minimal text-in/text-out client for the Anthropic messages API.
#[derive(Clone)]
pub struct ClaudeClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl ClaudeClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: crate::http_client(crate::DEFAULT_TIMEOUT),
            api_key: api_key.into(),
            model: model.into(),
            base_url: ANTHROPIC_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Bound every request by `timeout`, connect through body.
    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.http = crate::http_client(timeout);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| ProviderError::Parse(e.to_string()))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    pub async fn complete(&self, system: &str, user: &str, max_tokens: u32) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NotConfigured("ANTHROPIC_API_KEY"));
        }

        let url = format!("{}/messages", self.base_url);
        let request = MessagesRequest {
            model: &self.model,
            max_tokens,
            system,
            messages: vec![WireMessage {
                role: "user",
                content: user,
            }],
        };

        tracing::debug!(model = %self.model, "Claude completion request");

        let resp = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await?;

        let body: MessagesResponse = crate::read_json(resp).await?;
        body.text()
            .ok_or_else(|| ProviderError::Parse("no text in Claude response".to_string()))
    }
}
