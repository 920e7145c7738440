use crate::error::{ProviderError, Result};
use crate::types::{CustomSearchResponse, SearchItem};

const BASE_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// Google Custom Search JSON API. Free tier: 100 queries/day.
pub struct GoogleSearchClient {
    client: reqwest::Client,
    api_key: String,
    engine_id: String,
    base_url: String,
}

impl GoogleSearchClient {
    pub fn new(api_key: String, engine_id: String) -> Self {
        Self {
            client: crate::http_client(crate::DEFAULT_TIMEOUT),
            api_key,
            engine_id,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.client = crate::http_client(timeout);
        self
    }

    /// Run one search. `num` is capped at 10 by the API.
    pub async fn search(&self, query: &str, num: u32) -> Result<Vec<SearchItem>> {
        if self.api_key.is_empty() || self.engine_id.is_empty() {
            return Err(ProviderError::NotConfigured("GOOGLE_CSE_API_KEY/GOOGLE_CSE_ID"));
        }

        let num = num.min(10).to_string();
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await?;

        let body: CustomSearchResponse = crate::read_json(resp).await?;
        tracing::info!(query, count = body.items.len(), "Custom search completed");
        Ok(body.items)
    }
}
