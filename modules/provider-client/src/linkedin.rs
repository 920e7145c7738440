use crate::error::Result;
use crate::types::{LinkedInPerson, LinkedInSearchResponse};

const BASE_URL: &str = "https://api.linkedin.com";

/// LinkedIn people search on behalf of a member (requires the member's token).
pub struct LinkedInClient {
    client: reqwest::Client,
    base_url: String,
}

impl LinkedInClient {
    pub fn new() -> Self {
        Self {
            client: crate::http_client(crate::DEFAULT_TIMEOUT),
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

    pub async fn search_people(
        &self,
        access_token: &str,
        keywords: &str,
        count: u32,
    ) -> Result<Vec<LinkedInPerson>> {
        let url = format!("{}/v2/people-search", self.base_url);
        let count = count.to_string();
        let resp = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("keywords", keywords), ("start", "0"), ("count", count.as_str())])
            .send()
            .await?;

        let body: LinkedInSearchResponse = crate::read_json(resp).await?;
        tracing::debug!(keywords, count = body.elements.len(), "LinkedIn people search");
        Ok(body.elements)
    }
}

impl Default for LinkedInClient {
    fn default() -> Self {
        Self::new()
    }
}
