use crate::error::{ProviderError, Result};
use crate::types::{PdlEnrichResponse, PdlPerson};

const BASE_URL: &str = "https://api.peopledatalabs.com";

/// Only matches at or above this likelihood are returned.
const MIN_LIKELIHOOD: u8 = 6;

pub struct PeopleDataLabsClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl PeopleDataLabsClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: crate::http_client(crate::DEFAULT_TIMEOUT),
            api_key,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Bound every request by `timeout`, connect through body.
    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.client = crate::http_client(timeout);
        self
    }

    /// Enrich a single email address. `Ok(None)` when no confident match exists.
    pub async fn enrich_person(&self, email: &str) -> Result<Option<(PdlPerson, u8)>> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NotConfigured("PEOPLE_DATA_LABS_API_KEY"));
        }

        let url = format!("{}/v5/person/enrich", self.base_url);
        let min_likelihood = MIN_LIKELIHOOD.to_string();
        let resp = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("email", email),
                ("required", "emails"),
                ("min_likelihood", min_likelihood.as_str()),
            ])
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::info!(email, "No person found for email");
            return Ok(None);
        }

        let body: PdlEnrichResponse = crate::read_json(resp).await?;
        match body.data {
            Some(person) if body.status == 200 => {
                let likelihood = body.likelihood.unwrap_or(MIN_LIKELIHOOD);
                tracing::info!(email, likelihood, "Enriched email");
                Ok(Some((person, likelihood)))
            }
            _ => Ok(None),
        }
    }
}
