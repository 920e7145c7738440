use crate::error::Result;
use crate::types::{TwitterUser, TwitterUsersResponse};

const BASE_URL: &str = "https://api.twitter.com";

const USER_FIELDS: &str = "description,location,public_metrics,url,verified";

/// Twitter API v2 client. The bearer token is passed per call so the same
/// client serves both the shared app token and a user's own OAuth token.
pub struct TwitterClient {
    client: reqwest::Client,
    base_url: String,
}

impl TwitterClient {
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

    /// Search users matching `query`.
    pub async fn search_users(
        &self,
        bearer_token: &str,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<TwitterUser>> {
        let url = format!("{}/2/users/search", self.base_url);
        let max_results = max_results.to_string();
        let resp = self
            .client
            .get(&url)
            .bearer_auth(bearer_token)
            .query(&[
                ("query", query),
                ("max_results", max_results.as_str()),
                ("user.fields", USER_FIELDS),
            ])
            .send()
            .await?;

        let body: TwitterUsersResponse = crate::read_json(resp).await?;
        tracing::debug!(query, count = body.data.len(), "Twitter user search");
        Ok(body.data)
    }
}

impl Default for TwitterClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::ProviderError;

    #[tokio::test]
    async fn stalled_server_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept the connection and never answer.
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });

        let client = TwitterClient::new()
            .with_base_url(format!("http://{addr}"))
            .with_timeout(Duration::from_millis(100));
        let err = client.search_users("token", "founders", 5).await.unwrap_err();
        assert!(matches!(err, ProviderError::Timeout), "got {err:?}");
    }
}
