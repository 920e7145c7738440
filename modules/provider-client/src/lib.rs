pub mod claude;
pub mod error;
pub mod google;
pub mod linkedin;
pub mod oauth;
pub mod people_data_labs;
pub mod twitter;
pub mod types;

pub use claude::ClaudeClient;
pub use error::{ProviderError, Result};
pub use google::GoogleSearchClient;
pub use linkedin::LinkedInClient;
pub use oauth::{OAuthClient, OAuthEndpoints, LINKEDIN_OAUTH, TWITTER_OAUTH};
pub use people_data_labs::PeopleDataLabsClient;
pub use twitter::TwitterClient;
pub use types::{
    LinkedInPerson, PdlPerson, SearchItem, TwitterPublicMetrics, TwitterUser,
};

use std::time::Duration;

use serde::de::DeserializeOwned;

/// Per-request timeout used until a client is given its own.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client whose every request is bounded by `timeout`.
pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "HTTP client builder failed, using defaults");
            reqwest::Client::new()
        })
}

/// Turn a non-success response into a classified `ProviderError`, otherwise
/// decode the JSON body.
pub(crate) async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let retry_after = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        let body = resp.text().await.unwrap_or_default();
        return Err(ProviderError::from_status(status.as_u16(), body, retry_after));
    }
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
