use std::sync::Arc;

use async_trait::async_trait;

use leadscout_common::{CandidateProfile, Credential, Source, Tier};
use provider_client::{ProviderError, TwitterClient, TwitterUser};

use super::provenance;
use crate::traits::TierBackend;

/// Twitter user search. Serves the authenticated tier with the user's own
/// access token, or the shared tier with the service bearer token.
pub struct TwitterBackend {
    client: Arc<TwitterClient>,
    tier: Tier,
    bearer_token: Option<String>,
    max_results: u32,
}

impl TwitterBackend {
    pub fn authenticated(client: Arc<TwitterClient>) -> Self {
        Self {
            client,
            tier: Tier::AuthenticatedUser,
            bearer_token: None,
            max_results: 10,
        }
    }

    pub fn shared(client: Arc<TwitterClient>, bearer_token: impl Into<String>) -> Self {
        Self {
            client,
            tier: Tier::SharedService,
            bearer_token: Some(bearer_token.into()),
            max_results: 5,
        }
    }

    fn base_confidence(&self) -> f64 {
        match self.tier {
            Tier::AuthenticatedUser => 0.8,
            _ => 0.6,
        }
    }

    fn to_profile(&self, user: TwitterUser) -> Result<CandidateProfile, ProviderError> {
        let bonus = if user.verified { 0.1 } else { 0.0 };
        let raw = serde_json::to_value(&user)?;
        Ok(CandidateProfile::new(
            user.name.clone(),
            provenance(Source::X, self.tier, self.provider()),
            self.base_confidence() + bonus,
        )
        .with_handle(format!("@{}", user.username))
        .with_profile_url(format!("https://x.com/{}", user.username))
        .with_raw(raw))
    }
}

#[async_trait]
impl TierBackend for TwitterBackend {
    fn provider(&self) -> &str {
        match self.tier {
            Tier::AuthenticatedUser => "twitter_user_token",
            _ => "twitter_api",
        }
    }

    async fn search(
        &self,
        query: &str,
        credential: Option<&Credential>,
    ) -> Result<Vec<CandidateProfile>, ProviderError> {
        let token = match (self.tier, credential, &self.bearer_token) {
            (Tier::AuthenticatedUser, Some(credential), _) => credential.access_token.as_str(),
            (Tier::SharedService, _, Some(bearer)) if !bearer.is_empty() => bearer.as_str(),
            _ => return Err(ProviderError::NotConfigured("twitter token")),
        };
        let users = self
            .client
            .search_users(token, query, self.max_results)
            .await?;
        users.into_iter().map(|u| self.to_profile(u)).collect()
    }
}
