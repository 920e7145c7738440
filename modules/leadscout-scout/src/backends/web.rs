use std::sync::Arc;

use async_trait::async_trait;

use leadscout_common::{CandidateProfile, Credential, Source, Tier};
use provider_client::{GoogleSearchClient, ProviderError};

use super::{provenance, title_segments};
use crate::traits::TierBackend;

/// Shared-tier open web search. Each result page becomes one candidate keyed
/// by its URL.
pub struct WebSearchBackend {
    client: Arc<GoogleSearchClient>,
}

impl WebSearchBackend {
    pub fn new(client: Arc<GoogleSearchClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TierBackend for WebSearchBackend {
    fn provider(&self) -> &str {
        "google_custom_search"
    }

    async fn search(
        &self,
        query: &str,
        _credential: Option<&Credential>,
    ) -> Result<Vec<CandidateProfile>, ProviderError> {
        let items = self.client.search(query, 10).await?;
        let mut profiles = Vec::with_capacity(items.len());
        for item in items {
            let Some(name) = title_segments(&item.title).into_iter().next() else {
                continue;
            };
            let mut profile = CandidateProfile::new(
                name,
                provenance(Source::Web, Tier::SharedService, self.provider()),
                0.4,
            )
            .with_profile_url(item.link.clone());
            if let Some(site) = item.display_link.as_deref().filter(|s| !s.is_empty()) {
                profile = profile.with_company(site.trim_start_matches("www."));
            }
            profiles.push(profile.with_raw(serde_json::to_value(&item)?));
        }
        Ok(profiles)
    }
}
