use std::sync::Arc;

use async_trait::async_trait;

use leadscout_common::{CandidateProfile, Credential, Source, Tier};
use provider_client::{GoogleSearchClient, LinkedInClient, ProviderError};

use super::{provenance, title_segments};
use crate::traits::TierBackend;

/// Authenticated-tier LinkedIn people search with the member's own token.
pub struct LinkedInMemberBackend {
    client: LinkedInClient,
}

impl LinkedInMemberBackend {
    pub fn new(client: LinkedInClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TierBackend for LinkedInMemberBackend {
    fn provider(&self) -> &str {
        "linkedin_member_api"
    }

    async fn search(
        &self,
        query: &str,
        credential: Option<&Credential>,
    ) -> Result<Vec<CandidateProfile>, ProviderError> {
        let credential = credential.ok_or(ProviderError::NotConfigured("linkedin member token"))?;
        let people = self
            .client
            .search_people(&credential.access_token, query, 10)
            .await?;

        let mut profiles = Vec::with_capacity(people.len());
        for person in people {
            let Some(name) = person.display_name() else {
                continue;
            };
            let mut profile = CandidateProfile::new(
                name,
                provenance(Source::Linkedin, Tier::AuthenticatedUser, self.provider()),
                0.85,
            );
            if let Some(headline) = person.headline.as_deref().filter(|h| !h.is_empty()) {
                profile = profile.with_title(headline);
            }
            if let Some(url) = person.profile_url() {
                profile = profile.with_profile_url(url);
            }
            profiles.push(profile.with_raw(serde_json::to_value(&person)?));
        }
        Ok(profiles)
    }
}

/// Shared-tier LinkedIn discovery through a site-restricted web search over
/// public `/in/` profile pages.
pub struct LinkedInSiteSearchBackend {
    client: Arc<GoogleSearchClient>,
}

impl LinkedInSiteSearchBackend {
    pub fn new(client: Arc<GoogleSearchClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TierBackend for LinkedInSiteSearchBackend {
    fn provider(&self) -> &str {
        "linkedin_site_search"
    }

    async fn search(
        &self,
        query: &str,
        _credential: Option<&Credential>,
    ) -> Result<Vec<CandidateProfile>, ProviderError> {
        let items = self
            .client
            .search(&format!("site:linkedin.com/in {query}"), 10)
            .await?;

        let mut profiles = Vec::new();
        for item in items {
            if !item.link.contains("linkedin.com/in/") {
                continue;
            }
            let mut segments = title_segments(&item.title).into_iter();
            let Some(name) = segments.next() else {
                continue;
            };
            let mut profile = CandidateProfile::new(
                name,
                provenance(Source::Linkedin, Tier::SharedService, self.provider()),
                0.6,
            )
            .with_profile_url(item.link.clone());
            if let Some(title) = segments.next() {
                profile = profile.with_title(title);
            }
            if let Some(company) = segments.next() {
                profile = profile.with_company(company);
            }
            profiles.push(profile.with_raw(serde_json::to_value(&item)?));
        }
        Ok(profiles)
    }
}
