use async_trait::async_trait;
use tracing::debug;

use leadscout_common::{CandidateProfile, Credential, Source, Tier};
use provider_client::{PeopleDataLabsClient, ProviderError};

use super::{absolute_url, provenance};
use crate::traits::TierBackend;

/// Shared-tier email enrichment via People Data Labs.
pub struct PeopleDataLabsBackend {
    client: PeopleDataLabsClient,
}

impl PeopleDataLabsBackend {
    pub fn new(client: PeopleDataLabsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TierBackend for PeopleDataLabsBackend {
    fn provider(&self) -> &str {
        "people_data_labs"
    }

    async fn search(
        &self,
        query: &str,
        _credential: Option<&Credential>,
    ) -> Result<Vec<CandidateProfile>, ProviderError> {
        let email = query.trim();
        let Some((person, likelihood)) = self.client.enrich_person(email).await? else {
            debug!(email, "No People Data Labs match");
            return Ok(Vec::new());
        };

        let name = person
            .display_name()
            .unwrap_or_else(|| email.to_string());
        let confidence = (f64::from(likelihood) / 10.0).clamp(0.0, 1.0);
        let mut profile = CandidateProfile::new(
            name,
            provenance(Source::Email, Tier::SharedService, self.provider()),
            confidence,
        )
        .with_email(email.to_lowercase());

        if let Some(title) = person.job_title.as_deref().filter(|t| !t.is_empty()) {
            profile = profile.with_title(title);
        }
        if let Some(company) = person.job_company_name.as_deref().filter(|c| !c.is_empty()) {
            profile = profile.with_company(company);
        }
        if let Some(url) = person.linkedin_url.as_deref().filter(|u| !u.is_empty()) {
            profile = profile.with_profile_url(absolute_url(url));
        }
        if let Some(handle) = person.twitter_username.as_deref().filter(|h| !h.is_empty()) {
            profile = profile.with_handle(format!("@{}", handle.trim_start_matches('@')));
        }
        let raw = serde_json::to_value(&person)?;
        Ok(vec![profile.with_raw(raw)])
    }
}
