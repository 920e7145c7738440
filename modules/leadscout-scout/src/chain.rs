use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use leadscout_common::{CandidateProfile, Credential, Source, Tier};

use crate::backends::offline_profiles;
use crate::credentials::CredentialStore;
use crate::resilient::{call_with_retry, CallOutcome, RetryPolicy};
use crate::strategy::StrategyResolver;
use crate::traits::{LeadScout, TierBackend};
use crate::usage::{UsageTracker, SEARCH_ENDPOINT};

/// One source's fallback chain.
///
/// Tiers run in the order the source's strategy gives. A tier wins when it
/// returns at least one profile tagged with that tier; otherwise the next
/// tier runs. The offline stand-in always answers, so a search never fails.
#[derive(TypedBuilder)]
pub struct SourceScout {
    source: Source,
    resolver: Arc<StrategyResolver>,
    credentials: Arc<CredentialStore>,
    usage: Arc<UsageTracker>,
    #[builder(default)]
    retry: RetryPolicy,
    #[builder(default, setter(strip_option))]
    authenticated: Option<Arc<dyn TierBackend>>,
    #[builder(default, setter(strip_option))]
    shared: Option<Arc<dyn TierBackend>>,
}

impl SourceScout {
    /// Run the chain for one query. Infallible by construction.
    pub async fn search_tiers(&self, query: &str, user_id: Option<Uuid>) -> Vec<CandidateProfile> {
        let tiers = match self.resolver.resolve(self.source) {
            Ok(tiers) => tiers,
            Err(e) => {
                warn!(source = %self.source, error = %e, "No strategy, using offline stand-in");
                return offline_profiles(self.source, query);
            }
        };

        for &tier in tiers {
            let profiles = match tier {
                Tier::AuthenticatedUser => self.run_authenticated(query, user_id).await,
                Tier::SharedService => self.run_shared(query).await,
                Tier::OfflineFallback => break,
            };
            if profiles.iter().any(|p| p.is_from_tier(tier)) {
                info!(
                    source = %self.source,
                    %tier,
                    count = profiles.len(),
                    "Tier produced profiles"
                );
                return profiles;
            }
            debug!(source = %self.source, %tier, "Tier produced nothing, falling through");
        }

        info!(source = %self.source, query, "Using offline stand-in");
        offline_profiles(self.source, query)
    }

    async fn run_authenticated(&self, query: &str, user_id: Option<Uuid>) -> Vec<CandidateProfile> {
        let (Some(user_id), Some(platform), Some(backend)) =
            (user_id, self.source.platform(), self.authenticated.as_ref())
        else {
            return Vec::new();
        };

        let credential = match self.credentials.get(user_id, platform).await {
            Ok(Some(credential)) => credential,
            Ok(None) => {
                debug!(%user_id, %platform, "No usable credential, skipping user tier");
                return Vec::new();
            }
            Err(e) => {
                warn!(%user_id, %platform, error = %e, "Credential lookup failed, skipping user tier");
                return Vec::new();
            }
        };

        if let Err(e) = self.usage.check_quota(user_id, platform, SEARCH_ENDPOINT).await {
            warn!(%user_id, %platform, error = %e, "Usage quota check");
        }
        if let Err(e) = self.usage.track(user_id, platform, SEARCH_ENDPOINT).await {
            warn!(%user_id, %platform, error = %e, "Failed to record API usage");
        }

        self.call(backend.as_ref(), query, Some(&credential)).await
    }

    async fn run_shared(&self, query: &str) -> Vec<CandidateProfile> {
        match self.shared.as_ref() {
            Some(backend) => self.call(backend.as_ref(), query, None).await,
            None => Vec::new(),
        }
    }

    async fn call(
        &self,
        backend: &dyn TierBackend,
        query: &str,
        credential: Option<&Credential>,
    ) -> Vec<CandidateProfile> {
        match call_with_retry(&self.retry, backend.provider(), || {
            backend.search(query, credential)
        })
        .await
        {
            CallOutcome::Success(profiles) => profiles,
            CallOutcome::Exhausted { .. } | CallOutcome::Aborted(_) => Vec::new(),
        }
    }
}

#[async_trait]
impl LeadScout for SourceScout {
    fn source(&self) -> Source {
        self.source
    }

    async fn search(&self, query: &str, user_id: Option<Uuid>) -> Result<Vec<CandidateProfile>> {
        Ok(self.search_tiers(query, user_id).await)
    }
}
