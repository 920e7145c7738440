// Trait abstractions for the discovery pipeline's dependencies.
//
// Storage: UserRepository, CredentialRepository, UsageRepository. Backed by
//   MemoryStore (no DATABASE_URL) or PgStore.
// Providers: TierBackend is one concrete backend serving one tier of one
//   source. LeadScout is a whole source with its fallback chain.
// Collaborators: GoalInterpreter, MessageGenerator, TokenRefresher.
//
// Every boundary has a mock in `testing` so pipeline tests run without
// network or database.

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use leadscout_common::{CandidateProfile, Credential, Platform, SearchPlan, Source, User};
use provider_client::ProviderError;

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user for `email`, or return the one that already exists.
    async fn create_user(&self, email: &str) -> Result<User>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;
}

#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Insert or replace the credential for its (user, platform) pair.
    async fn upsert_credential(&self, credential: &Credential) -> Result<()>;

    async fn find_credential(
        &self,
        user_id: Uuid,
        platform: Platform,
    ) -> Result<Option<Credential>>;
}

#[async_trait]
pub trait UsageRepository: Send + Sync {
    /// Add one call to the (user, platform, endpoint, day) counter and return
    /// the new count.
    async fn increment_usage(
        &self,
        user_id: Uuid,
        platform: Platform,
        endpoint: &str,
        day: NaiveDate,
    ) -> Result<u64>;

    /// Per-endpoint totals for days on or after `since`.
    async fn usage_since(
        &self,
        user_id: Uuid,
        platform: Platform,
        since: NaiveDate,
    ) -> Result<BTreeMap<String, u64>>;
}

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// One concrete backend for one tier of one source. Implementations stamp
/// their own provenance onto every profile they return.
#[async_trait]
pub trait TierBackend: Send + Sync {
    /// Backend name used in provenance and logs, e.g. `people_data_labs`.
    fn provider(&self) -> &str;

    /// Run one query. `credential` is set for the authenticated-user tier.
    async fn search(
        &self,
        query: &str,
        credential: Option<&Credential>,
    ) -> std::result::Result<Vec<CandidateProfile>, ProviderError>;
}

/// A source-level scout. The pipeline fans out to one of these per source.
#[async_trait]
pub trait LeadScout: Send + Sync {
    fn source(&self) -> Source;

    async fn search(&self, query: &str, user_id: Option<Uuid>) -> Result<Vec<CandidateProfile>>;
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

#[async_trait]
pub trait GoalInterpreter: Send + Sync {
    /// Turn a free-text outreach goal into per-source queries.
    async fn interpret(
        &self,
        goal: &str,
        company_info: &str,
        emails: &[String],
    ) -> Result<SearchPlan>;
}

#[async_trait]
pub trait MessageGenerator: Send + Sync {
    /// A short personalized outreach message for one profile.
    async fn generate(
        &self,
        profile: &CandidateProfile,
        goal: &str,
        company_info: &str,
    ) -> Result<String>;
}

#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Exchange a refresh token for a fresh token response payload.
    async fn refresh(&self, platform: Platform, refresh_token: &str) -> Result<serde_json::Value>;
}

#[async_trait]
pub trait OAuthExchange: Send + Sync {
    /// Provider consent URL carrying `state`.
    fn authorize_url(&self, platform: Platform, state: &str) -> Result<String>;

    /// Trade an authorization code for a token response payload.
    async fn exchange_code(&self, platform: Platform, code: &str) -> Result<serde_json::Value>;
}
