use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LeadScoutError;

// --- Sources, platforms, tiers ---

/// A logical provider category a scout searches.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Email,
    Linkedin,
    X,
    Web,
}

impl Source {
    pub const ALL: [Source; 4] = [Source::Email, Source::Linkedin, Source::X, Source::Web];

    /// The platform whose user credential unlocks the authenticated tier, if any.
    pub fn platform(self) -> Option<Platform> {
        match self {
            Source::Linkedin => Some(Platform::Linkedin),
            Source::X => Some(Platform::Twitter),
            Source::Email | Source::Web => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Source::Email => "email",
            Source::Linkedin => "linkedin",
            Source::X => "x",
            Source::Web => "web",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = LeadScoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "email" => Ok(Source::Email),
            "linkedin" => Ok(Source::Linkedin),
            "x" | "twitter" => Ok(Source::X),
            "web" | "internet" => Ok(Source::Web),
            other => Err(LeadScoutError::Configuration(format!(
                "unknown source '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Linkedin,
    Twitter,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Linkedin, Platform::Twitter];

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Linkedin => "linkedin",
            Platform::Twitter => "twitter",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = LeadScoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "linkedin" => Ok(Platform::Linkedin),
            "twitter" | "x" => Ok(Platform::Twitter),
            other => Err(LeadScoutError::ClientInput(format!(
                "unknown platform '{other}'"
            ))),
        }
    }
}

/// Fallback priority level. Declaration order is priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    AuthenticatedUser,
    SharedService,
    OfflineFallback,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::AuthenticatedUser => "authenticated_user",
            Tier::SharedService => "shared_service",
            Tier::OfflineFallback => "offline_fallback",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Users and credentials ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Stored authorization artifact for one (user, platform) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub user_id: Uuid,
    pub platform: Platform,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    /// The full token response as the provider returned it.
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Credential {
    /// Build a credential from a provider token response
    /// (`access_token`, optional `refresh_token`, optional `expires_in` seconds).
    pub fn from_token_payload(
        user_id: Uuid,
        platform: Platform,
        payload: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Self {
        let access_token = payload
            .get("access_token")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let refresh_token = payload
            .get("refresh_token")
            .and_then(|v| v.as_str())
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let expires_at = payload
            .get("expires_in")
            .and_then(|v| v.as_i64())
            .and_then(|secs| expiry_after(now, secs));

        Self {
            user_id,
            platform,
            access_token,
            refresh_token,
            expires_at,
            payload,
            created_at: now,
        }
    }

    /// Usable when there is no expiry or the expiry is still ahead of `now`.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            None => true,
            Some(expires_at) => expires_at > now,
        }
    }
}

/// `now + secs`. Lifetimes past the representable range mean no expiry;
/// negative overflow means already expired.
fn expiry_after(now: DateTime<Utc>, secs: i64) -> Option<DateTime<Utc>> {
    match Duration::try_seconds(secs).and_then(|d| now.checked_add_signed(d)) {
        Some(at) => Some(at),
        None if secs < 0 => Some(now),
        None => None,
    }
}

// --- Candidate profiles ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub source: Source,
    pub tier: Tier,
    /// Which concrete backend answered, e.g. `people_data_labs`.
    pub provider: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityKeys {
    /// X handle, e.g. `@janedoe`. Any source that knows a person's X handle
    /// fills this, so the same handle merges across sources.
    pub handle: Option<String>,
    /// Professional profile URL, e.g. a LinkedIn `/in/` link.
    pub profile_url: Option<String>,
    pub email: Option<String>,
}

/// A normalized record describing a prospective contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub name: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub identity: IdentityKeys,
    pub provenance: Provenance,
    pub confidence: f64,
    #[serde(default)]
    pub raw: serde_json::Value,
}

impl CandidateProfile {
    pub fn new(name: impl Into<String>, provenance: Provenance, confidence: f64) -> Self {
        Self {
            name: name.into(),
            title: None,
            company: None,
            identity: IdentityKeys::default(),
            provenance,
            confidence,
            raw: serde_json::Value::Null,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.identity.handle = Some(handle.into());
        self
    }

    pub fn with_profile_url(mut self, url: impl Into<String>) -> Self {
        self.identity.profile_url = Some(url.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.identity.email = Some(email.into());
        self
    }

    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = raw;
        self
    }

    pub fn is_from_tier(&self, tier: Tier) -> bool {
        self.provenance.tier == tier
    }
}

// --- Search plan ---

/// Per-source search queries produced once per request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchPlan {
    pub queries: BTreeMap<Source, Vec<String>>,
}

impl SearchPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_queries<I, S>(mut self, source: Source, queries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.queries.entry(source).or_default();
        for q in queries {
            let q = q.into();
            if !q.trim().is_empty() {
                entry.push(q);
            }
        }
        self
    }

    pub fn queries_for(&self, source: Source) -> &[String] {
        self.queries.get(&source).map(Vec::as_slice).unwrap_or(&[])
    }

    /// (source, query) pairs in source order, then query order.
    pub fn pairs(&self) -> impl Iterator<Item = (Source, &str)> {
        self.queries
            .iter()
            .flat_map(|(source, qs)| qs.iter().map(move |q| (*source, q.as_str())))
    }

    pub fn total_queries(&self) -> usize {
        self.queries.values().map(Vec::len).sum()
    }
}

// --- Discovery request / result ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryRequest {
    pub emails: Vec<String>,
    pub company_info: String,
    pub goal: String,
    pub target_count: i64,
    pub user_id: Option<Uuid>,
    pub user_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedProfile {
    #[serde(flatten)]
    pub profile: CandidateProfile,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryResult {
    pub profiles: Vec<EnrichedProfile>,
    /// Unique profiles found before truncation to the target count.
    pub total_found: usize,
    pub returned: usize,
    pub warnings: Vec<String>,
    pub user_id: Option<Uuid>,
}
