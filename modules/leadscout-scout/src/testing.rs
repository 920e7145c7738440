// Test mocks for the discovery pipeline.
//
// One mock per trait boundary:
// - MockBackend (TierBackend): scripted responses, counts calls
// - MockScout (LeadScout): query -> profiles / error / panic
// - MockRefresher (TokenRefresher): canned payload or failure, counts calls
// - FixedInterpreter / FailingInterpreter (GoalInterpreter)
// - MockMessenger (MessageGenerator): fails for chosen names
//
// Plus helpers for building profiles and credentials.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use leadscout_common::{
    CandidateProfile, Credential, Platform, Provenance, SearchPlan, Source, Tier,
};
use provider_client::ProviderError;

use crate::credentials::CredentialStore;
use crate::resilient::RetryPolicy;
use crate::store::MemoryStore;
use crate::traits::{
    GoalInterpreter, LeadScout, MessageGenerator, TierBackend, TokenRefresher,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn profile(name: &str, source: Source, tier: Tier, confidence: f64) -> CandidateProfile {
    CandidateProfile::new(
        name,
        Provenance {
            source,
            tier,
            provider: "mock".to_string(),
        },
        confidence,
    )
}

/// Retry policy with millisecond delays so retry tests stay fast.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        attempt_timeout: Duration::from_millis(500),
    }
}

/// A credential with an explicit expiry and optional refresh token.
pub fn credential(
    user_id: Uuid,
    platform: Platform,
    access_token: &str,
    refresh_token: Option<&str>,
    expires_at: Option<DateTime<Utc>>,
) -> Credential {
    Credential {
        user_id,
        platform,
        access_token: access_token.to_string(),
        refresh_token: refresh_token.map(str::to_string),
        expires_at,
        payload: serde_json::json!({ "access_token": access_token }),
        created_at: Utc::now(),
    }
}

pub fn credential_store(
    store: Arc<MemoryStore>,
    refresher: Arc<dyn TokenRefresher>,
) -> Arc<CredentialStore> {
    Arc::new(CredentialStore::new(store, refresher))
}

// ---------------------------------------------------------------------------
// MockBackend
// ---------------------------------------------------------------------------

/// Returns scripted responses in order; once the script runs out the last
/// response repeats. Records every call and the access token it saw.
pub struct MockBackend {
    script: Mutex<VecDeque<Result<Vec<CandidateProfile>, ProviderError>>>,
    last: Mutex<Result<Vec<CandidateProfile>, ProviderError>>,
    calls: AtomicUsize,
    tokens: Mutex<Vec<Option<String>>>,
}

impl MockBackend {
    pub fn returning(profiles: Vec<CandidateProfile>) -> Self {
        Self::scripted(vec![Ok(profiles)])
    }

    pub fn failing(err: ProviderError) -> Self {
        Self::scripted(vec![Err(err)])
    }

    pub fn scripted(script: Vec<Result<Vec<CandidateProfile>, ProviderError>>) -> Self {
        let last = script.last().cloned().unwrap_or(Ok(Vec::new()));
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(last),
            calls: AtomicUsize::new(0),
            tokens: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn tokens_seen(&self) -> Vec<Option<String>> {
        self.tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl TierBackend for MockBackend {
    fn provider(&self) -> &str {
        "mock"
    }

    async fn search(
        &self,
        _query: &str,
        credential: Option<&Credential>,
    ) -> Result<Vec<CandidateProfile>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens
            .lock()
            .unwrap()
            .push(credential.map(|c| c.access_token.clone()));
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(response) => response,
            None => self.last.lock().unwrap().clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// MockScout
// ---------------------------------------------------------------------------

/// Source-level scout keyed by query. Unregistered queries return nothing.
pub struct MockScout {
    source: Source,
    results: HashMap<String, Vec<CandidateProfile>>,
    failures: HashSet<String>,
    panics: HashSet<String>,
    calls: AtomicUsize,
}

impl MockScout {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            results: HashMap::new(),
            failures: HashSet::new(),
            panics: HashSet::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn on_query(mut self, query: &str, profiles: Vec<CandidateProfile>) -> Self {
        self.results.insert(query.to_string(), profiles);
        self
    }

    pub fn failing_on(mut self, query: &str) -> Self {
        self.failures.insert(query.to_string());
        self
    }

    pub fn panicking_on(mut self, query: &str) -> Self {
        self.panics.insert(query.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LeadScout for MockScout {
    fn source(&self) -> Source {
        self.source
    }

    async fn search(&self, query: &str, _user_id: Option<Uuid>) -> Result<Vec<CandidateProfile>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.panics.contains(query) {
            panic!("MockScout: scripted panic for {query}");
        }
        if self.failures.contains(query) {
            bail!("MockScout: scripted failure for {query}");
        }
        Ok(self.results.get(query).cloned().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// MockRefresher
// ---------------------------------------------------------------------------

pub struct MockRefresher {
    payload: Option<serde_json::Value>,
    delay: Duration,
    panics: bool,
    calls: AtomicUsize,
}

impl MockRefresher {
    /// Every refresh succeeds with `payload`.
    pub fn succeeding(payload: serde_json::Value) -> Self {
        Self {
            payload: Some(payload),
            delay: Duration::ZERO,
            panics: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Every refresh fails.
    pub fn failing() -> Self {
        Self {
            payload: None,
            delay: Duration::ZERO,
            panics: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Every refresh panics.
    pub fn panicking() -> Self {
        Self {
            panics: true,
            ..Self::failing()
        }
    }

    /// Hold each refresh open for `delay` so concurrent callers overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenRefresher for MockRefresher {
    async fn refresh(&self, platform: Platform, _refresh_token: &str) -> Result<serde_json::Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.panics {
            panic!("MockRefresher: scripted panic for {platform}");
        }
        self.payload
            .clone()
            .ok_or_else(|| anyhow!("MockRefresher: {platform} refresh rejected"))
    }
}

// ---------------------------------------------------------------------------
// Interpreters and messenger
// ---------------------------------------------------------------------------

/// Always returns the same plan.
pub struct FixedInterpreter {
    plan: SearchPlan,
    delay: Duration,
    calls: AtomicUsize,
}

impl FixedInterpreter {
    pub fn new(plan: SearchPlan) -> Self {
        Self {
            plan,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Sleep for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GoalInterpreter for FixedInterpreter {
    async fn interpret(&self, _goal: &str, _company: &str, _emails: &[String]) -> Result<SearchPlan> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.plan.clone())
    }
}

pub struct FailingInterpreter;

#[async_trait]
impl GoalInterpreter for FailingInterpreter {
    async fn interpret(&self, _goal: &str, _company: &str, _emails: &[String]) -> Result<SearchPlan> {
        bail!("FailingInterpreter: model unavailable")
    }
}

/// Writes `Hello <name>` except for names it was told to fail or stall on.
#[derive(Default)]
pub struct MockMessenger {
    failures: HashSet<String>,
    stalls: HashSet<String>,
}

impl MockMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, name: &str) -> Self {
        self.failures.insert(name.to_string());
        self
    }

    /// Never answer for `name`.
    pub fn stalling_for(mut self, name: &str) -> Self {
        self.stalls.insert(name.to_string());
        self
    }
}

#[async_trait]
impl MessageGenerator for MockMessenger {
    async fn generate(
        &self,
        profile: &CandidateProfile,
        _goal: &str,
        _company_info: &str,
    ) -> Result<String> {
        if self.stalls.contains(&profile.name) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.failures.contains(&profile.name) {
            bail!("MockMessenger: scripted failure for {}", profile.name);
        }
        Ok(format!("Hello {}", profile.name))
    }
}
