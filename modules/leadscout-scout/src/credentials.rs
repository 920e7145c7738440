use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{error, info, warn};
use uuid::Uuid;

use leadscout_common::{Config, Credential, LeadScoutError, Platform};
use provider_client::{OAuthClient, DEFAULT_TIMEOUT, LINKEDIN_OAUTH, TWITTER_OAUTH};

use crate::traits::{CredentialRepository, OAuthExchange, TokenRefresher};

type RefreshKey = (Uuid, Platform);
type InflightRefresh = Shared<BoxFuture<'static, Option<Credential>>>;
type InflightMap = Arc<Mutex<HashMap<RefreshKey, InflightRefresh>>>;

/// Per-user, per-platform credential storage with refresh on read.
///
/// Concurrent reads of the same stale credential share one refresh call.
/// A failed refresh leaves the stored row untouched so the next read tries
/// again.
pub struct CredentialStore {
    repo: Arc<dyn CredentialRepository>,
    refresher: Arc<dyn TokenRefresher>,
    refresh_timeout: Duration,
    inflight: InflightMap,
}

impl CredentialStore {
    pub fn new(repo: Arc<dyn CredentialRepository>, refresher: Arc<dyn TokenRefresher>) -> Self {
        Self {
            repo,
            refresher,
            refresh_timeout: DEFAULT_TIMEOUT,
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Upper bound on one refresh call. A refresh that outlives it counts
    /// as failed.
    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    /// Persist a provider token response, replacing any prior credential for
    /// the pair.
    pub async fn store(
        &self,
        user_id: Uuid,
        platform: Platform,
        payload: serde_json::Value,
    ) -> Result<Credential, LeadScoutError> {
        let credential = Credential::from_token_payload(user_id, platform, payload, Utc::now());
        if credential.access_token.is_empty() {
            return Err(LeadScoutError::CredentialUnusable {
                platform,
                reason: "token response has no access_token".to_string(),
            });
        }
        self.repo
            .upsert_credential(&credential)
            .await
            .map_err(|e| LeadScoutError::Storage(e.to_string()))?;
        info!(%user_id, %platform, "Stored credential");
        Ok(credential)
    }

    /// A usable credential for the pair, refreshing it first when expired.
    /// `Ok(None)` covers both "never connected" and "refresh failed".
    pub async fn get(
        &self,
        user_id: Uuid,
        platform: Platform,
    ) -> Result<Option<Credential>, LeadScoutError> {
        let stored = self
            .repo
            .find_credential(user_id, platform)
            .await
            .map_err(|e| LeadScoutError::Storage(e.to_string()))?;
        match stored {
            None => Ok(None),
            Some(credential) if credential.is_usable_at(Utc::now()) => Ok(Some(credential)),
            Some(_) => Ok(self.refresh_single_flight(user_id, platform).await),
        }
    }

    /// Whether each platform has a usable (unexpired) credential right now.
    /// Never refreshes.
    pub async fn connection_status(
        &self,
        user_id: Uuid,
    ) -> Result<BTreeMap<Platform, bool>, LeadScoutError> {
        let now = Utc::now();
        let mut status = BTreeMap::new();
        for platform in Platform::ALL {
            let found = self
                .repo
                .find_credential(user_id, platform)
                .await
                .map_err(|e| LeadScoutError::Storage(e.to_string()))?;
            status.insert(platform, found.is_some_and(|c| c.is_usable_at(now)));
        }
        Ok(status)
    }

    async fn refresh_single_flight(&self, user_id: Uuid, platform: Platform) -> Option<Credential> {
        let key = (user_id, platform);
        let refresh = {
            let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
            match inflight.get(&key) {
                Some(existing) => existing.clone(),
                None => {
                    let repo = self.repo.clone();
                    let refresher = self.refresher.clone();
                    let registry = self.inflight.clone();
                    let timeout = self.refresh_timeout;
                    let refresh = async move {
                        let _entry = InflightEntry { registry, key };
                        let attempt = tokio::time::timeout(
                            timeout,
                            refresh_once(repo.as_ref(), refresher.as_ref(), user_id, platform),
                        );
                        match AssertUnwindSafe(attempt).catch_unwind().await {
                            Ok(Ok(Ok(credential))) => Some(credential),
                            Ok(Ok(Err(e))) => {
                                warn!(%user_id, %platform, error = %e, "Credential refresh failed");
                                None
                            }
                            Ok(Err(_)) => {
                                warn!(%user_id, %platform, ?timeout, "Credential refresh timed out");
                                None
                            }
                            Err(_) => {
                                error!(%user_id, %platform, "Credential refresh panicked");
                                None
                            }
                        }
                    }
                    .boxed()
                    .shared();
                    inflight.insert(key, refresh.clone());
                    refresh
                }
            }
        };
        refresh.await
    }
}

/// Clears a key from the in-flight map once its refresh future is done,
/// including on unwind.
struct InflightEntry {
    registry: InflightMap,
    key: RefreshKey,
}

impl Drop for InflightEntry {
    fn drop(&mut self) {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

/// Re-read the row, then refresh it unless another caller already did.
async fn refresh_once(
    repo: &dyn CredentialRepository,
    refresher: &dyn TokenRefresher,
    user_id: Uuid,
    platform: Platform,
) -> Result<Credential, LeadScoutError> {
    let stale = repo
        .find_credential(user_id, platform)
        .await
        .map_err(|e| LeadScoutError::Storage(e.to_string()))?
        .ok_or_else(|| LeadScoutError::CredentialUnusable {
            platform,
            reason: "credential was removed".to_string(),
        })?;
    if stale.is_usable_at(Utc::now()) {
        return Ok(stale);
    }
    let refresh_token =
        stale
            .refresh_token
            .clone()
            .ok_or_else(|| LeadScoutError::CredentialUnusable {
                platform,
                reason: "expired and no refresh token".to_string(),
            })?;

    let payload = refresher
        .refresh(platform, &refresh_token)
        .await
        .map_err(|e| LeadScoutError::CredentialUnusable {
            platform,
            reason: e.to_string(),
        })?;

    let mut fresh = Credential::from_token_payload(user_id, platform, payload, Utc::now());
    if fresh.access_token.is_empty() {
        return Err(LeadScoutError::CredentialUnusable {
            platform,
            reason: "refresh response has no access_token".to_string(),
        });
    }
    if fresh.refresh_token.is_none() {
        fresh.refresh_token = Some(refresh_token);
    }
    repo.upsert_credential(&fresh)
        .await
        .map_err(|e| LeadScoutError::Storage(e.to_string()))?;
    info!(%user_id, %platform, "Refreshed credential");
    Ok(fresh)
}

// ---------------------------------------------------------------------------
// OAuth-backed refresher and code exchange
// ---------------------------------------------------------------------------

/// One configured OAuth client per platform.
pub struct OAuthClients {
    clients: HashMap<Platform, OAuthClient>,
}

impl OAuthClients {
    pub fn from_config(config: &Config) -> Self {
        let mut clients = HashMap::new();
        for platform in Platform::ALL {
            let app = config.oauth_for(platform);
            let endpoints = match platform {
                Platform::Twitter => TWITTER_OAUTH,
                Platform::Linkedin => LINKEDIN_OAUTH,
            };
            clients.insert(
                platform,
                OAuthClient::new(
                    endpoints,
                    app.client_id.clone(),
                    app.client_secret.clone(),
                    app.redirect_uri.clone(),
                )
                .with_timeout(config.request_timeout),
            );
        }
        Self { clients }
    }

    fn client(&self, platform: Platform) -> Result<&OAuthClient, LeadScoutError> {
        self.clients
            .get(&platform)
            .filter(|c| c.is_configured())
            .ok_or_else(|| {
                LeadScoutError::Configuration(format!("OAuth is not configured for {platform}"))
            })
    }
}

#[async_trait]
impl TokenRefresher for OAuthClients {
    async fn refresh(&self, platform: Platform, refresh_token: &str) -> Result<serde_json::Value> {
        Ok(self.client(platform)?.refresh(refresh_token).await?)
    }
}

#[async_trait]
impl OAuthExchange for OAuthClients {
    fn authorize_url(&self, platform: Platform, state: &str) -> Result<String> {
        Ok(self.client(platform)?.authorize_url(state)?)
    }

    async fn exchange_code(&self, platform: Platform, code: &str) -> Result<serde_json::Value> {
        Ok(self.client(platform)?.exchange_code(code).await?)
    }
}
