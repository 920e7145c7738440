use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use tracing::debug;
use uuid::Uuid;

use leadscout_common::{Config, LeadScoutError, Platform};

use crate::traits::UsageRepository;

/// Endpoint name recorded for scout searches.
pub const SEARCH_ENDPOINT: &str = "search";

/// Free-tier allowance: at most `limit` calls over the trailing `window_days`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaLimit {
    pub limit: u64,
    pub window_days: u32,
}

/// Counts third-party calls per user, platform, endpoint and UTC day.
pub struct UsageTracker {
    repo: Arc<dyn UsageRepository>,
    limits: HashMap<Platform, QuotaLimit>,
}

impl UsageTracker {
    pub fn new(repo: Arc<dyn UsageRepository>) -> Self {
        Self {
            repo,
            limits: HashMap::new(),
        }
    }

    pub fn with_limit(mut self, platform: Platform, limit: QuotaLimit) -> Self {
        self.limits.insert(platform, limit);
        self
    }

    /// Twitter monthly and LinkedIn daily allowances from config.
    pub fn from_config(repo: Arc<dyn UsageRepository>, config: &Config) -> Self {
        Self::new(repo)
            .with_limit(
                Platform::Twitter,
                QuotaLimit {
                    limit: config.twitter_monthly_limit,
                    window_days: 30,
                },
            )
            .with_limit(
                Platform::Linkedin,
                QuotaLimit {
                    limit: config.linkedin_daily_limit,
                    window_days: 1,
                },
            )
    }

    pub fn limit_for(&self, platform: Platform) -> Option<QuotaLimit> {
        self.limits.get(&platform).copied()
    }

    /// Record one call against today's counter. Returns today's new count.
    pub async fn track(
        &self,
        user_id: Uuid,
        platform: Platform,
        endpoint: &str,
    ) -> Result<u64, LeadScoutError> {
        let today = Utc::now().date_naive();
        let count = self
            .repo
            .increment_usage(user_id, platform, endpoint, today)
            .await
            .map_err(|e| LeadScoutError::Storage(e.to_string()))?;
        debug!(%user_id, %platform, endpoint, count, "Tracked API call");
        Ok(count)
    }

    /// Per-endpoint totals over the trailing `window_days`, today included.
    pub async fn usage(
        &self,
        user_id: Uuid,
        platform: Platform,
        window_days: u32,
    ) -> Result<BTreeMap<String, u64>, LeadScoutError> {
        let since = window_start(Utc::now().date_naive(), window_days);
        self.repo
            .usage_since(user_id, platform, since)
            .await
            .map_err(|e| LeadScoutError::Storage(e.to_string()))
    }

    /// Advisory check against the platform's allowance. Callers log the
    /// error and carry on; nothing here blocks a call.
    pub async fn check_quota(
        &self,
        user_id: Uuid,
        platform: Platform,
        endpoint: &str,
    ) -> Result<(), LeadScoutError> {
        let Some(limit) = self.limit_for(platform) else {
            return Ok(());
        };
        let used: u64 = self
            .usage(user_id, platform, limit.window_days)
            .await?
            .values()
            .sum();
        if used >= limit.limit {
            return Err(LeadScoutError::QuotaExceeded {
                platform,
                endpoint: endpoint.to_string(),
                used,
                limit: limit.limit,
            });
        }
        Ok(())
    }
}

fn window_start(today: NaiveDate, window_days: u32) -> NaiveDate {
    today - Duration::days(i64::from(window_days.max(1)) - 1)
}
