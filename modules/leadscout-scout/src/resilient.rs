use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use leadscout_common::Config;
use provider_client::ProviderError;

/// Attempt budget, backoff and per-attempt timeout for one outbound call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            attempt_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            base_delay: config.retry_base_delay,
            attempt_timeout: config.request_timeout,
            ..Self::default()
        }
    }

    /// `base * 2^attempt` capped at `max_delay`, or the server's Retry-After
    /// hint when it gave one (also capped).
    pub fn backoff(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let delay = match retry_after {
            Some(hint) => hint,
            None => self
                .base_delay
                .saturating_mul(2u32.saturating_pow(attempt)),
        };
        delay.min(self.max_delay)
    }
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Retry,
    Abort,
}

/// Rate limits, timeouts, network faults and 5xx are transient. Rejected
/// credentials, other 4xx and undecodable bodies are not.
pub fn classify(err: &ProviderError) -> Disposition {
    match err {
        ProviderError::RateLimited { .. } | ProviderError::Timeout | ProviderError::Network(_) => {
            Disposition::Retry
        }
        e if e.is_server_error() => Disposition::Retry,
        ProviderError::Unauthorized { .. }
        | ProviderError::Api { .. }
        | ProviderError::Parse(_)
        | ProviderError::NotConfigured(_) => Disposition::Abort,
    }
}

/// Result of a retried call. Callers treat anything but `Success` as
/// "this tier produced nothing".
#[derive(Debug)]
pub enum CallOutcome<T> {
    Success(T),
    /// Every attempt failed with a retryable error.
    Exhausted {
        attempts: u32,
        last_error: ProviderError,
    },
    /// A non-retryable error stopped the call early.
    Aborted(ProviderError),
}

impl<T> CallOutcome<T> {
    pub fn into_success(self) -> Option<T> {
        match self {
            CallOutcome::Success(v) => Some(v),
            CallOutcome::Exhausted { .. } | CallOutcome::Aborted(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Success(_))
    }
}

/// Run `op` until it succeeds, hits a non-retryable error, or uses up the
/// attempt budget. Each attempt is bounded by `policy.attempt_timeout`.
pub async fn call_with_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> CallOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut last_error = ProviderError::Timeout;

    for attempt in 0..attempts {
        let result = match tokio::time::timeout(policy.attempt_timeout, op()).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout),
        };

        let err = match result {
            Ok(value) => return CallOutcome::Success(value),
            Err(err) => err,
        };

        if classify(&err) == Disposition::Abort {
            warn!(provider = label, attempt = attempt + 1, error = %err, "Non-retryable provider error");
            return CallOutcome::Aborted(err);
        }

        if attempt + 1 < attempts {
            let hint = match &err {
                ProviderError::RateLimited {
                    retry_after_secs: Some(secs),
                } => Some(Duration::from_secs(*secs)),
                _ => None,
            };
            let backoff = policy.backoff(attempt, hint);
            let jitter_cap = (policy.base_delay.as_millis() / 4) as u64;
            let jitter = Duration::from_millis(rand::rng().random_range(0..=jitter_cap));
            warn!(
                provider = label,
                attempt = attempt + 1,
                backoff_ms = backoff.as_millis() as u64,
                error = %err,
                "Provider call failed, retrying after backoff"
            );
            tokio::time::sleep(backoff + jitter).await;
        }
        last_error = err;
    }

    warn!(provider = label, attempts, error = %last_error, "Provider call exhausted retries");
    CallOutcome::Exhausted {
        attempts,
        last_error,
    }
}
