use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::info;

use crate::error::LeadScoutError;
use crate::types::Platform;

/// OAuth application settings for one platform.
#[derive(Debug, Clone, Default)]
pub struct OAuthAppConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl OAuthAppConfig {
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty()
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Shared provider keys
    pub people_data_labs_api_key: String,
    pub twitter_bearer_token: String,
    pub google_cse_api_key: String,
    pub google_cse_id: String,

    // Text generation
    pub anthropic_api_key: String,
    pub text_model: String,

    // OAuth apps
    pub twitter_oauth: OAuthAppConfig,
    pub linkedin_oauth: OAuthAppConfig,

    // Persistence (in-memory when unset)
    pub database_url: Option<String>,

    // Web server
    pub api_host: String,
    pub api_port: u16,

    // Scouting
    /// `source=strategy` pairs, e.g. `email=shared,linkedin=hybrid`.
    pub strategies: String,
    pub max_retries: u32,
    pub request_timeout: Duration,
    pub retry_base_delay: Duration,
    pub scout_concurrency: usize,
    pub default_target_leads: u32,
    pub max_target_leads: u32,

    // Shared free-tier limits
    pub twitter_monthly_limit: u64,
    pub linkedin_daily_limit: u64,
}

pub const DEFAULT_STRATEGIES: &str = "email=shared,linkedin=hybrid,x=hybrid,web=shared";

impl Default for Config {
    fn default() -> Self {
        Self {
            people_data_labs_api_key: String::new(),
            twitter_bearer_token: String::new(),
            google_cse_api_key: String::new(),
            google_cse_id: String::new(),
            anthropic_api_key: String::new(),
            text_model: "claude-3-5-haiku-latest".to_string(),
            twitter_oauth: OAuthAppConfig::default(),
            linkedin_oauth: OAuthAppConfig::default(),
            database_url: None,
            api_host: "0.0.0.0".to_string(),
            api_port: 5000,
            strategies: DEFAULT_STRATEGIES.to_string(),
            max_retries: 3,
            request_timeout: Duration::from_secs(30),
            retry_base_delay: Duration::from_secs(1),
            scout_concurrency: 4,
            default_target_leads: 20,
            max_target_leads: 100,
            twitter_monthly_limit: 1500,
            linkedin_daily_limit: 50,
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env` when
    /// present). Every provider key is optional: a missing key just disables
    /// that backend's tier.
    pub fn from_env() -> Result<Self, LeadScoutError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        Ok(Self {
            people_data_labs_api_key: env_or_empty("PEOPLE_DATA_LABS_API_KEY"),
            twitter_bearer_token: env_or_empty("TWITTER_BEARER_TOKEN"),
            google_cse_api_key: env_or_empty("GOOGLE_CSE_API_KEY"),
            google_cse_id: env_or_empty("GOOGLE_CSE_ID"),
            anthropic_api_key: env_or_empty("ANTHROPIC_API_KEY"),
            text_model: env::var("TEXT_MODEL").unwrap_or(defaults.text_model),
            twitter_oauth: oauth_from_env("TWITTER"),
            linkedin_oauth: oauth_from_env("LINKEDIN"),
            database_url: env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            api_host: env::var("API_HOST").unwrap_or(defaults.api_host),
            api_port: parse_env("API_PORT", defaults.api_port)?,
            strategies: env::var("LEADSCOUT_STRATEGIES").unwrap_or(defaults.strategies),
            max_retries: parse_env("MAX_RETRIES", defaults.max_retries)?,
            request_timeout: Duration::from_secs(parse_env("REQUEST_TIMEOUT_SECS", 30u64)?),
            retry_base_delay: Duration::from_millis(parse_env("RETRY_BASE_DELAY_MS", 1000u64)?),
            scout_concurrency: parse_env("SCOUT_CONCURRENCY", defaults.scout_concurrency)?,
            default_target_leads: parse_env(
                "DEFAULT_TARGET_LEADS",
                defaults.default_target_leads,
            )?,
            max_target_leads: parse_env("MAX_TARGET_LEADS", defaults.max_target_leads)?,
            twitter_monthly_limit: parse_env(
                "TWITTER_MONTHLY_LIMIT",
                defaults.twitter_monthly_limit,
            )?,
            linkedin_daily_limit: parse_env("LINKEDIN_DAILY_LIMIT", defaults.linkedin_daily_limit)?,
        })
    }

    pub fn oauth_for(&self, platform: Platform) -> &OAuthAppConfig {
        match platform {
            Platform::Twitter => &self.twitter_oauth,
            Platform::Linkedin => &self.linkedin_oauth,
        }
    }

    /// Log which secrets are present without printing their values.
    pub fn log_redacted(&self) {
        fn set(v: &str) -> &'static str {
            if v.is_empty() {
                "unset"
            } else {
                "set"
            }
        }
        info!(
            people_data_labs = set(&self.people_data_labs_api_key),
            twitter_bearer = set(&self.twitter_bearer_token),
            google_cse = set(&self.google_cse_api_key),
            anthropic = set(&self.anthropic_api_key),
            twitter_oauth = self.twitter_oauth.is_configured(),
            linkedin_oauth = self.linkedin_oauth.is_configured(),
            database = self.database_url.is_some(),
            strategies = self.strategies.as_str(),
            "Loaded configuration"
        );
    }
}

fn env_or_empty(key: &str) -> String {
    env::var(key).unwrap_or_default()
}

fn oauth_from_env(prefix: &str) -> OAuthAppConfig {
    OAuthAppConfig {
        client_id: env_or_empty(&format!("{prefix}_CLIENT_ID")),
        client_secret: env_or_empty(&format!("{prefix}_CLIENT_SECRET")),
        redirect_uri: env_or_empty(&format!("{prefix}_REDIRECT_URI")),
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> Result<T, LeadScoutError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|_| {
            LeadScoutError::Configuration(format!("{key} must be a valid number, got '{raw}'"))
        }),
        _ => Ok(default),
    }
}
