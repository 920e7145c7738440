use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProviderError>;

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Not authorized (status {status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(&'static str),
}

impl ProviderError {
    /// Map a non-success HTTP status onto the error taxonomy.
    pub fn from_status(status: u16, message: String, retry_after_secs: Option<u64>) -> Self {
        match status {
            429 => ProviderError::RateLimited { retry_after_secs },
            401 | 403 => ProviderError::Unauthorized { status, message },
            _ => ProviderError::Api { status, message },
        }
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self, ProviderError::Api { status, .. } if *status >= 500)
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::Parse(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(err.to_string())
    }
}
