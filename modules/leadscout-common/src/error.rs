use thiserror::Error;

use crate::types::Platform;

#[derive(Error, Debug)]
pub enum LeadScoutError {
    #[error("Invalid request: {0}")]
    ClientInput(String),

    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("Credential for {platform} is unusable: {reason}")]
    CredentialUnusable { platform: Platform, reason: String },

    #[error("Quota exceeded for {platform}/{endpoint}: {used} of {limit} used")]
    QuotaExceeded {
        platform: Platform,
        endpoint: String,
        used: u64,
        limit: u64,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl LeadScoutError {
    /// Whether the error ends the request before any scouting happens.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LeadScoutError::ClientInput(_)
                | LeadScoutError::CollaboratorUnavailable(_)
                | LeadScoutError::Configuration(_)
        )
    }
}
