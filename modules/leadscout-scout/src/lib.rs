pub mod aggregate;
pub mod backends;
pub mod bootstrap;
pub mod chain;
pub mod collaborators;
pub mod credentials;
pub mod pipeline;
pub mod resilient;
pub mod store;
pub mod strategy;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
#[cfg(feature = "test-utils")]
pub mod testutil;
pub mod traits;
pub mod usage;

#[cfg(test)]
mod chain_tests;
#[cfg(test)]
mod credentials_tests;
#[cfg(test)]
mod pipeline_tests;

pub use bootstrap::{build_services, LeadScoutServices};
pub use chain::SourceScout;
pub use credentials::CredentialStore;
pub use pipeline::{PipelineController, PipelineDeps};
pub use strategy::{Strategy, StrategyResolver};
pub use usage::{QuotaLimit, UsageTracker};
