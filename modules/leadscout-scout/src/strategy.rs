use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use leadscout_common::{LeadScoutError, Source, Tier};

/// Named ordering of tiers for one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Shared service first, offline stand-in last.
    Shared,
    /// The requesting user's own credential first, then shared, then offline.
    Hybrid,
}

const SHARED_TIERS: &[Tier] = &[Tier::SharedService, Tier::OfflineFallback];
const HYBRID_TIERS: &[Tier] = &[
    Tier::AuthenticatedUser,
    Tier::SharedService,
    Tier::OfflineFallback,
];

impl Strategy {
    pub fn tiers(self) -> &'static [Tier] {
        match self {
            Strategy::Shared => SHARED_TIERS,
            Strategy::Hybrid => HYBRID_TIERS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Shared => "shared",
            Strategy::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = LeadScoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "shared" => Ok(Strategy::Shared),
            "hybrid" => Ok(Strategy::Hybrid),
            other => Err(LeadScoutError::Configuration(format!(
                "unknown strategy '{other}'"
            ))),
        }
    }
}

/// Maps each source to the strategy that orders its tiers.
#[derive(Debug, Clone, Default)]
pub struct StrategyResolver {
    table: HashMap<Source, Strategy>,
}

impl StrategyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, source: Source, strategy: Strategy) -> Self {
        self.table.insert(source, strategy);
        self
    }

    /// Parse `source=strategy` pairs separated by commas, e.g.
    /// `email=shared,linkedin=hybrid`.
    pub fn parse(raw: &str) -> Result<Self, LeadScoutError> {
        let mut resolver = Self::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (source, strategy) = entry.split_once('=').ok_or_else(|| {
                LeadScoutError::Configuration(format!(
                    "strategy entry '{entry}' must look like source=strategy"
                ))
            })?;
            let source: Source = source.parse()?;
            let strategy: Strategy = strategy.parse()?;
            if resolver.table.insert(source, strategy).is_some() {
                return Err(LeadScoutError::Configuration(format!(
                    "strategy for '{source}' is configured twice"
                )));
            }
        }
        Ok(resolver)
    }

    /// Ordered tiers for a source. Unknown sources are a configuration error.
    pub fn resolve(&self, source: Source) -> Result<&'static [Tier], LeadScoutError> {
        self.table
            .get(&source)
            .map(|s| s.tiers())
            .ok_or_else(|| {
                LeadScoutError::Configuration(format!("no strategy configured for source '{source}'"))
            })
    }

    pub fn strategy(&self, source: Source) -> Option<Strategy> {
        self.table.get(&source).copied()
    }

    /// Fail fast when any of `sources` has no strategy.
    pub fn validate<'a>(
        &self,
        sources: impl IntoIterator<Item = &'a Source>,
    ) -> Result<(), LeadScoutError> {
        for source in sources {
            self.resolve(*source)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadscout_common::config::DEFAULT_STRATEGIES;

    #[test]
    fn default_table_covers_every_source() {
        let resolver = StrategyResolver::parse(DEFAULT_STRATEGIES).unwrap();
        assert!(resolver.validate(Source::ALL.iter()).is_ok());
        assert_eq!(resolver.strategy(Source::Email), Some(Strategy::Shared));
        assert_eq!(resolver.strategy(Source::X), Some(Strategy::Hybrid));
    }

    #[test]
    fn hybrid_puts_the_user_tier_first() {
        let resolver = StrategyResolver::new().with(Source::Linkedin, Strategy::Hybrid);
        assert_eq!(
            resolver.resolve(Source::Linkedin).unwrap(),
            &[
                Tier::AuthenticatedUser,
                Tier::SharedService,
                Tier::OfflineFallback
            ]
        );
    }

    #[test]
    fn shared_never_uses_user_credentials() {
        let tiers = Strategy::Shared.tiers();
        assert!(!tiers.contains(&Tier::AuthenticatedUser));
        assert_eq!(tiers.last(), Some(&Tier::OfflineFallback));
    }

    #[test]
    fn unresolved_source_is_a_configuration_error() {
        let resolver = StrategyResolver::parse("email=shared").unwrap();
        let err = resolver.resolve(Source::Web).unwrap_err();
        assert!(matches!(err, LeadScoutError::Configuration(_)));
    }

    #[test]
    fn malformed_entries_are_rejected() {
        assert!(StrategyResolver::parse("email").is_err());
        assert!(StrategyResolver::parse("email=turbo").is_err());
        assert!(StrategyResolver::parse("myspace=shared").is_err());
        assert!(StrategyResolver::parse("email=shared,email=hybrid").is_err());
    }
}
