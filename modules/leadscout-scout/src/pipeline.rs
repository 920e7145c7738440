use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use tracing::{info, warn};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use leadscout_common::{
    CandidateProfile, DiscoveryRequest, DiscoveryResult, EnrichedProfile, LeadScoutError,
    SearchPlan, Source,
};

use crate::aggregate::aggregate;
use crate::collaborators::fallback_message;
use crate::strategy::StrategyResolver;
use crate::traits::{GoalInterpreter, LeadScout, MessageGenerator, UserRepository};

/// Everything the controller depends on.
#[derive(TypedBuilder)]
pub struct PipelineDeps {
    pub interpreter: Arc<dyn GoalInterpreter>,
    pub messenger: Arc<dyn MessageGenerator>,
    pub users: Arc<dyn UserRepository>,
    pub scouts: Vec<Arc<dyn LeadScout>>,
    /// Scout searches in flight at once.
    #[builder(default = 4)]
    pub concurrency: usize,
    #[builder(default = 100)]
    pub max_target: u32,
    /// Upper bound on one interpret or generate call.
    #[builder(default = Duration::from_secs(60))]
    pub collaborator_timeout: Duration,
}

/// Orchestrates one discovery request: validate, plan, fan out, aggregate,
/// enrich.
pub struct PipelineController {
    interpreter: Arc<dyn GoalInterpreter>,
    messenger: Arc<dyn MessageGenerator>,
    users: Arc<dyn UserRepository>,
    scouts: HashMap<Source, Arc<dyn LeadScout>>,
    concurrency: usize,
    max_target: u32,
    collaborator_timeout: Duration,
}

struct ScoutJob {
    source: Source,
    query: String,
}

impl PipelineController {
    /// Fails when a registered scout's source has no strategy, or two
    /// scouts claim the same source.
    pub fn new(deps: PipelineDeps, resolver: &StrategyResolver) -> Result<Self, LeadScoutError> {
        let mut scouts = HashMap::new();
        for scout in deps.scouts {
            let source = scout.source();
            resolver.resolve(source)?;
            if scouts.insert(source, scout).is_some() {
                return Err(LeadScoutError::Configuration(format!(
                    "more than one scout registered for '{source}'"
                )));
            }
        }
        Ok(Self {
            interpreter: deps.interpreter,
            messenger: deps.messenger,
            users: deps.users,
            scouts,
            concurrency: deps.concurrency.max(1),
            max_target: deps.max_target,
            collaborator_timeout: deps.collaborator_timeout,
        })
    }

    pub fn max_target(&self) -> u32 {
        self.max_target
    }

    pub async fn discover(
        &self,
        request: DiscoveryRequest,
    ) -> Result<DiscoveryResult, LeadScoutError> {
        let target = self.validate(&request)?;
        let mut warnings = Vec::new();

        let user_id = self.resolve_user(&request, &mut warnings).await;

        let plan = tokio::time::timeout(
            self.collaborator_timeout,
            self.interpreter
                .interpret(&request.goal, &request.company_info, &request.emails),
        )
        .await
        .map_err(|_| {
            LeadScoutError::CollaboratorUnavailable(format!(
                "goal interpretation timed out after {:?}",
                self.collaborator_timeout
            ))
        })?
        .map_err(|e| LeadScoutError::CollaboratorUnavailable(format!("goal interpretation: {e}")))?;
        info!(
            queries = plan.total_queries(),
            emails = request.emails.len(),
            "Search plan ready"
        );

        let found = self
            .fan_out(&request.emails, &plan, user_id, &mut warnings)
            .await;
        if found.is_empty() {
            warn!("No profiles found by any scout");
            return Ok(DiscoveryResult {
                user_id,
                warnings,
                ..DiscoveryResult::default()
            });
        }

        let mut ranked = aggregate(found);
        let total_found = ranked.len();
        ranked.truncate(target);

        let profiles = self
            .enrich(ranked, &request.goal, &request.company_info, &mut warnings)
            .await;
        info!(total_found, returned = profiles.len(), warnings = warnings.len(), "Discovery complete");

        Ok(DiscoveryResult {
            returned: profiles.len(),
            profiles,
            total_found,
            warnings,
            user_id,
        })
    }

    /// Checks run before any collaborator is called. Returns the target
    /// count as a usize.
    fn validate(&self, request: &DiscoveryRequest) -> Result<usize, LeadScoutError> {
        if request.emails.is_empty() || request.emails.iter().all(|e| e.trim().is_empty()) {
            return Err(LeadScoutError::ClientInput(
                "emails must be a non-empty list".into(),
            ));
        }
        if request.company_info.trim().is_empty() {
            return Err(LeadScoutError::ClientInput("company_info is required".into()));
        }
        if request.goal.trim().is_empty() {
            return Err(LeadScoutError::ClientInput("goal is required".into()));
        }
        if request.target_count <= 0 || request.target_count > i64::from(self.max_target) {
            return Err(LeadScoutError::ClientInput(format!(
                "target must be between 1 and {}",
                self.max_target
            )));
        }
        Ok(request.target_count as usize)
    }

    /// Explicit user id wins. Otherwise a user email creates (or finds) the
    /// user. Storage trouble degrades to an anonymous request.
    async fn resolve_user(
        &self,
        request: &DiscoveryRequest,
        warnings: &mut Vec<String>,
    ) -> Option<Uuid> {
        if let Some(id) = request.user_id {
            return Some(id);
        }
        let email = request
            .user_email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())?;
        match self.users.create_user(email).await {
            Ok(user) => {
                info!(user_id = %user.id, "Resolved user from email");
                Some(user.id)
            }
            Err(e) => {
                warn!(error = %e, "Could not create user, continuing without one");
                warnings.push(format!("Could not create user for {email}: {e}"));
                None
            }
        }
    }

    async fn fan_out(
        &self,
        emails: &[String],
        plan: &SearchPlan,
        user_id: Option<Uuid>,
        warnings: &mut Vec<String>,
    ) -> Vec<CandidateProfile> {
        let jobs: Vec<ScoutJob> = emails
            .iter()
            .map(|e| e.trim())
            .filter(|e| !e.is_empty())
            .map(|e| ScoutJob {
                source: Source::Email,
                query: e.to_string(),
            })
            .chain(plan.pairs().map(|(source, query)| ScoutJob {
                source,
                query: query.to_string(),
            }))
            .collect();

        let mut dispatched = Vec::with_capacity(jobs.len());
        for (index, job) in jobs.into_iter().enumerate() {
            match self.scouts.get(&job.source) {
                Some(scout) => dispatched.push((index, job, scout.clone())),
                None => warnings.push(format!(
                    "No scout registered for {}, skipped query '{}'",
                    job.source, job.query
                )),
            }
        }

        let searches: Vec<_> = dispatched
            .into_iter()
            .map(|(index, job, scout)| async move {
                let outcome = AssertUnwindSafe(scout.search(&job.query, user_id))
                    .catch_unwind()
                    .await;
                (index, job, outcome)
            })
            .collect();
        let mut results: Vec<_> = stream::iter(searches)
        .buffer_unordered(self.concurrency)
        .collect()
        .await;
        results.sort_by_key(|(index, _, _)| *index);

        let mut found = Vec::new();
        for (_, job, outcome) in results {
            match outcome {
                Ok(Ok(profiles)) => found.extend(profiles),
                Ok(Err(e)) => {
                    warn!(source = %job.source, query = job.query.as_str(), error = %e, "Scout failed");
                    warnings.push(format!("{} search failed for '{}': {e}", job.source, job.query));
                }
                Err(_) => {
                    warn!(source = %job.source, query = job.query.as_str(), "Scout panicked");
                    warnings.push(format!("{} search crashed for '{}'", job.source, job.query));
                }
            }
        }
        found
    }

    async fn enrich(
        &self,
        profiles: Vec<CandidateProfile>,
        goal: &str,
        company_info: &str,
        warnings: &mut Vec<String>,
    ) -> Vec<EnrichedProfile> {
        let messages = join_all(profiles.iter().map(|profile| {
            AssertUnwindSafe(tokio::time::timeout(
                self.collaborator_timeout,
                self.messenger.generate(profile, goal, company_info),
            ))
            .catch_unwind()
        }))
        .await;

        profiles
            .into_iter()
            .zip(messages)
            .map(|(profile, outcome)| {
                let message = match outcome {
                    Ok(Ok(Ok(message))) => message,
                    Ok(Ok(Err(e))) => {
                        warnings.push(format!(
                            "Message generation failed for {}: {e}",
                            profile.name
                        ));
                        fallback_message(&profile, goal, company_info)
                    }
                    Ok(Err(_)) => {
                        warnings.push(format!(
                            "Message generation timed out for {}",
                            profile.name
                        ));
                        fallback_message(&profile, goal, company_info)
                    }
                    Err(_) => {
                        warnings.push(format!(
                            "Message generation crashed for {}",
                            profile.name
                        ));
                        fallback_message(&profile, goal, company_info)
                    }
                };
                EnrichedProfile { profile, message }
            })
            .collect()
    }
}
