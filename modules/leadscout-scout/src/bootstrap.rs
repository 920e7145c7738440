use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use leadscout_common::{Config, Source};
use provider_client::{
    ClaudeClient, GoogleSearchClient, LinkedInClient, PeopleDataLabsClient, TwitterClient,
};

use crate::backends::{
    LinkedInMemberBackend, LinkedInSiteSearchBackend, PeopleDataLabsBackend, TwitterBackend,
    WebSearchBackend,
};
use crate::chain::SourceScout;
use crate::collaborators::{
    ClaudeGoalInterpreter, ClaudeMessageGenerator, KeywordPlanner, TemplateMessages,
};
use crate::credentials::{CredentialStore, OAuthClients};
use crate::pipeline::{PipelineController, PipelineDeps};
use crate::resilient::RetryPolicy;
use crate::store::{PgStore, Repositories};
use crate::strategy::StrategyResolver;
use crate::traits::{GoalInterpreter, LeadScout, MessageGenerator, OAuthExchange};
use crate::usage::UsageTracker;

/// Long-lived services shared by every request.
pub struct LeadScoutServices {
    pub repositories: Repositories,
    pub credentials: Arc<CredentialStore>,
    pub usage: Arc<UsageTracker>,
    pub oauth: Arc<dyn OAuthExchange>,
    pub pipeline: Arc<PipelineController>,
    pub default_target: u32,
    pg: Option<PgStore>,
}

impl LeadScoutServices {
    /// Close database connections.
    pub async fn shutdown(&self) {
        if let Some(pg) = &self.pg {
            pg.close().await;
            info!("Postgres pool closed");
        }
    }
}

/// Build every service from config. Strategy problems surface here, before
/// the server accepts requests.
pub async fn build_services(config: &Config) -> Result<LeadScoutServices> {
    let resolver = Arc::new(StrategyResolver::parse(&config.strategies)?);
    resolver.validate(Source::ALL.iter())?;

    let (repositories, pg) = match config.database_url.as_deref() {
        Some(url) => {
            let pg = PgStore::connect(url).await?;
            pg.migrate().await?;
            (Repositories::from_store(Arc::new(pg.clone())), Some(pg))
        }
        None => {
            info!("DATABASE_URL not set, using in-memory storage");
            (Repositories::in_memory(), None)
        }
    };

    let oauth = Arc::new(OAuthClients::from_config(config));
    let credentials = Arc::new(
        CredentialStore::new(repositories.credentials.clone(), oauth.clone())
            .with_refresh_timeout(config.request_timeout),
    );
    let usage = Arc::new(UsageTracker::from_config(
        repositories.usage.clone(),
        config,
    ));

    let scouts = build_scouts(config, &resolver, &credentials, &usage);

    let (interpreter, messenger): (Arc<dyn GoalInterpreter>, Arc<dyn MessageGenerator>) =
        if config.anthropic_api_key.is_empty() {
            info!("ANTHROPIC_API_KEY not set, using keyword plans and template messages");
            (Arc::new(KeywordPlanner), Arc::new(TemplateMessages))
        } else {
            let client = ClaudeClient::new(&config.anthropic_api_key, &config.text_model)
                .with_timeout(config.request_timeout);
            (
                Arc::new(ClaudeGoalInterpreter::new(client.clone())),
                Arc::new(ClaudeMessageGenerator::new(client)),
            )
        };

    let deps = PipelineDeps::builder()
        .interpreter(interpreter)
        .messenger(messenger)
        .users(repositories.users.clone())
        .scouts(scouts)
        .concurrency(config.scout_concurrency)
        .max_target(config.max_target_leads)
        // Outlasts the HTTP timeout so the Claude collaborators get to fall
        // back on their own first.
        .collaborator_timeout(config.request_timeout * 2)
        .build();
    let pipeline = Arc::new(PipelineController::new(deps, &resolver)?);

    Ok(LeadScoutServices {
        repositories,
        credentials,
        usage,
        oauth,
        pipeline,
        default_target: config.default_target_leads,
        pg,
    })
}

/// One `SourceScout` per source. Backends whose keys are missing still
/// exist; their calls fail fast as not configured and the chain falls
/// through.
fn build_scouts(
    config: &Config,
    resolver: &Arc<StrategyResolver>,
    credentials: &Arc<CredentialStore>,
    usage: &Arc<UsageTracker>,
) -> Vec<Arc<dyn LeadScout>> {
    let retry = RetryPolicy::from_config(config);
    let timeout = config.request_timeout;
    let google = Arc::new(
        GoogleSearchClient::new(config.google_cse_api_key.clone(), config.google_cse_id.clone())
            .with_timeout(timeout),
    );
    let twitter = Arc::new(TwitterClient::new().with_timeout(timeout));

    let scout = |source: Source| {
        SourceScout::builder()
            .source(source)
            .resolver(resolver.clone())
            .credentials(credentials.clone())
            .usage(usage.clone())
            .retry(retry)
    };

    let email = scout(Source::Email)
        .shared(Arc::new(PeopleDataLabsBackend::new(
            PeopleDataLabsClient::new(config.people_data_labs_api_key.clone()).with_timeout(timeout),
        )))
        .build();
    let linkedin = scout(Source::Linkedin)
        .authenticated(Arc::new(LinkedInMemberBackend::new(
            LinkedInClient::new().with_timeout(timeout),
        )))
        .shared(Arc::new(LinkedInSiteSearchBackend::new(google.clone())))
        .build();
    let x = scout(Source::X)
        .authenticated(Arc::new(TwitterBackend::authenticated(twitter.clone())))
        .shared(Arc::new(TwitterBackend::shared(
            twitter,
            config.twitter_bearer_token.clone(),
        )))
        .build();
    let web = scout(Source::Web)
        .shared(Arc::new(WebSearchBackend::new(google)))
        .build();

    [email, linkedin, x, web]
        .into_iter()
        .map(|s| Arc::new(s) as Arc<dyn LeadScout>)
        .collect()
}
