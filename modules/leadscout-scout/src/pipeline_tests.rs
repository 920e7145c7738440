use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use leadscout_common::{
    CandidateProfile, DiscoveryRequest, LeadScoutError, SearchPlan, Source, Tier,
};

use crate::pipeline::{PipelineController, PipelineDeps};
use crate::store::MemoryStore;
use crate::strategy::StrategyResolver;
use crate::testing::{profile, FailingInterpreter, FixedInterpreter, MockMessenger, MockScout};
use crate::traits::{GoalInterpreter, LeadScout, UserRepository};

fn resolver() -> StrategyResolver {
    StrategyResolver::parse(leadscout_common::config::DEFAULT_STRATEGIES).unwrap()
}

fn request(target: i64) -> DiscoveryRequest {
    DiscoveryRequest {
        emails: vec!["jane@acme.com".into()],
        company_info: "Lumen, a voice AI startup".into(),
        goal: "find fintech founders".into(),
        target_count: target,
        user_id: None,
        user_email: None,
    }
}

fn controller(
    interpreter: Arc<dyn GoalInterpreter>,
    messenger: MockMessenger,
    scouts: Vec<Arc<dyn LeadScout>>,
    users: Arc<MemoryStore>,
) -> PipelineController {
    let deps = PipelineDeps::builder()
        .interpreter(interpreter)
        .messenger(Arc::new(messenger))
        .users(users)
        .scouts(scouts)
        .concurrency(2)
        .max_target(100)
        .collaborator_timeout(Duration::from_millis(100))
        .build();
    PipelineController::new(deps, &resolver()).unwrap()
}

fn web_plan(queries: &[&str]) -> SearchPlan {
    SearchPlan::new().with_queries(Source::Web, queries.iter().copied())
}

fn web_profiles(names: &[(&str, f64)]) -> Vec<CandidateProfile> {
    names
        .iter()
        .map(|(n, c)| profile(n, Source::Web, Tier::SharedService, *c))
        .collect()
}

#[tokio::test]
async fn invalid_requests_fail_before_any_collaborator_runs() {
    let interpreter = Arc::new(FixedInterpreter::new(SearchPlan::new()));
    let email = Arc::new(MockScout::new(Source::Email));
    let pipeline = controller(
        interpreter.clone(),
        MockMessenger::new(),
        vec![email.clone()],
        Arc::new(MemoryStore::new()),
    );

    let cases = [
        DiscoveryRequest {
            emails: vec![],
            ..request(5)
        },
        DiscoveryRequest {
            goal: "  ".into(),
            ..request(5)
        },
        DiscoveryRequest {
            company_info: String::new(),
            ..request(5)
        },
        request(0),
        request(-3),
        request(101),
    ];
    for case in cases {
        let err = pipeline.discover(case).await.unwrap_err();
        assert!(matches!(err, LeadScoutError::ClientInput(_)), "{err}");
    }
    assert_eq!(interpreter.calls(), 0);
    assert_eq!(email.calls(), 0);
}

#[tokio::test]
async fn interpreter_failure_is_terminal() {
    let email = Arc::new(MockScout::new(Source::Email));
    let pipeline = controller(
        Arc::new(FailingInterpreter),
        MockMessenger::new(),
        vec![email.clone()],
        Arc::new(MemoryStore::new()),
    );

    let err = pipeline.discover(request(5)).await.unwrap_err();
    assert!(matches!(err, LeadScoutError::CollaboratorUnavailable(_)));
    assert_eq!(email.calls(), 0);
}

#[tokio::test]
async fn stalled_interpreter_is_terminal() {
    let email = Arc::new(MockScout::new(Source::Email));
    let pipeline = controller(
        Arc::new(FixedInterpreter::new(web_plan(&["fintech"])).with_delay(Duration::from_secs(3600))),
        MockMessenger::new(),
        vec![email.clone()],
        Arc::new(MemoryStore::new()),
    );

    let err = tokio::time::timeout(Duration::from_secs(3), pipeline.discover(request(5)))
        .await
        .expect("discover should give up on the interpreter")
        .unwrap_err();
    assert!(matches!(err, LeadScoutError::CollaboratorUnavailable(_)));
    assert_eq!(email.calls(), 0);
}

#[tokio::test]
async fn one_failing_scout_becomes_a_warning() {
    let email = Arc::new(MockScout::new(Source::Email).failing_on("jane@acme.com"));
    let web = Arc::new(
        MockScout::new(Source::Web)
            .on_query("fintech", web_profiles(&[("A", 0.5), ("B", 0.4)]))
            .on_query("payments", web_profiles(&[("C", 0.3)])),
    );
    let pipeline = controller(
        Arc::new(FixedInterpreter::new(web_plan(&["fintech", "payments"]))),
        MockMessenger::new(),
        vec![email, web],
        Arc::new(MemoryStore::new()),
    );

    let result = pipeline.discover(request(10)).await.unwrap();

    assert_eq!(result.returned, 3);
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("jane@acme.com"));
}

#[tokio::test]
async fn panicking_scout_is_isolated() {
    let web = Arc::new(
        MockScout::new(Source::Web)
            .panicking_on("boom")
            .on_query("fintech", web_profiles(&[("A", 0.5)])),
    );
    let pipeline = controller(
        Arc::new(FixedInterpreter::new(web_plan(&["boom", "fintech"]))),
        MockMessenger::new(),
        vec![Arc::new(MockScout::new(Source::Email)), web],
        Arc::new(MemoryStore::new()),
    );

    let result = pipeline.discover(request(10)).await.unwrap();

    assert_eq!(result.returned, 1);
    assert!(result.warnings.iter().any(|w| w.contains("boom")));
}

#[tokio::test]
async fn no_profiles_is_an_empty_success() {
    let pipeline = controller(
        Arc::new(FixedInterpreter::new(web_plan(&["nothing"]))),
        MockMessenger::new(),
        vec![
            Arc::new(MockScout::new(Source::Email)),
            Arc::new(MockScout::new(Source::Web)),
        ],
        Arc::new(MemoryStore::new()),
    );

    let result = pipeline.discover(request(5)).await.unwrap();

    assert!(result.profiles.is_empty());
    assert_eq!(result.total_found, 0);
    assert_eq!(result.returned, 0);
}

#[tokio::test]
async fn queries_for_unregistered_sources_become_warnings() {
    let plan = SearchPlan::new().with_queries(Source::Linkedin, ["fintech CFO"]);
    let pipeline = controller(
        Arc::new(FixedInterpreter::new(plan)),
        MockMessenger::new(),
        vec![Arc::new(MockScout::new(Source::Email))],
        Arc::new(MemoryStore::new()),
    );

    let result = pipeline.discover(request(5)).await.unwrap();

    assert!(result
        .warnings
        .iter()
        .any(|w| w.contains("linkedin") && w.contains("fintech CFO")));
}

#[tokio::test]
async fn results_are_deduplicated_ranked_and_truncated() {
    let names: Vec<(String, f64)> = (0..10).map(|i| (format!("P{i}"), i as f64 / 10.0)).collect();
    let mut profiles: Vec<CandidateProfile> = names
        .iter()
        .map(|(n, c)| profile(n, Source::Web, Tier::SharedService, *c))
        .collect();
    // Same person again from another query.
    profiles.push(profile("p9", Source::Web, Tier::SharedService, 0.95));

    let web = Arc::new(MockScout::new(Source::Web).on_query("fintech", profiles));
    let pipeline = controller(
        Arc::new(FixedInterpreter::new(web_plan(&["fintech"]))),
        MockMessenger::new(),
        vec![Arc::new(MockScout::new(Source::Email)), web],
        Arc::new(MemoryStore::new()),
    );

    let result = pipeline.discover(request(4)).await.unwrap();

    assert_eq!(result.total_found, 10);
    assert_eq!(result.returned, 4);
    let names: Vec<_> = result.profiles.iter().map(|p| p.profile.name.as_str()).collect();
    assert_eq!(names, vec!["P9", "P8", "P7", "P6"]);
    assert!(result
        .profiles
        .windows(2)
        .all(|w| w[0].profile.confidence >= w[1].profile.confidence));
}

#[tokio::test]
async fn failed_message_uses_template_and_warns() {
    let web = Arc::new(
        MockScout::new(Source::Web).on_query("fintech", web_profiles(&[("Ann", 0.9), ("Bob", 0.8)])),
    );
    let pipeline = controller(
        Arc::new(FixedInterpreter::new(web_plan(&["fintech"]))),
        MockMessenger::new().failing_for("Bob"),
        vec![Arc::new(MockScout::new(Source::Email)), web],
        Arc::new(MemoryStore::new()),
    );

    let result = pipeline.discover(request(5)).await.unwrap();

    assert_eq!(result.profiles[0].message, "Hello Ann");
    assert!(result.profiles[1].message.starts_with("Hi Bob"));
    assert!(!result.profiles[1].message.is_empty());
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("Bob"));
}

#[tokio::test]
async fn stalled_message_uses_template_and_warns() {
    let web = Arc::new(
        MockScout::new(Source::Web).on_query("fintech", web_profiles(&[("Ann", 0.9), ("Bob", 0.8)])),
    );
    let pipeline = controller(
        Arc::new(FixedInterpreter::new(web_plan(&["fintech"]))),
        MockMessenger::new().stalling_for("Bob"),
        vec![Arc::new(MockScout::new(Source::Email)), web],
        Arc::new(MemoryStore::new()),
    );

    let result = tokio::time::timeout(Duration::from_secs(3), pipeline.discover(request(5)))
        .await
        .expect("discover should not wait on a stalled message")
        .unwrap();

    assert_eq!(result.profiles[0].message, "Hello Ann");
    assert!(result.profiles[1].message.starts_with("Hi Bob"));
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("timed out"));
}

#[tokio::test]
async fn user_email_creates_the_user_implicitly() {
    let users = Arc::new(MemoryStore::new());
    let pipeline = controller(
        Arc::new(FixedInterpreter::new(SearchPlan::new())),
        MockMessenger::new(),
        vec![Arc::new(MockScout::new(Source::Email))],
        users.clone(),
    );

    let first = pipeline
        .discover(DiscoveryRequest {
            user_email: Some("owner@lumen.ai".into()),
            ..request(5)
        })
        .await
        .unwrap();
    let second = pipeline
        .discover(DiscoveryRequest {
            user_email: Some("owner@lumen.ai".into()),
            ..request(5)
        })
        .await
        .unwrap();

    let user_id = first.user_id.unwrap();
    assert_eq!(second.user_id, Some(user_id));
    assert_eq!(
        users.find_user(user_id).await.unwrap().unwrap().email,
        "owner@lumen.ai"
    );
}

#[tokio::test]
async fn explicit_user_id_is_passed_through() {
    let pipeline = controller(
        Arc::new(FixedInterpreter::new(SearchPlan::new())),
        MockMessenger::new(),
        vec![Arc::new(MockScout::new(Source::Email))],
        Arc::new(MemoryStore::new()),
    );
    let id = Uuid::new_v4();

    let result = pipeline
        .discover(DiscoveryRequest {
            user_id: Some(id),
            user_email: Some("ignored@lumen.ai".into()),
            ..request(5)
        })
        .await
        .unwrap();
    assert_eq!(result.user_id, Some(id));
}

#[test]
fn scouts_without_a_strategy_are_rejected_at_startup() {
    let deps = PipelineDeps::builder()
        .interpreter(Arc::new(FixedInterpreter::new(SearchPlan::new())))
        .messenger(Arc::new(MockMessenger::new()))
        .users(Arc::new(MemoryStore::new()))
        .scouts(vec![Arc::new(MockScout::new(Source::Web))])
        .build();
    let err = PipelineController::new(deps, &StrategyResolver::parse("email=shared").unwrap())
        .err()
        .unwrap();
    assert!(matches!(err, LeadScoutError::Configuration(_)));
}
