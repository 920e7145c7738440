use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use leadscout_common::{Platform, Source, Tier};
use provider_client::ProviderError;

use crate::chain::SourceScout;
use crate::credentials::CredentialStore;
use crate::store::MemoryStore;
use crate::strategy::{Strategy, StrategyResolver};
use crate::testing::{credential, fast_retry, profile, MockBackend, MockRefresher};
use crate::traits::{CredentialRepository, LeadScout};
use crate::usage::{UsageTracker, SEARCH_ENDPOINT};

struct Harness {
    store: Arc<MemoryStore>,
    usage: Arc<UsageTracker>,
    scout: SourceScout,
    user_backend: Arc<MockBackend>,
    shared_backend: Arc<MockBackend>,
}

fn harness(strategy: Strategy, user_backend: MockBackend, shared_backend: MockBackend) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let credentials = Arc::new(CredentialStore::new(
        store.clone(),
        Arc::new(MockRefresher::failing()),
    ));
    let usage = Arc::new(UsageTracker::new(store.clone()));
    let resolver = Arc::new(StrategyResolver::new().with(Source::X, strategy));
    let user_backend = Arc::new(user_backend);
    let shared_backend = Arc::new(shared_backend);

    let scout = SourceScout::builder()
        .source(Source::X)
        .resolver(resolver)
        .credentials(credentials)
        .usage(usage.clone())
        .retry(fast_retry())
        .authenticated(user_backend.clone())
        .shared(shared_backend.clone())
        .build();

    Harness {
        store,
        usage,
        scout,
        user_backend,
        shared_backend,
    }
}

async fn connect(store: &MemoryStore, user_id: Uuid) {
    store
        .upsert_credential(&credential(user_id, Platform::Twitter, "user-token", None, None))
        .await
        .unwrap();
}

#[tokio::test]
async fn user_tier_short_circuits_the_chain() {
    let h = harness(
        Strategy::Hybrid,
        MockBackend::returning(vec![profile("Jane", Source::X, Tier::AuthenticatedUser, 0.8)]),
        MockBackend::returning(vec![profile("Shared", Source::X, Tier::SharedService, 0.6)]),
    );
    let user = Uuid::new_v4();
    connect(&h.store, user).await;

    let profiles = h.scout.search("fintech founders", Some(user)).await.unwrap();

    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].name, "Jane");
    assert_eq!(h.shared_backend.calls(), 0, "shared tier must not run");
    assert_eq!(h.user_backend.tokens_seen(), vec![Some("user-token".to_string())]);
}

#[tokio::test]
async fn user_tier_records_usage() {
    let h = harness(
        Strategy::Hybrid,
        MockBackend::returning(vec![profile("Jane", Source::X, Tier::AuthenticatedUser, 0.8)]),
        MockBackend::returning(vec![]),
    );
    let user = Uuid::new_v4();
    connect(&h.store, user).await;

    h.scout.search("a", Some(user)).await.unwrap();
    h.scout.search("b", Some(user)).await.unwrap();

    let usage = h.usage.usage(user, Platform::Twitter, 1).await.unwrap();
    assert_eq!(usage.get(SEARCH_ENDPOINT), Some(&2));
}

#[tokio::test]
async fn anonymous_requests_skip_the_user_tier() {
    let h = harness(
        Strategy::Hybrid,
        MockBackend::returning(vec![profile("Jane", Source::X, Tier::AuthenticatedUser, 0.8)]),
        MockBackend::returning(vec![profile("Shared", Source::X, Tier::SharedService, 0.6)]),
    );

    let profiles = h.scout.search("fintech founders", None).await.unwrap();

    assert_eq!(h.user_backend.calls(), 0);
    assert_eq!(profiles[0].name, "Shared");
}

#[tokio::test]
async fn missing_credential_skips_the_user_tier() {
    let h = harness(
        Strategy::Hybrid,
        MockBackend::returning(vec![profile("Jane", Source::X, Tier::AuthenticatedUser, 0.8)]),
        MockBackend::returning(vec![profile("Shared", Source::X, Tier::SharedService, 0.6)]),
    );

    let profiles = h
        .scout
        .search("fintech founders", Some(Uuid::new_v4()))
        .await
        .unwrap();

    assert_eq!(h.user_backend.calls(), 0);
    assert!(profiles.iter().all(|p| p.is_from_tier(Tier::SharedService)));
}

#[tokio::test]
async fn expired_credential_with_failed_refresh_falls_to_shared() {
    let h = harness(
        Strategy::Hybrid,
        MockBackend::returning(vec![profile("Jane", Source::X, Tier::AuthenticatedUser, 0.8)]),
        MockBackend::returning(vec![profile("Shared", Source::X, Tier::SharedService, 0.6)]),
    );
    let user = Uuid::new_v4();
    h.store
        .upsert_credential(&credential(
            user,
            Platform::Twitter,
            "stale",
            Some("refresh-me"),
            Some(Utc::now() - Duration::minutes(5)),
        ))
        .await
        .unwrap();

    let profiles = h.scout.search("q", Some(user)).await.unwrap();

    assert_eq!(h.user_backend.calls(), 0);
    assert_eq!(profiles[0].name, "Shared");
}

#[tokio::test]
async fn stalled_token_refresh_does_not_hold_up_the_chain() {
    let store = Arc::new(MemoryStore::new());
    let refresher = Arc::new(
        MockRefresher::succeeding(serde_json::json!({"access_token": "late"}))
            .with_delay(std::time::Duration::from_secs(3600)),
    );
    let credentials = Arc::new(
        CredentialStore::new(store.clone(), refresher.clone())
            .with_refresh_timeout(std::time::Duration::from_millis(50)),
    );
    let user_backend = Arc::new(MockBackend::returning(vec![profile(
        "Jane",
        Source::X,
        Tier::AuthenticatedUser,
        0.8,
    )]));
    let shared_backend = Arc::new(MockBackend::returning(vec![profile(
        "Shared",
        Source::X,
        Tier::SharedService,
        0.6,
    )]));
    let scout = SourceScout::builder()
        .source(Source::X)
        .resolver(Arc::new(StrategyResolver::new().with(Source::X, Strategy::Hybrid)))
        .credentials(credentials)
        .usage(Arc::new(UsageTracker::new(store.clone())))
        .retry(fast_retry())
        .authenticated(user_backend.clone())
        .shared(shared_backend.clone())
        .build();
    let user = Uuid::new_v4();
    store
        .upsert_credential(&credential(
            user,
            Platform::Twitter,
            "stale",
            Some("refresh-me"),
            Some(Utc::now() - Duration::minutes(5)),
        ))
        .await
        .unwrap();

    let profiles = tokio::time::timeout(
        std::time::Duration::from_secs(3),
        scout.search("q", Some(user)),
    )
    .await
    .expect("search should finish once the refresh times out")
    .unwrap();

    assert_eq!(refresher.calls(), 1);
    assert_eq!(user_backend.calls(), 0);
    assert_eq!(shared_backend.calls(), 1);
    assert_eq!(profiles[0].name, "Shared");
}

#[tokio::test]
async fn shared_strategy_never_touches_user_credentials() {
    let h = harness(
        Strategy::Shared,
        MockBackend::returning(vec![profile("Jane", Source::X, Tier::AuthenticatedUser, 0.8)]),
        MockBackend::returning(vec![profile("Shared", Source::X, Tier::SharedService, 0.6)]),
    );
    let user = Uuid::new_v4();
    connect(&h.store, user).await;

    let profiles = h.scout.search("q", Some(user)).await.unwrap();

    assert_eq!(h.user_backend.calls(), 0);
    assert_eq!(profiles[0].name, "Shared");
}

#[tokio::test]
async fn rejected_user_token_falls_through_without_retrying() {
    let h = harness(
        Strategy::Hybrid,
        MockBackend::failing(ProviderError::Unauthorized {
            status: 401,
            message: "revoked".into(),
        }),
        MockBackend::returning(vec![profile("Shared", Source::X, Tier::SharedService, 0.6)]),
    );
    let user = Uuid::new_v4();
    connect(&h.store, user).await;

    let profiles = h.scout.search("q", Some(user)).await.unwrap();

    assert_eq!(h.user_backend.calls(), 1);
    assert_eq!(profiles[0].name, "Shared");
}

#[tokio::test]
async fn rate_limited_shared_tier_exhausts_budget_then_goes_offline() {
    let h = harness(
        Strategy::Shared,
        MockBackend::returning(vec![]),
        MockBackend::failing(ProviderError::RateLimited {
            retry_after_secs: None,
        }),
    );

    let profiles = h.scout.search("fintech founders", None).await.unwrap();

    assert_eq!(h.shared_backend.calls(), 3);
    assert!(!profiles.is_empty());
    assert!(profiles.iter().all(|p| p.is_from_tier(Tier::OfflineFallback)));
}

#[tokio::test]
async fn transient_error_then_success_is_retried_within_the_tier() {
    let h = harness(
        Strategy::Shared,
        MockBackend::returning(vec![]),
        MockBackend::scripted(vec![
            Err(ProviderError::Timeout),
            Ok(vec![profile("Shared", Source::X, Tier::SharedService, 0.6)]),
        ]),
    );

    let profiles = h.scout.search("q", None).await.unwrap();

    assert_eq!(h.shared_backend.calls(), 2);
    assert_eq!(profiles[0].name, "Shared");
}

#[tokio::test]
async fn empty_results_fall_through_to_offline() {
    let h = harness(
        Strategy::Hybrid,
        MockBackend::returning(vec![]),
        MockBackend::returning(vec![]),
    );
    let user = Uuid::new_v4();
    connect(&h.store, user).await;

    let profiles = h.scout.search("q", Some(user)).await.unwrap();

    assert_eq!(h.user_backend.calls(), 1);
    assert_eq!(h.shared_backend.calls(), 1);
    assert!(profiles.iter().all(|p| p.is_from_tier(Tier::OfflineFallback)));
}

#[tokio::test]
async fn profiles_from_another_tier_do_not_count_as_success() {
    // A shared backend that only yields offline-tagged rows has not succeeded.
    let h = harness(
        Strategy::Shared,
        MockBackend::returning(vec![]),
        MockBackend::returning(vec![profile("Ghost", Source::X, Tier::OfflineFallback, 0.1)]),
    );

    let profiles = h.scout.search("q", None).await.unwrap();

    assert_eq!(h.shared_backend.calls(), 1);
    assert!(profiles.iter().all(|p| p.name != "Ghost"));
    assert!(profiles.iter().all(|p| p.provenance.provider == "offline_stand_in"));
}

#[tokio::test]
async fn unresolved_source_degrades_to_offline() {
    let store = Arc::new(MemoryStore::new());
    let scout = SourceScout::builder()
        .source(Source::Web)
        .resolver(Arc::new(StrategyResolver::new()))
        .credentials(Arc::new(CredentialStore::new(
            store.clone(),
            Arc::new(MockRefresher::failing()),
        )))
        .usage(Arc::new(UsageTracker::new(store)))
        .build();

    let profiles = scout.search("q", None).await.unwrap();
    assert!(profiles.iter().all(|p| p.is_from_tier(Tier::OfflineFallback)));
}
