use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use leadscout_common::{LeadScoutError, Platform};

use crate::credentials::CredentialStore;
use crate::store::MemoryStore;
use crate::testing::{credential, MockRefresher};
use crate::traits::CredentialRepository;

async fn seed_expired(store: &MemoryStore, user: Uuid, refresh_token: Option<&str>) {
    store
        .upsert_credential(&credential(
            user,
            Platform::Linkedin,
            "stale-token",
            refresh_token,
            Some(Utc::now() - Duration::minutes(1)),
        ))
        .await
        .unwrap();
}

#[tokio::test]
async fn store_then_get_returns_the_same_token() {
    let store = Arc::new(MemoryStore::new());
    let creds = CredentialStore::new(store.clone(), Arc::new(MockRefresher::failing()));
    let user = Uuid::new_v4();

    creds
        .store(user, Platform::Twitter, json!({"access_token": "t1", "expires_in": 3600}))
        .await
        .unwrap();

    let got = creds.get(user, Platform::Twitter).await.unwrap().unwrap();
    assert_eq!(got.access_token, "t1");
    assert!(creds.get(user, Platform::Linkedin).await.unwrap().is_none());
}

#[tokio::test]
async fn storing_without_access_token_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let creds = CredentialStore::new(store.clone(), Arc::new(MockRefresher::failing()));
    let user = Uuid::new_v4();

    let err = creds
        .store(user, Platform::Twitter, json!({"error": "denied"}))
        .await
        .unwrap_err();
    assert!(matches!(err, LeadScoutError::CredentialUnusable { .. }));
    assert!(store
        .find_credential(user, Platform::Twitter)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn failed_refresh_returns_none_and_keeps_the_row() {
    let store = Arc::new(MemoryStore::new());
    let refresher = Arc::new(MockRefresher::failing());
    let creds = CredentialStore::new(store.clone(), refresher.clone());
    let user = Uuid::new_v4();
    seed_expired(&store, user, Some("r1")).await;

    assert!(creds.get(user, Platform::Linkedin).await.unwrap().is_none());

    let row = store
        .find_credential(user, Platform::Linkedin)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.access_token, "stale-token");
    assert_eq!(row.refresh_token.as_deref(), Some("r1"));

    // Nothing is cached: the next read tries again.
    assert!(creds.get(user, Platform::Linkedin).await.unwrap().is_none());
    assert_eq!(refresher.calls(), 2);
}

#[tokio::test]
async fn successful_refresh_persists_and_keeps_the_refresh_token() {
    let store = Arc::new(MemoryStore::new());
    let refresher = Arc::new(MockRefresher::succeeding(
        json!({"access_token": "fresh", "expires_in": 3600}),
    ));
    let creds = CredentialStore::new(store.clone(), refresher.clone());
    let user = Uuid::new_v4();
    seed_expired(&store, user, Some("r1")).await;

    let got = creds.get(user, Platform::Linkedin).await.unwrap().unwrap();
    assert_eq!(got.access_token, "fresh");
    assert!(got.is_usable_at(Utc::now()));

    let row = store
        .find_credential(user, Platform::Linkedin)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.access_token, "fresh");
    assert_eq!(row.refresh_token.as_deref(), Some("r1"));

    // Fresh now; no second refresh.
    creds.get(user, Platform::Linkedin).await.unwrap();
    assert_eq!(refresher.calls(), 1);
}

#[tokio::test]
async fn expired_without_refresh_token_makes_no_call() {
    let store = Arc::new(MemoryStore::new());
    let refresher = Arc::new(MockRefresher::succeeding(json!({"access_token": "x"})));
    let creds = CredentialStore::new(store.clone(), refresher.clone());
    let user = Uuid::new_v4();
    seed_expired(&store, user, None).await;

    assert!(creds.get(user, Platform::Linkedin).await.unwrap().is_none());
    assert_eq!(refresher.calls(), 0);
}

#[tokio::test]
async fn concurrent_reads_share_one_refresh() {
    let store = Arc::new(MemoryStore::new());
    let refresher = Arc::new(
        MockRefresher::succeeding(json!({"access_token": "fresh", "expires_in": 3600}))
            .with_delay(StdDuration::from_millis(50)),
    );
    let creds = Arc::new(CredentialStore::new(store.clone(), refresher.clone()));
    let user = Uuid::new_v4();
    seed_expired(&store, user, Some("r1")).await;

    let reads = (0..8).map(|_| {
        let creds = creds.clone();
        tokio::spawn(async move { creds.get(user, Platform::Linkedin).await })
    });
    let results = futures::future::join_all(reads).await;

    for result in results {
        let credential = result.unwrap().unwrap().unwrap();
        assert_eq!(credential.access_token, "fresh");
    }
    assert_eq!(refresher.calls(), 1);
}

#[tokio::test]
async fn connection_status_reports_only_usable_credentials() {
    let store = Arc::new(MemoryStore::new());
    let refresher = Arc::new(MockRefresher::failing());
    let creds = CredentialStore::new(store.clone(), refresher.clone());
    let user = Uuid::new_v4();
    seed_expired(&store, user, Some("r1")).await;
    creds
        .store(user, Platform::Twitter, json!({"access_token": "t1", "expires_in": 3600}))
        .await
        .unwrap();

    let status = creds.connection_status(user).await.unwrap();
    assert_eq!(status.get(&Platform::Linkedin), Some(&false));
    assert_eq!(status.get(&Platform::Twitter), Some(&true));
    // Agrees with get() and never refreshes.
    assert!(creds.get(user, Platform::Linkedin).await.unwrap().is_none());
    assert_eq!(refresher.calls(), 1);
}

#[tokio::test]
async fn connection_status_is_false_without_rows() {
    let creds = CredentialStore::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MockRefresher::failing()),
    );
    let status = creds.connection_status(Uuid::new_v4()).await.unwrap();
    assert!(status.values().all(|connected| !connected));
    assert_eq!(status.len(), 2);
}

#[tokio::test]
async fn storing_an_out_of_range_lifetime_keeps_the_token_without_expiry() {
    let store = Arc::new(MemoryStore::new());
    let creds = CredentialStore::new(store.clone(), Arc::new(MockRefresher::failing()));
    let user = Uuid::new_v4();

    let stored = creds
        .store(user, Platform::Twitter, json!({"access_token": "t", "expires_in": i64::MAX}))
        .await
        .unwrap();
    assert!(stored.expires_at.is_none());
    assert_eq!(
        creds.get(user, Platform::Twitter).await.unwrap().unwrap().access_token,
        "t"
    );
}

#[tokio::test]
async fn refresh_with_out_of_range_lifetime_succeeds() {
    let store = Arc::new(MemoryStore::new());
    let refresher = Arc::new(MockRefresher::succeeding(
        json!({"access_token": "fresh", "expires_in": i64::MAX}),
    ));
    let creds = CredentialStore::new(store.clone(), refresher.clone());
    let user = Uuid::new_v4();
    seed_expired(&store, user, Some("r1")).await;

    let got = creds.get(user, Platform::Linkedin).await.unwrap().unwrap();
    assert_eq!(got.access_token, "fresh");
    assert!(got.expires_at.is_none());
}

#[tokio::test]
async fn panicking_refresh_counts_as_failed_and_is_retried() {
    let store = Arc::new(MemoryStore::new());
    let refresher = Arc::new(MockRefresher::panicking());
    let creds = CredentialStore::new(store.clone(), refresher.clone());
    let user = Uuid::new_v4();
    seed_expired(&store, user, Some("r1")).await;

    assert!(creds.get(user, Platform::Linkedin).await.unwrap().is_none());
    assert!(creds.get(user, Platform::Linkedin).await.unwrap().is_none());
    // The first attempt did not leave a stuck in-flight entry behind.
    assert_eq!(refresher.calls(), 2);
    let row = store
        .find_credential(user, Platform::Linkedin)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.access_token, "stale-token");
}

#[tokio::test]
async fn stalled_refresh_times_out_as_failed() {
    let store = Arc::new(MemoryStore::new());
    let refresher = Arc::new(
        MockRefresher::succeeding(json!({"access_token": "late"}))
            .with_delay(StdDuration::from_secs(3600)),
    );
    let creds = CredentialStore::new(store.clone(), refresher.clone())
        .with_refresh_timeout(StdDuration::from_millis(50));
    let user = Uuid::new_v4();
    seed_expired(&store, user, Some("r1")).await;

    let got = tokio::time::timeout(
        StdDuration::from_secs(3),
        creds.get(user, Platform::Linkedin),
    )
    .await
    .expect("get should return once the refresh times out")
    .unwrap();
    assert!(got.is_none());
    assert_eq!(refresher.calls(), 1);
}
