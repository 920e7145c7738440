#![cfg(feature = "test-utils")]

// Postgres repository tests.
//
// Requirements: Docker (for Postgres via testcontainers)
//
// Run with: cargo test -p leadscout-scout --features test-utils --test pg_store_test

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use leadscout_common::{Credential, Platform};
use leadscout_scout::store::PgStore;
use leadscout_scout::testutil::postgres_container;
use leadscout_scout::traits::{CredentialRepository, UsageRepository, UserRepository};
use leadscout_scout::UsageTracker;

async fn setup() -> (impl std::any::Any, PgStore) {
    postgres_container().await
}

#[tokio::test]
async fn users_are_unique_by_email() {
    let (_container, store) = setup().await;

    let a = store.create_user("ada@example.com").await.unwrap();
    let b = store.create_user("ada@example.com").await.unwrap();
    assert_eq!(a.id, b.id);
    assert_eq!(store.find_user(a.id).await.unwrap().unwrap().email, "ada@example.com");
    assert!(store.find_user(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn credentials_upsert_per_user_and_platform() {
    let (_container, store) = setup().await;
    let user = Uuid::new_v4();
    let now = Utc::now();

    let first = Credential::from_token_payload(
        user,
        Platform::Linkedin,
        json!({"access_token": "one", "refresh_token": "r1", "expires_in": 60}),
        now,
    );
    store.upsert_credential(&first).await.unwrap();
    let second = Credential::from_token_payload(
        user,
        Platform::Linkedin,
        json!({"access_token": "two"}),
        now,
    );
    store.upsert_credential(&second).await.unwrap();

    let found = store
        .find_credential(user, Platform::Linkedin)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.access_token, "two");
    assert_eq!(found.refresh_token, None);
    assert_eq!(found.payload, json!({"access_token": "two"}));
    assert!(store
        .find_credential(user, Platform::Twitter)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn usage_counts_accumulate_per_day() {
    let (_container, store) = setup().await;
    let store = Arc::new(store);
    let user = Uuid::new_v4();
    let today = Utc::now().date_naive();

    store
        .increment_usage(user, Platform::Twitter, "search", today - Duration::days(40))
        .await
        .unwrap();
    let tracker = UsageTracker::new(store.clone());
    for _ in 0..3 {
        tracker.track(user, Platform::Twitter, "search").await.unwrap();
    }

    let month = tracker.usage(user, Platform::Twitter, 30).await.unwrap();
    assert_eq!(month.get("search"), Some(&3));
    let all = store
        .usage_since(user, Platform::Twitter, today - Duration::days(60))
        .await
        .unwrap();
    assert_eq!(all.get("search"), Some(&4));
}
