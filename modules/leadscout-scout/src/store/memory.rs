use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use leadscout_common::{Credential, Platform, User};

use crate::traits::{CredentialRepository, UsageRepository, UserRepository};

type UsageKey = (Uuid, Platform, String, NaiveDate);

/// Process-local store used when no database is configured. Contents are lost
/// on restart.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
    credentials: Mutex<HashMap<(Uuid, Platform), Credential>>,
    usage: Mutex<HashMap<UsageKey, u64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, email: &str) -> Result<User> {
        let mut users = self.users.lock().await;
        if let Some(existing) = users.iter().find(|u| u.email == email) {
            return Ok(existing.clone());
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.lock().await.iter().find(|u| u.id == id).cloned())
    }
}

#[async_trait]
impl CredentialRepository for MemoryStore {
    async fn upsert_credential(&self, credential: &Credential) -> Result<()> {
        self.credentials
            .lock()
            .await
            .insert((credential.user_id, credential.platform), credential.clone());
        Ok(())
    }

    async fn find_credential(
        &self,
        user_id: Uuid,
        platform: Platform,
    ) -> Result<Option<Credential>> {
        Ok(self
            .credentials
            .lock()
            .await
            .get(&(user_id, platform))
            .cloned())
    }
}

#[async_trait]
impl UsageRepository for MemoryStore {
    async fn increment_usage(
        &self,
        user_id: Uuid,
        platform: Platform,
        endpoint: &str,
        day: NaiveDate,
    ) -> Result<u64> {
        let mut usage = self.usage.lock().await;
        let count = usage
            .entry((user_id, platform, endpoint.to_string(), day))
            .or_insert(0);
        *count += 1;
        Ok(*count)
    }

    async fn usage_since(
        &self,
        user_id: Uuid,
        platform: Platform,
        since: NaiveDate,
    ) -> Result<BTreeMap<String, u64>> {
        let usage = self.usage.lock().await;
        let mut totals = BTreeMap::new();
        for ((uid, plat, endpoint, day), count) in usage.iter() {
            if *uid == user_id && *plat == platform && *day >= since {
                *totals.entry(endpoint.clone()).or_insert(0) += count;
            }
        }
        Ok(totals)
    }
}
