use std::collections::BTreeMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use leadscout_common::{Credential, Platform, User};

use crate::traits::{CredentialRepository, UsageRepository, UserRepository};

/// Idempotent schema statements, applied in order by [`PgStore::migrate`].
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS credentials (
        user_id UUID NOT NULL,
        platform TEXT NOT NULL,
        access_token TEXT NOT NULL,
        refresh_token TEXT,
        expires_at TIMESTAMPTZ,
        payload JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (user_id, platform)
    )",
    "CREATE TABLE IF NOT EXISTS api_usage (
        user_id UUID NOT NULL,
        platform TEXT NOT NULL,
        endpoint TEXT NOT NULL,
        day DATE NOT NULL,
        count BIGINT NOT NULL DEFAULT 0,
        PRIMARY KEY (user_id, platform, endpoint, day)
    )",
];

/// Postgres-backed repositories.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    user_id: Uuid,
    platform: String,
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    payload: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl TryFrom<CredentialRow> for Credential {
    type Error = anyhow::Error;

    fn try_from(row: CredentialRow) -> Result<Self> {
        Ok(Credential {
            user_id: row.user_id,
            platform: row.platform.parse()?,
            access_token: row.access_token,
            refresh_token: row.refresh_token,
            expires_at: row.expires_at,
            payload: row.payload,
            created_at: row.created_at,
        })
    }
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("Failed to connect to Postgres")?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create tables if they are missing.
    pub async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Postgres schema up to date");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create_user(&self, email: &str) -> Result<User> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (id, email) VALUES ($1, $2)
             ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
             RETURNING id, email, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }
}

#[async_trait]
impl CredentialRepository for PgStore {
    async fn upsert_credential(&self, credential: &Credential) -> Result<()> {
        sqlx::query(
            "INSERT INTO credentials
                (user_id, platform, access_token, refresh_token, expires_at, payload, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (user_id, platform)
             DO UPDATE SET access_token = EXCLUDED.access_token,
                          refresh_token = EXCLUDED.refresh_token,
                          expires_at = EXCLUDED.expires_at,
                          payload = EXCLUDED.payload,
                          created_at = EXCLUDED.created_at",
        )
        .bind(credential.user_id)
        .bind(credential.platform.as_str())
        .bind(&credential.access_token)
        .bind(credential.refresh_token.as_deref())
        .bind(credential.expires_at)
        .bind(&credential.payload)
        .bind(credential.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_credential(
        &self,
        user_id: Uuid,
        platform: Platform,
    ) -> Result<Option<Credential>> {
        let row = sqlx::query_as::<_, CredentialRow>(
            "SELECT user_id, platform, access_token, refresh_token, expires_at, payload, created_at
             FROM credentials WHERE user_id = $1 AND platform = $2",
        )
        .bind(user_id)
        .bind(platform.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Credential::try_from).transpose()
    }
}

#[async_trait]
impl UsageRepository for PgStore {
    async fn increment_usage(
        &self,
        user_id: Uuid,
        platform: Platform,
        endpoint: &str,
        day: NaiveDate,
    ) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "INSERT INTO api_usage (user_id, platform, endpoint, day, count)
             VALUES ($1, $2, $3, $4, 1)
             ON CONFLICT (user_id, platform, endpoint, day)
             DO UPDATE SET count = api_usage.count + 1
             RETURNING count",
        )
        .bind(user_id)
        .bind(platform.as_str())
        .bind(endpoint)
        .bind(day)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.max(0) as u64)
    }

    async fn usage_since(
        &self,
        user_id: Uuid,
        platform: Platform,
        since: NaiveDate,
    ) -> Result<BTreeMap<String, u64>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT endpoint, SUM(count)::BIGINT FROM api_usage
             WHERE user_id = $1 AND platform = $2 AND day >= $3
             GROUP BY endpoint",
        )
        .bind(user_id)
        .bind(platform.as_str())
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(endpoint, count)| (endpoint, count.max(0) as u64))
            .collect())
    }
}
