use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;

use crate::core::ports::{ProfileStore, StoreError};
use crate::models::{Decision, UserProfile};

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<PostgresError> for StoreError {
    fn from(value: PostgresError) -> Self {
        match value {
            PostgresError::SerializationError(e) => StoreError::InvalidData(e.to_string()),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// Decision values as stored in the `decision` enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "decision", rename_all = "lowercase")]
pub enum DecisionKind {
    Liked,
    Disliked,
}

impl From<DecisionKind> for Decision {
    fn from(value: DecisionKind) -> Self {
        match value {
            DecisionKind::Liked => Decision::Liked,
            DecisionKind::Disliked => Decision::Disliked,
        }
    }
}

impl From<Decision> for DecisionKind {
    fn from(value: Decision) -> Self {
        match value {
            Decision::Liked => DecisionKind::Liked,
            Decision::Disliked => DecisionKind::Disliked,
        }
    }
}

/// PostgreSQL-backed profile store
///
/// Profiles are kept as JSONB documents. Swipe decisions live in their own
/// table and are merged into the profile's `matches` map on load.
pub struct PostgresProfileStore {
    pool: PgPool,
}

impl PostgresProfileStore {
    /// Create a new store from a connection string and run migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Insert or replace a profile document
    pub async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), PostgresError> {
        let query = r#"
            INSERT INTO user_profiles (user_id, document, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id)
            DO UPDATE SET
                document = EXCLUDED.document,
                updated_at = EXCLUDED.updated_at
        "#;

        sqlx::query(query)
            .bind(&profile.id)
            .bind(serde_json::to_value(profile)?)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Decisions the user has made, keyed by target user
    async fn decisions_for(&self, user_id: &str) -> Result<Vec<(String, Decision)>, PostgresError> {
        let query = r#"
            SELECT target_user_id, decision
            FROM profile_decisions
            WHERE user_id = $1
        "#;

        let rows = sqlx::query(query).bind(user_id).fetch_all(&self.pool).await?;

        Ok(rows
            .iter()
            .map(|row| {
                let target: String = row.get("target_user_id");
                let kind: DecisionKind = row.get("decision");
                (target, Decision::from(kind))
            })
            .collect())
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn decode_row(user_id: String, document: serde_json::Value) -> Result<UserProfile, PostgresError> {
    let mut profile: UserProfile = serde_json::from_value(document)?;
    profile.id = user_id;
    Ok(profile)
}

#[async_trait]
impl ProfileStore for PostgresProfileStore {
    async fn get(&self, id: &str) -> Result<UserProfile, StoreError> {
        let query = r#"
            SELECT user_id, document
            FROM user_profiles
            WHERE user_id = $1
        "#;

        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(PostgresError::from)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let mut profile = decode_row(row.get("user_id"), row.get("document"))?;

        let decisions = self.decisions_for(id).await?;
        tracing::debug!("User {} has {} recorded decisions", id, decisions.len());
        profile.matches.extend(decisions);

        Ok(profile)
    }

    async fn query_all_except(&self, id: &str) -> Result<Vec<UserProfile>, StoreError> {
        let query = r#"
            SELECT user_id, document
            FROM user_profiles
            WHERE user_id <> $1
        "#;

        let rows = sqlx::query(query)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(PostgresError::from)?;

        let profiles: Vec<UserProfile> = rows
            .into_iter()
            .filter_map(|row| {
                let user_id: String = row.get("user_id");
                match decode_row(user_id.clone(), row.get("document")) {
                    Ok(profile) => Some(profile),
                    Err(e) => {
                        tracing::warn!("Skipping undecodable profile {}: {}", user_id, e);
                        None
                    }
                }
            })
            .collect();

        Ok(profiles)
    }
}
