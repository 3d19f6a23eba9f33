//! Repositories for integration settings and the activity log

use async_trait::async_trait;
use sqlx::PgPool;

use super::DbError;
use super::models::{ActivityLogRow, IntegrationSettingRow};
use crate::model::{ActivityLog, IntegrationSetting, NewActivity};

const DEFAULT_ACTIVITY_LIMIT: i64 = 100;

#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, name: &str) -> Result<Option<IntegrationSetting>, DbError> {
        let row: Option<IntegrationSettingRow> =
            sqlx::query_as("SELECT * FROM integration_settings WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Into::into))
    }

    pub async fn upsert(&self, name: &str, value: &str) -> Result<IntegrationSetting, DbError> {
        let row: IntegrationSettingRow = sqlx::query_as(
            r#"
            INSERT INTO integration_settings (name, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (name) DO UPDATE SET
                value = EXCLUDED.value,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(value)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(name = %name, "Upserted integration setting");
        Ok(row.into())
    }
}

/// Destination for activity log entries
#[async_trait]
pub trait ActivitySink: Send + Sync {
    async fn record(&self, activity: &NewActivity) -> Result<ActivityLog, DbError>;
}

#[derive(Clone)]
pub struct ActivityLogRepository {
    pool: PgPool,
}

impl ActivityLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, activity: &NewActivity) -> Result<ActivityLog, DbError> {
        let row: ActivityLogRow = sqlx::query_as(
            r#"
            INSERT INTO activity_logs (actor_id, action, target_type, target_id, meta)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(activity.actor_id)
        .bind(activity.action)
        .bind(activity.target_type)
        .bind(&activity.target_id)
        .bind(&activity.meta)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    /// Most recent entries first
    pub async fn list(&self, limit: Option<i64>) -> Result<Vec<ActivityLog>, DbError> {
        let limit = limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT).clamp(1, 500);
        let rows: Vec<ActivityLogRow> = sqlx::query_as(
            "SELECT * FROM activity_logs ORDER BY created_at DESC, id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl ActivitySink for ActivityLogRepository {
    async fn record(&self, activity: &NewActivity) -> Result<ActivityLog, DbError> {
        ActivityLogRepository::record(self, activity).await
    }
}
