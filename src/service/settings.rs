//! AI key resolution and admin-managed integration settings

use async_trait::async_trait;

use crate::db::DbError;
use crate::db::admin::{ActivityLogRepository, SettingsRepository};
use crate::model::{AI_KEY_SETTING, NewActivity, mask_secret};
use crate::service::analysis::ApiKeySource;

/// Resolves the AI key from integration settings, then the environment
pub struct SettingsKeySource {
    settings: SettingsRepository,
}

impl SettingsKeySource {
    pub fn new(settings: SettingsRepository) -> Self {
        Self { settings }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl ApiKeySource for SettingsKeySource {
    async fn resolve(&self) -> Option<String> {
        match self.settings.get(AI_KEY_SETTING).await {
            Ok(setting) => {
                if let Some(key) = non_empty(setting.and_then(|s| s.value)) {
                    return Some(key);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read AI key setting, trying environment");
            }
        }

        non_empty(std::env::var(AI_KEY_SETTING).ok())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Database error: {0}")]
    DbError(#[from] DbError),

    #[error("API key must not be empty")]
    EmptyKey,
}

/// Masked view of the AI key
#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct AiKeyStatus {
    pub configured: bool,
    /// Source of the effective key: "settings", "environment" or none
    pub source: Option<String>,
    pub masked_value: Option<String>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

pub struct SettingsService {
    settings: SettingsRepository,
    activity: ActivityLogRepository,
}

impl SettingsService {
    pub fn new(settings: SettingsRepository, activity: ActivityLogRepository) -> Self {
        Self { settings, activity }
    }

    pub async fn ai_key_status(&self) -> Result<AiKeyStatus, SettingsError> {
        let setting = self.settings.get(AI_KEY_SETTING).await?;
        let updated_at = setting.as_ref().map(|s| s.updated_at);

        if let Some(key) = non_empty(setting.and_then(|s| s.value)) {
            return Ok(AiKeyStatus {
                configured: true,
                source: Some("settings".to_string()),
                masked_value: Some(mask_secret(&key)),
                updated_at,
            });
        }

        Ok(match non_empty(std::env::var(AI_KEY_SETTING).ok()) {
            Some(key) => AiKeyStatus {
                configured: true,
                source: Some("environment".to_string()),
                masked_value: Some(mask_secret(&key)),
                updated_at: None,
            },
            None => AiKeyStatus {
                configured: false,
                source: None,
                masked_value: None,
                updated_at,
            },
        })
    }

    /// Store a new AI key and record the change
    pub async fn set_ai_key(&self, actor_id: i64, value: &str) -> Result<AiKeyStatus, SettingsError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(SettingsError::EmptyKey);
        }

        let setting = self.settings.upsert(AI_KEY_SETTING, value).await?;

        let activity = NewActivity {
            actor_id: Some(actor_id),
            action: "ai_key_updated",
            target_type: "integration_setting",
            target_id: AI_KEY_SETTING.to_string(),
            meta: serde_json::json!({}),
        };
        if let Err(e) = self.activity.record(&activity).await {
            tracing::warn!(error = %e, "Failed to record activity");
        }

        tracing::info!(actor_id, "AI key updated");

        Ok(AiKeyStatus {
            configured: true,
            source: Some("settings".to_string()),
            masked_value: Some(mask_secret(value)),
            updated_at: Some(setting.updated_at),
        })
    }

    pub async fn activity_logs(
        &self,
        limit: Option<i64>,
    ) -> Result<Vec<crate::model::ActivityLog>, SettingsError> {
        Ok(self.activity.list(limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_trims_and_filters() {
        assert_eq!(non_empty(Some("  abc ".to_string())), Some("abc".to_string()));
        assert_eq!(non_empty(Some("   ".to_string())), None);
        assert_eq!(non_empty(None), None);
    }
}
