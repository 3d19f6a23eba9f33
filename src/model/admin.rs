use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Setting name holding the AI provider key
pub const AI_KEY_SETTING: &str = "GEMINI_API_KEY";

/// Authenticated caller as forwarded by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i64,
    pub is_admin: bool,
}

/// Key/value integration setting
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IntegrationSetting {
    pub name: String,
    pub value: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Audited administrative action
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActivityLog {
    pub id: i64,
    pub actor_id: Option<i64>,
    pub action: String,
    pub target_type: String,
    pub target_id: String,
    #[schema(value_type = Object)]
    pub meta: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Activity about to be recorded
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub actor_id: Option<i64>,
    pub action: &'static str,
    pub target_type: &'static str,
    pub target_id: String,
    pub meta: serde_json::Value,
}

/// Mask a secret for display, keeping only the last four characters
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("AIzaSyExample1234"), "*************1234");
        assert_eq!(mask_secret("abc"), "***");
        assert_eq!(mask_secret(""), "");
    }
}
