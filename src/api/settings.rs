//! Admin endpoints for integration settings and the activity log

use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use super::auth::require_admin;
use super::error::{ApiError, ErrorResponse};
use crate::model::{ActivityLog, Caller};
use crate::service::SettingsService;
use crate::service::settings::AiKeyStatus;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetAiKeyRequest {
    pub value: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ActivityLogParams {
    /// Maximum entries to return (default: 100, max: 500)
    pub limit: Option<i64>,
}

/// Show whether an AI key is configured, masked
#[utoipa::path(
    get,
    path = "/v1/settings/ai-key",
    responses(
        (status = 200, description = "Masked key status", body = AiKeyStatus),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    tag = "settings"
)]
#[get("/v1/settings/ai-key")]
pub async fn get_ai_key(
    service: web::Data<SettingsService>,
    caller: Caller,
) -> Result<HttpResponse, ApiError> {
    require_admin(&caller)?;
    let status = service.ai_key_status().await?;
    Ok(HttpResponse::Ok().json(status))
}

/// Store the AI key used by analysis and chat
#[utoipa::path(
    post,
    path = "/v1/settings/ai-key",
    request_body = SetAiKeyRequest,
    responses(
        (status = 200, description = "Key stored", body = AiKeyStatus),
        (status = 400, description = "Empty key", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    tag = "settings"
)]
#[post("/v1/settings/ai-key")]
pub async fn set_ai_key(
    service: web::Data<SettingsService>,
    caller: Caller,
    body: web::Json<SetAiKeyRequest>,
) -> Result<HttpResponse, ApiError> {
    require_admin(&caller)?;
    let status = service.set_ai_key(caller.user_id, &body.value).await?;
    Ok(HttpResponse::Ok().json(status))
}

/// Recent administrative actions
#[utoipa::path(
    get,
    path = "/v1/admin/activity-logs",
    params(ActivityLogParams),
    responses(
        (status = 200, description = "Activity log, newest first", body = Vec<ActivityLog>),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    tag = "settings"
)]
#[get("/v1/admin/activity-logs")]
pub async fn list_activity_logs(
    service: web::Data<SettingsService>,
    caller: Caller,
    query: web::Query<ActivityLogParams>,
) -> Result<HttpResponse, ApiError> {
    require_admin(&caller)?;
    let logs = service.activity_logs(query.limit).await?;
    Ok(HttpResponse::Ok().json(logs))
}

/// Configure settings routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_ai_key)
        .service(set_ai_key)
        .service(list_activity_logs);
}
