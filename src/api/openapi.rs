//! OpenAPI specification endpoints

use actix_web::{HttpResponse, Responder, get};
use utoipa::OpenApi;

use super::{analysis, case, chat, health, settings};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Case Intel API",
        description = "Case management with AI-assisted legal analysis"
    ),
    paths(
        health::liveness,
        health::readiness,
        case::create_case,
        case::list_cases,
        case::get_case,
        case::update_case,
        case::delete_case,
        case::upload_document,
        case::add_comment,
        case::analyze_case,
        case::get_case_analysis,
        case::close_case,
        case::approve_case,
        analysis::analyze,
        chat::list_sessions,
        chat::create_session,
        chat::get_session,
        chat::send_message,
        settings::get_ai_key,
        settings::set_ai_key,
        settings::list_activity_logs,
    ),
    tags(
        (name = "health", description = "Liveness and readiness checks"),
        (name = "cases", description = "Case intake, documents, comments, analysis and status"),
        (name = "analysis", description = "Anonymous analysis without persistence"),
        (name = "chat", description = "AI chat sessions"),
        (name = "settings", description = "Admin settings and activity log")
    )
)]
pub struct ApiDoc;

/// Serve OpenAPI JSON specification
#[get("/openapi.json")]
pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

/// Serve OpenAPI YAML specification
#[get("/openapi.yaml")]
pub async fn openapi_yaml() -> impl Responder {
    match ApiDoc::openapi().to_yaml() {
        Ok(yaml) => HttpResponse::Ok().content_type("text/yaml").body(yaml),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render OpenAPI YAML");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Configure OpenAPI routes
pub fn configure(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.service(openapi_json).service(openapi_yaml);
}
