//! REST API endpoints for chat sessions

use actix_web::{HttpResponse, get, post, web};

use super::error::{ApiError, ErrorResponse};
use crate::model::{Caller, ChatExchange, ChatSession, ChatSessionDetail};
use crate::service::ChatService;
use crate::service::chat::SendMessageRequest;

/// List the caller's chat sessions
#[utoipa::path(
    get,
    path = "/v1/chat/sessions",
    responses(
        (status = 200, description = "Sessions, most recently updated first", body = Vec<ChatSession>),
        (status = 401, description = "Missing caller identity", body = ErrorResponse)
    ),
    tag = "chat"
)]
#[get("/v1/chat/sessions")]
pub async fn list_sessions(
    service: web::Data<ChatService>,
    caller: Caller,
) -> Result<HttpResponse, ApiError> {
    let sessions = service.list_sessions(caller).await?;
    Ok(HttpResponse::Ok().json(sessions))
}

/// Start a new chat session
#[utoipa::path(
    post,
    path = "/v1/chat/sessions",
    responses(
        (status = 201, description = "Session created", body = ChatSession),
        (status = 401, description = "Missing caller identity", body = ErrorResponse)
    ),
    tag = "chat"
)]
#[post("/v1/chat/sessions")]
pub async fn create_session(
    service: web::Data<ChatService>,
    caller: Caller,
) -> Result<HttpResponse, ApiError> {
    let session = service.create_session(caller).await?;
    Ok(HttpResponse::Created().json(session))
}

/// Get a session with its messages
#[utoipa::path(
    get,
    path = "/v1/chat/sessions/{id}",
    params(("id" = i64, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session with messages", body = ChatSessionDetail),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    tag = "chat"
)]
#[get("/v1/chat/sessions/{id}")]
pub async fn get_session(
    service: web::Data<ChatService>,
    caller: Caller,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let detail = service.get_session(caller, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// Send a message and receive the assistant's reply
#[utoipa::path(
    post,
    path = "/v1/chat/sessions/{id}/messages",
    params(("id" = i64, Path, description = "Session ID")),
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "User message and reply", body = ChatExchange),
        (status = 400, description = "Empty message or invalid upload", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 501, description = "AI integration disabled", body = ErrorResponse),
        (status = 502, description = "AI service failed", body = ErrorResponse),
        (status = 503, description = "AI integration not configured", body = ErrorResponse)
    ),
    tag = "chat"
)]
#[post("/v1/chat/sessions/{id}/messages")]
pub async fn send_message(
    service: web::Data<ChatService>,
    caller: Caller,
    path: web::Path<i64>,
    body: web::Json<SendMessageRequest>,
) -> Result<HttpResponse, ApiError> {
    let exchange = service
        .send_message(caller, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(exchange))
}

/// Configure chat routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_sessions)
        .service(create_session)
        .service(get_session)
        .service(send_message);
}
