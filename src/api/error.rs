//! Unified API error handling
//!
//! This module provides a consistent error response format across all API endpoints.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbError;
use crate::service::analysis::AnalysisError;
use crate::service::case::CaseServiceError;
use crate::service::chat::ChatError;
use crate::service::settings::SettingsError;
use crate::service::storage::FileStoreError;

/// Standard error response format
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error type/code
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Unique request ID for tracing
    pub request_id: String,
}

/// Unified API error type
///
/// All API endpoints should return `Result<T, ApiError>` for consistent error handling.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Bad request / validation error (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing or malformed caller identity (401)
    #[error("Authentication required: {0}")]
    Unauthorized(String),

    /// Caller may not act on the resource (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Invalid state transition (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// AI integration disabled (501)
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// AI integration not configured (503)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(String),

    /// External service error (502)
    #[error("External service error: {0}")]
    ExternalService(String),
}

impl ApiError {
    fn error_type(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::Conflict(_) => "conflict",
            ApiError::NotImplemented(_) => "not_implemented",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
            ApiError::Internal(_) => "internal_error",
            ApiError::Database(_) => "database_error",
            ApiError::ExternalService(_) => "external_service_error",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_type = self.error_type();

        tracing::error!(
            error_type = error_type,
            status = status.as_u16(),
            message = %self,
            "API error"
        );

        HttpResponse::build(status).json(ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
            request_id: Uuid::new_v4().to_string(),
        })
    }
}

// ============================================================================
// From conversions for service errors
// ============================================================================

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(id) => ApiError::NotFound(id),
            _ => ApiError::Database(err.to_string()),
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::NotConfigured => ApiError::ServiceUnavailable(err.to_string()),
            AnalysisError::Validation(e) => ApiError::BadRequest(e.to_string()),
        }
    }
}

impl From<FileStoreError> for ApiError {
    fn from(err: FileStoreError) -> Self {
        match err {
            FileStoreError::Io(e) => ApiError::Internal(format!("File storage failed: {}", e)),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<CaseServiceError> for ApiError {
    fn from(err: CaseServiceError) -> Self {
        match err {
            CaseServiceError::DbError(e) => e.into(),
            CaseServiceError::NotFound(id) => ApiError::NotFound(format!("case {}", id)),
            CaseServiceError::Forbidden => ApiError::Forbidden(err.to_string()),
            CaseServiceError::Validation(msg) => ApiError::BadRequest(msg),
            CaseServiceError::InvalidTransition(e) => ApiError::Conflict(e.to_string()),
            CaseServiceError::Analysis(e) => e.into(),
            CaseServiceError::MalformedAnalysis(_) => ApiError::ExternalService(err.to_string()),
            CaseServiceError::Storage(e) => e.into(),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::DbError(e) => e.into(),
            ChatError::SessionNotFound(id) => ApiError::NotFound(format!("chat session {}", id)),
            ChatError::Validation(msg) => ApiError::BadRequest(msg),
            ChatError::Analysis(e) => e.into(),
            ChatError::AiDisabled => ApiError::NotImplemented(err.to_string()),
            ChatError::AiFailed => ApiError::ExternalService(err.to_string()),
            ChatError::Storage(e) => e.into(),
        }
    }
}

impl From<SettingsError> for ApiError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::DbError(e) => e.into(),
            SettingsError::EmptyKey => ApiError::BadRequest(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CaseStatus, InvalidTransition, StatusAction};

    #[test]
    fn test_status_mapping() {
        let cases: Vec<(ApiError, StatusCode)> = vec![
            (
                CaseServiceError::NotFound(3).into(),
                StatusCode::NOT_FOUND,
            ),
            (CaseServiceError::Forbidden.into(), StatusCode::FORBIDDEN),
            (
                CaseServiceError::InvalidTransition(InvalidTransition {
                    from: CaseStatus::Closed,
                    action: StatusAction::Close,
                })
                .into(),
                StatusCode::CONFLICT,
            ),
            (
                AnalysisError::NotConfigured.into(),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (ChatError::AiDisabled.into(), StatusCode::NOT_IMPLEMENTED),
            (ChatError::AiFailed.into(), StatusCode::BAD_GATEWAY),
            (
                ChatError::SessionNotFound(1).into(),
                StatusCode::NOT_FOUND,
            ),
            (FileStoreError::Empty.into(), StatusCode::BAD_REQUEST),
            (SettingsError::EmptyKey.into(), StatusCode::BAD_REQUEST),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status_code(), expected, "{}", error);
        }
    }

    #[test]
    fn test_malformed_analysis_is_bad_gateway() {
        let err: ApiError = CaseServiceError::MalformedAnalysis(crate::model::UnstructuredAnalysis {
            raw: "text".to_string(),
            error: "Response was not structured JSON".to_string(),
        })
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(err.to_string().contains("not structured"));
    }
}
