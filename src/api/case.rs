//! REST API endpoints for cases

use actix_web::{HttpResponse, delete, get, patch, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::auth::require_admin;
use super::error::{ApiError, ErrorResponse};
use crate::db::models::ListCasesQuery;
use crate::model::{
    AnalysisRecord, Caller, Case, CaseComment, CaseDetail, CaseDocument, CaseUpdate,
    LocationHints, NewCase,
};
use crate::service::CaseService;
use crate::service::case::{AnalyzeCaseRequest, UploadDocumentRequest};

/// Case intake plus location hints for the background analysis
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCaseRequest {
    #[serde(flatten)]
    pub case: NewCase,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub pincode: Option<String>,
}

/// Query parameters for listing cases
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListCasesParams {
    /// Page number (1-indexed, default: 1)
    pub page: Option<u32>,
    /// Page size (default: 20, max: 100)
    pub page_size: Option<u32>,
    /// Filter by status (open, in_progress, closed)
    pub status: Option<String>,
    /// Filter by category
    pub category: Option<String>,
    /// Filter by public case reference, case-insensitive
    pub case_id: Option<String>,
}

/// Paginated response for cases
#[derive(Debug, Serialize, ToSchema)]
pub struct CaseListResponse {
    pub cases: Vec<Case>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: i64,
    pub total_pages: u32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewCommentRequest {
    pub content: String,
}

/// Create a case and queue its analysis
#[utoipa::path(
    post,
    path = "/v1/cases",
    request_body = CreateCaseRequest,
    responses(
        (status = 201, description = "Case created", body = Case),
        (status = 400, description = "Invalid case", body = ErrorResponse),
        (status = 401, description = "Missing caller identity", body = ErrorResponse)
    ),
    tag = "cases"
)]
#[post("/v1/cases")]
pub async fn create_case(
    service: web::Data<CaseService>,
    caller: Caller,
    body: web::Json<CreateCaseRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let hints = LocationHints::from_parts(
        body.country.as_deref(),
        body.state.as_deref(),
        body.city.as_deref(),
        body.pincode.as_deref(),
    );

    let case = service.create(caller, body.case, hints).await?;
    Ok(HttpResponse::Created().json(case))
}

/// List cases visible to the caller
#[utoipa::path(
    get,
    path = "/v1/cases",
    params(ListCasesParams),
    responses(
        (status = 200, description = "Cases retrieved successfully", body = CaseListResponse),
        (status = 401, description = "Missing caller identity", body = ErrorResponse)
    ),
    tag = "cases"
)]
#[get("/v1/cases")]
pub async fn list_cases(
    service: web::Data<CaseService>,
    caller: Caller,
    query: web::Query<ListCasesParams>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    let db_query = ListCasesQuery {
        owner: None,
        status: query.status,
        category: query.category,
        case_ref: query.case_id,
        page: query.page,
        page_size: query.page_size,
    };

    let paginated = service.list(caller, db_query).await?;
    Ok(HttpResponse::Ok().json(CaseListResponse {
        cases: paginated.cases,
        page: paginated.page,
        page_size: paginated.page_size,
        total_count: paginated.total_count,
        total_pages: paginated.total_pages,
    }))
}

/// Get a case with its documents and comments
#[utoipa::path(
    get,
    path = "/v1/cases/{id}",
    params(("id" = i64, Path, description = "Case ID")),
    responses(
        (status = 200, description = "Case retrieved successfully", body = CaseDetail),
        (status = 404, description = "Case not found or owned by another user", body = ErrorResponse)
    ),
    tag = "cases"
)]
#[get("/v1/cases/{id}")]
pub async fn get_case(
    service: web::Data<CaseService>,
    caller: Caller,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let detail = service.get(caller, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// Update descriptive fields of a case
#[utoipa::path(
    patch,
    path = "/v1/cases/{id}",
    params(("id" = i64, Path, description = "Case ID")),
    request_body = CaseUpdate,
    responses(
        (status = 200, description = "Case updated", body = Case),
        (status = 400, description = "Invalid update", body = ErrorResponse),
        (status = 404, description = "Case not found", body = ErrorResponse)
    ),
    tag = "cases"
)]
#[patch("/v1/cases/{id}")]
pub async fn update_case(
    service: web::Data<CaseService>,
    caller: Caller,
    path: web::Path<i64>,
    body: web::Json<CaseUpdate>,
) -> Result<HttpResponse, ApiError> {
    let case = service
        .update(caller, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(case))
}

/// Delete a case
#[utoipa::path(
    delete,
    path = "/v1/cases/{id}",
    params(("id" = i64, Path, description = "Case ID")),
    responses(
        (status = 204, description = "Case deleted"),
        (status = 404, description = "Case not found or owned by another user", body = ErrorResponse)
    ),
    tag = "cases"
)]
#[delete("/v1/cases/{id}")]
pub async fn delete_case(
    service: web::Data<CaseService>,
    caller: Caller,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    service.delete(caller, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Upload a document to a case
#[utoipa::path(
    post,
    path = "/v1/cases/{id}/documents",
    params(("id" = i64, Path, description = "Case ID")),
    request_body = UploadDocumentRequest,
    responses(
        (status = 201, description = "Document stored", body = CaseDocument),
        (status = 400, description = "Invalid upload", body = ErrorResponse),
        (status = 404, description = "Case not found", body = ErrorResponse)
    ),
    tag = "cases"
)]
#[post("/v1/cases/{id}/documents")]
pub async fn upload_document(
    service: web::Data<CaseService>,
    caller: Caller,
    path: web::Path<i64>,
    body: web::Json<UploadDocumentRequest>,
) -> Result<HttpResponse, ApiError> {
    let document = service
        .add_document(caller, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(document))
}

/// Comment on a case
#[utoipa::path(
    post,
    path = "/v1/cases/{id}/comments",
    params(("id" = i64, Path, description = "Case ID")),
    request_body = NewCommentRequest,
    responses(
        (status = 201, description = "Comment added", body = CaseComment),
        (status = 400, description = "Empty comment", body = ErrorResponse),
        (status = 404, description = "Case not found", body = ErrorResponse)
    ),
    tag = "cases"
)]
#[post("/v1/cases/{id}/comments")]
pub async fn add_comment(
    service: web::Data<CaseService>,
    caller: Caller,
    path: web::Path<i64>,
    body: web::Json<NewCommentRequest>,
) -> Result<HttpResponse, ApiError> {
    let comment = service
        .add_comment(caller, path.into_inner(), &body.content)
        .await?;
    Ok(HttpResponse::Created().json(comment))
}

/// Run analysis on a case and apply the result
#[utoipa::path(
    post,
    path = "/v1/cases/{id}/analyze",
    params(("id" = i64, Path, description = "Case ID")),
    request_body = AnalyzeCaseRequest,
    responses(
        (status = 200, description = "Analysis applied", body = Case),
        (status = 400, description = "Invalid state or language", body = ErrorResponse),
        (status = 404, description = "Case not found", body = ErrorResponse),
        (status = 502, description = "AI response was not structured", body = ErrorResponse),
        (status = 503, description = "AI integration not configured", body = ErrorResponse)
    ),
    tag = "cases"
)]
#[post("/v1/cases/{id}/analyze")]
pub async fn analyze_case(
    service: web::Data<CaseService>,
    caller: Caller,
    path: web::Path<i64>,
    body: Option<web::Json<AnalyzeCaseRequest>>,
) -> Result<HttpResponse, ApiError> {
    let request = body.map(web::Json::into_inner).unwrap_or_default();
    let case = service.analyze(caller, path.into_inner(), request).await?;
    Ok(HttpResponse::Ok().json(case))
}

/// Get the stored analysis record of a case
#[utoipa::path(
    get,
    path = "/v1/cases/{id}/analysis",
    params(("id" = i64, Path, description = "Case ID")),
    responses(
        (status = 200, description = "Analysis record", body = AnalysisRecord),
        (status = 404, description = "Case not found or not analyzed yet", body = ErrorResponse)
    ),
    tag = "cases"
)]
#[get("/v1/cases/{id}/analysis")]
pub async fn get_case_analysis(
    service: web::Data<CaseService>,
    caller: Caller,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    match service.analysis_record(caller, id).await? {
        Some(record) => Ok(HttpResponse::Ok().json(record)),
        None => Err(ApiError::NotFound(format!("analysis for case {}", id))),
    }
}

/// Close a case
#[utoipa::path(
    post,
    path = "/v1/cases/{id}/close",
    params(("id" = i64, Path, description = "Case ID")),
    responses(
        (status = 200, description = "Case closed", body = Case),
        (status = 404, description = "Case not found", body = ErrorResponse),
        (status = 409, description = "Case already closed", body = ErrorResponse)
    ),
    tag = "cases"
)]
#[post("/v1/cases/{id}/close")]
pub async fn close_case(
    service: web::Data<CaseService>,
    caller: Caller,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let case = service.close(caller, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(case))
}

/// Approve an open case (admin only)
#[utoipa::path(
    post,
    path = "/v1/cases/{id}/approve",
    params(("id" = i64, Path, description = "Case ID")),
    responses(
        (status = 200, description = "Case approved", body = Case),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Case not found", body = ErrorResponse)
    ),
    tag = "cases"
)]
#[post("/v1/cases/{id}/approve")]
pub async fn approve_case(
    service: web::Data<CaseService>,
    caller: Caller,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    require_admin(&caller)?;
    let case = service.approve(caller, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(case))
}

/// Configure case routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_case)
        .service(list_cases)
        .service(get_case)
        .service(update_case)
        .service(delete_case)
        .service(upload_document)
        .service(add_comment)
        .service(analyze_case)
        .service(get_case_analysis)
        .service(close_case)
        .service(approve_case);
}
