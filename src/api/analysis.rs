//! Public analysis endpoint; results are not persisted

use actix_web::{HttpResponse, post, web};
use serde::Deserialize;
use utoipa::ToSchema;

use super::error::{ApiError, ErrorResponse};
use crate::model::{AnalysisPayload, AnalysisRequest, AttachmentType, LocationHints, NewAttachment};
use crate::service::AnalysisService;
use crate::service::chat::ChatFile;
use crate::service::storage::sanitize_file_name;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PublicAnalysisRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub accused_name: String,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub pincode: Option<String>,
    /// One of the supported languages; English when omitted
    pub language: Option<String>,
    /// Listed by name in the analysis prompt; contents are not stored
    #[serde(default)]
    pub evidence_files: Vec<ChatFile>,
    #[serde(default)]
    pub audio_files: Vec<ChatFile>,
}

/// Prompt lines naming the uploaded files
fn files_summary(evidence: &[ChatFile], audio: &[ChatFile]) -> Vec<String> {
    evidence
        .iter()
        .map(|f| (AttachmentType::Evidence, f))
        .chain(audio.iter().map(|f| (AttachmentType::Audio, f)))
        .filter_map(|(attachment_type, file)| {
            let file_name = sanitize_file_name(&file.file_name)?;
            let attachment = NewAttachment {
                attachment_type,
                file_path: None,
                file_name: Some(file_name),
                text_content: None,
            };
            Some(attachment.summary_line())
        })
        .collect()
}

/// Analyze an incident without creating a case
#[utoipa::path(
    post,
    path = "/v1/analysis",
    request_body = PublicAnalysisRequest,
    responses(
        (status = 200, description = "Analysis generated", body = AnalysisPayload),
        (status = 400, description = "Missing field, invalid state or language", body = ErrorResponse),
        (status = 503, description = "AI integration not configured", body = ErrorResponse)
    ),
    tag = "analysis"
)]
#[post("/v1/analysis")]
pub async fn analyze(
    service: web::Data<AnalysisService>,
    body: web::Json<PublicAnalysisRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let request = AnalysisRequest {
        title: body.title.trim().to_string(),
        accused_name: body.accused_name.trim().to_string(),
        description: body.description.trim().to_string(),
        hints: LocationHints::from_parts(
            body.country.as_deref(),
            body.state.as_deref(),
            body.city.as_deref(),
            body.pincode.as_deref(),
        ),
        language: String::new(),
        files_summary: files_summary(&body.evidence_files, &body.audio_files),
    };

    let payload = service
        .analyze_public(request, body.language.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(payload))
}

/// Configure analysis routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(analyze);
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test};
    use serde_json::{Value, json};
    use std::sync::Arc;

    use crate::service::analysis::StaticKey;
    use crate::service::llm::testing::{ScriptedFactory, ScriptedGenerator};

    fn fallback_only_service() -> web::Data<AnalysisService> {
        web::Data::new(AnalysisService::new(
            Arc::new(StaticKey(None)),
            Arc::new(ScriptedFactory(ScriptedGenerator::replying("{}"))),
            false,
        ))
    }

    #[actix_web::test]
    async fn test_public_analysis_returns_fallback() {
        let app = test::init_service(
            App::new()
                .app_data(fallback_only_service())
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/v1/analysis")
            .set_json(json!({
                "title": "OTP fraud",
                "description": "Caller posing as bank staff asked for the OTP and emptied the account",
                "state": "karnataka",
                "language": "Kannada"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["fallback_reason"], "no_backend");
        assert_eq!(body["country"], "India");
        assert_eq!(body["language"], "Kannada");
        assert_eq!(body["filing_authorities"][0]["phone_numbers"], json!(["1930", "112"]));
    }

    #[actix_web::test]
    async fn test_public_analysis_lists_uploaded_files_in_prompt() {
        let generator = ScriptedGenerator::replying("{\"summary\": \"ok\"}");
        let service = web::Data::new(AnalysisService::new(
            Arc::new(StaticKey(Some("key".to_string()))),
            Arc::new(ScriptedFactory(generator.clone())),
            true,
        ));
        let app = test::init_service(App::new().app_data(service).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/v1/analysis")
            .set_json(json!({
                "title": "Shop break-in",
                "description": "Shutter forced open at night",
                "evidence_files": [
                    {"file_name": "../cam/cctv.mp4", "content_base64": "AAAA"}
                ],
                "audio_files": [
                    {"file_name": "call.mp3", "content_base64": "AAAA"}
                ]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Evidence file: cctv.mp4\nAudio file: call.mp3"));
        assert!(!prompts[0].contains("No files attached"));
    }

    #[::core::prelude::v1::test]
    fn test_files_summary_skips_unusable_names() {
        let file = |name: &str| ChatFile {
            file_name: name.to_string(),
            content_base64: String::new(),
        };
        assert_eq!(
            files_summary(&[file("fir.pdf"), file("..")], &[file("dir/")]),
            vec!["Evidence file: fir.pdf"]
        );
    }

    #[actix_web::test]
    async fn test_public_analysis_rejects_unknown_state() {
        let app = test::init_service(
            App::new()
                .app_data(fallback_only_service())
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/v1/analysis")
            .set_json(json!({
                "title": "Theft",
                "description": "Bike stolen",
                "state": "Ontario"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "bad_request");
        assert!(body["request_id"].as_str().is_some());
    }

    #[actix_web::test]
    async fn test_public_analysis_without_key_is_unavailable() {
        let service = web::Data::new(AnalysisService::new(
            Arc::new(StaticKey(None)),
            Arc::new(ScriptedFactory(ScriptedGenerator::replying("{}"))),
            true,
        ));
        let app = test::init_service(App::new().app_data(service).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/v1/analysis")
            .set_json(json!({"title": "Theft", "description": "Bike stolen"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
