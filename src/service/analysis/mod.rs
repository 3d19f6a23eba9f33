//! Case analysis: backend selection, AI generation and deterministic fallback

pub mod fallback;
pub mod normalize;
pub mod parse;
pub mod prompts;
pub mod validation;

use std::sync::Arc;

use async_trait::async_trait;

use crate::model::{AnalysisPayload, AnalysisRequest, FallbackReason};
use crate::service::llm::{AiError, GeneratorFactory, TextGenerator};

pub use fallback::build_fallback;
pub use normalize::normalize_analysis;
pub use parse::parse_analysis_response;
pub use validation::{ValidationError, validate_analysis_input};

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("AI integration is not configured. Set GEMINI_API_KEY in integration settings.")]
    NotConfigured,

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Resolves the AI API key at call time
#[async_trait]
pub trait ApiKeySource: Send + Sync {
    async fn resolve(&self) -> Option<String>;
}

/// Fixed key, or none
pub struct StaticKey(pub Option<String>);

#[async_trait]
impl ApiKeySource for StaticKey {
    async fn resolve(&self) -> Option<String> {
        self.0.clone().filter(|k| !k.trim().is_empty())
    }
}

/// Produces an analysis payload for a request
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> AnalysisPayload;
}

/// Calls the AI text generator, degrading to the fallback on provider errors
pub struct LiveBackend {
    generator: Arc<dyn TextGenerator>,
}

impl LiveBackend {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl AnalysisBackend for LiveBackend {
    async fn analyze(&self, request: &AnalysisRequest) -> AnalysisPayload {
        let prompt = prompts::build_analysis_prompt(request);

        match self
            .generator
            .complete(prompts::ANALYSIS_SYSTEM_PROMPT, &prompt)
            .await
        {
            Ok(text) => parse_analysis_response(&text, &request.hints),
            Err(AiError::RateLimited(message)) => {
                tracing::warn!(error = %message, "AI rate limited, using fallback analysis");
                AnalysisPayload::Normalized(Box::new(build_fallback(
                    request,
                    FallbackReason::RateLimited,
                )))
            }
            Err(e) => {
                tracing::warn!(error = %e, "AI analysis failed, using fallback analysis");
                AnalysisPayload::Normalized(Box::new(build_fallback(
                    request,
                    FallbackReason::AiError,
                )))
            }
        }
    }
}

/// Deterministic local analysis
pub struct FallbackBackend {
    reason: FallbackReason,
}

impl FallbackBackend {
    pub fn new(reason: FallbackReason) -> Self {
        Self { reason }
    }
}

#[async_trait]
impl AnalysisBackend for FallbackBackend {
    async fn analyze(&self, request: &AnalysisRequest) -> AnalysisPayload {
        AnalysisPayload::Normalized(Box::new(build_fallback(request, self.reason)))
    }
}

/// Selects an analysis backend per call and runs it
pub struct AnalysisService {
    keys: Arc<dyn ApiKeySource>,
    generators: Arc<dyn GeneratorFactory>,
    ai_enabled: bool,
}

impl AnalysisService {
    pub fn new(
        keys: Arc<dyn ApiKeySource>,
        generators: Arc<dyn GeneratorFactory>,
        ai_enabled: bool,
    ) -> Self {
        Self {
            keys,
            generators,
            ai_enabled,
        }
    }

    pub fn ai_enabled(&self) -> bool {
        self.ai_enabled
    }

    /// Resolve the AI key, failing when none is configured
    pub async fn require_key(&self) -> Result<String, AnalysisError> {
        self.keys.resolve().await.ok_or(AnalysisError::NotConfigured)
    }

    /// Build a text generator for the currently configured key
    pub async fn generator(&self) -> Result<Arc<dyn TextGenerator>, AnalysisError> {
        let key = self.require_key().await?;
        self.generators.build(&key).map_err(|e| {
            tracing::error!(error = %e, "Failed to build AI client");
            AnalysisError::NotConfigured
        })
    }

    pub async fn select_backend(&self) -> Result<Box<dyn AnalysisBackend>, AnalysisError> {
        if !self.ai_enabled {
            return Ok(Box::new(FallbackBackend::new(FallbackReason::NoBackend)));
        }

        let key = self.require_key().await?;
        match self.generators.build(&key) {
            Ok(generator) => Ok(Box::new(LiveBackend::new(generator))),
            Err(e) => {
                tracing::warn!(error = %e, "AI client unavailable, using fallback analysis");
                Ok(Box::new(FallbackBackend::new(FallbackReason::AiError)))
            }
        }
    }

    /// Run analysis for a request with the backend available right now
    pub async fn generate(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisPayload, AnalysisError> {
        let start_time = std::time::Instant::now();
        let backend = self.select_backend().await?;
        let payload = backend.analyze(request).await;

        tracing::info!(
            elapsed_ms = start_time.elapsed().as_millis(),
            structured = payload.as_normalized().is_some(),
            fallback_reason = payload
                .as_normalized()
                .and_then(|a| a.fallback_reason)
                .map(|r| r.as_str())
                .unwrap_or("none"),
            "Case analysis generated"
        );

        Ok(payload)
    }

    /// Validate location and language, then run analysis
    pub async fn generate_validated(
        &self,
        mut request: AnalysisRequest,
        language: Option<&str>,
    ) -> Result<AnalysisPayload, AnalysisError> {
        let (hints, language) = validate_analysis_input(request.hints, language)?;
        request.hints = hints;
        request.language = language;
        self.generate(&request).await
    }

    /// Analysis for anonymous callers; nothing is persisted
    pub async fn analyze_public(
        &self,
        request: AnalysisRequest,
        language: Option<&str>,
    ) -> Result<AnalysisPayload, AnalysisError> {
        if request.title.trim().is_empty() {
            return Err(ValidationError::MissingField("title").into());
        }
        if request.description.trim().is_empty() {
            return Err(ValidationError::MissingField("description").into());
        }
        self.generate_validated(request, language).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LocationHints;
    use crate::service::llm::testing::{ScriptedFactory, ScriptedGenerator};

    fn request(country: &str) -> AnalysisRequest {
        AnalysisRequest {
            title: "Card skimming".to_string(),
            description: "Money withdrawn after using an ATM near the station".to_string(),
            hints: LocationHints {
                country: country.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn service(generator: Arc<ScriptedGenerator>, key: Option<&str>) -> AnalysisService {
        AnalysisService::new(
            Arc::new(StaticKey(key.map(str::to_string))),
            Arc::new(ScriptedFactory(generator)),
            true,
        )
    }

    #[tokio::test]
    async fn test_disabled_ai_uses_no_backend_fallback() {
        let generator = ScriptedGenerator::replying("{}");
        let service = AnalysisService::new(
            Arc::new(StaticKey(None)),
            Arc::new(ScriptedFactory(generator.clone())),
            false,
        );

        let payload = service.generate(&request("India")).await.unwrap();
        let analysis = payload.as_normalized().unwrap();
        assert_eq!(analysis.fallback_reason, Some(FallbackReason::NoBackend));
        assert_eq!(analysis.legal_sections.len(), 1);
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let service = service(ScriptedGenerator::replying("{}"), Some("  "));
        let err = service.generate(&request("India")).await.unwrap_err();
        assert!(matches!(err, AnalysisError::NotConfigured));
    }

    #[tokio::test]
    async fn test_live_response_is_parsed_and_normalized() {
        let generator =
            ScriptedGenerator::replying("```json\n{\"sentiment\": -3, \"keywords\": [\"atm\"]}\n```");
        let service = service(generator.clone(), Some("key"));

        let payload = service.generate(&request("India")).await.unwrap();
        let analysis = payload.as_normalized().unwrap();
        assert_eq!(analysis.sentiment, -1.0);
        assert_eq!(analysis.keywords, vec!["atm"]);
        assert_eq!(analysis.country, "India");
        assert_eq!(analysis.fallback_reason, None);
        assert!(generator.prompts.lock().unwrap()[0].contains("Card skimming"));
    }

    #[tokio::test]
    async fn test_rate_limit_falls_back() {
        let service = service(
            ScriptedGenerator::failing("429 RESOURCE_EXHAUSTED"),
            Some("key"),
        );
        let payload = service.generate(&request("Nepal")).await.unwrap();
        let analysis = payload.as_normalized().unwrap();
        assert_eq!(analysis.fallback_reason, Some(FallbackReason::RateLimited));
        assert!(analysis.filing_authorities.is_empty());
    }

    #[tokio::test]
    async fn test_other_failure_falls_back_with_ai_error() {
        let service = service(ScriptedGenerator::failing("connection reset"), Some("key"));
        let payload = service.generate(&request("India")).await.unwrap();
        assert_eq!(
            payload.as_normalized().unwrap().fallback_reason,
            Some(FallbackReason::AiError)
        );
    }

    #[tokio::test]
    async fn test_public_analysis_validates_before_calling_ai() {
        let generator = ScriptedGenerator::replying("{}");
        let service = service(generator.clone(), Some("key"));

        let mut invalid_state = request("");
        invalid_state.hints.state = "Texas".to_string();
        let err = service
            .analyze_public(invalid_state, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Validation(ValidationError::InvalidState(_))
        ));

        let mut untitled = request("");
        untitled.title = " ".to_string();
        let err = service.analyze_public(untitled, None).await.unwrap_err();
        assert_eq!(err.to_string(), "Case title is required");

        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_validated_run_forces_country() {
        let generator = ScriptedGenerator::replying("{}");
        let service = service(generator.clone(), Some("key"));

        let payload = service
            .generate_validated(request("Sri Lanka"), Some("Tamil"))
            .await
            .unwrap();
        assert_eq!(payload.as_normalized().unwrap().country, "India");
        let prompt = generator.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("Country/Jurisdiction: India"));
        assert!(prompt.contains("in Tamil"));
    }

    #[tokio::test]
    async fn test_unstructured_response_is_not_a_fallback() {
        let service = service(ScriptedGenerator::replying("Sorry, no JSON today"), Some("key"));
        let payload = service.generate(&request("India")).await.unwrap();
        assert!(payload.as_normalized().is_none());
        assert_eq!(
            payload,
            AnalysisPayload::unstructured("Sorry, no JSON today", parse::UNSTRUCTURED_ERROR)
        );
    }
}
