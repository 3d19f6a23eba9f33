//! Shared LLM client and interaction utilities
//!
//! Provides a common text-completion interface over the Gemini API used by
//! case analysis and chat.

use std::sync::Arc;

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::gemini;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AiError {
    #[error("AI provider rate limited the request: {0}")]
    RateLimited(String),

    #[error("AI request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to create AI client: {0}")]
    ClientInit(String),
}

impl AiError {
    /// Classify a provider error message.
    ///
    /// The provider client reports HTTP failures as text only, so rate limits
    /// are recognised by the status code or quota wording in the message.
    pub fn from_provider_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        let rate_limited = lower.contains("429")
            || lower.contains("resource exhausted")
            || lower.contains("resource_exhausted")
            || lower.contains("rate limit")
            || lower.contains("rate-limit")
            || lower.contains("rate_limit")
            || lower.contains("ratelimit")
            || lower.contains("quota");

        if rate_limited {
            AiError::RateLimited(message)
        } else {
            AiError::RequestFailed(message)
        }
    }
}

/// Single-shot text completion
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, preamble: &str, prompt: &str) -> Result<String, AiError>;
}

/// Builds a generator for a resolved API key.
///
/// The key can change at runtime through the settings endpoint, so generators
/// are built per call rather than once at startup.
pub trait GeneratorFactory: Send + Sync {
    fn build(&self, api_key: &str) -> Result<Arc<dyn TextGenerator>, AiError>;
}

/// Shared LLM client wrapper
#[derive(Clone)]
pub struct LlmClient {
    client: gemini::Client,
    model: String,
}

impl LlmClient {
    /// Create a new LLM client with the provided API key
    pub fn new(api_key: &str, model: &str) -> Result<Self, AiError> {
        let client =
            gemini::Client::new(api_key).map_err(|e| AiError::ClientInit(e.to_string()))?;

        Ok(Self {
            client,
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn complete(&self, preamble: &str, prompt: &str) -> Result<String, AiError> {
        let start_time = std::time::Instant::now();

        let agent = self.client.agent(&self.model).preamble(preamble).build();

        match agent.prompt(prompt).await {
            Ok(text) => {
                tracing::info!(
                    model = %self.model,
                    elapsed_ms = start_time.elapsed().as_millis(),
                    prompt_length = prompt.len(),
                    "Gemini completion succeeded"
                );
                Ok(text)
            }
            Err(e) => {
                let error = AiError::from_provider_message(e.to_string());
                tracing::error!(
                    model = %self.model,
                    elapsed_ms = start_time.elapsed().as_millis(),
                    prompt_length = prompt.len(),
                    error = %error,
                    "Gemini completion failed"
                );
                Err(error)
            }
        }
    }
}

/// Factory producing Gemini-backed generators
pub struct GeminiFactory {
    model: String,
}

impl GeminiFactory {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

impl GeneratorFactory for GeminiFactory {
    fn build(&self, api_key: &str) -> Result<Arc<dyn TextGenerator>, AiError> {
        Ok(Arc::new(LlmClient::new(api_key, &self.model)?))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted generators for service tests

    use super::*;
    use std::sync::Mutex;

    /// Returns a fixed reply (or error message) and records prompts
    pub struct ScriptedGenerator {
        reply: Result<String, String>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        pub fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        pub fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(message.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn complete(&self, _preamble: &str, prompt: &str) -> Result<String, AiError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply
                .clone()
                .map_err(AiError::from_provider_message)
        }
    }

    /// Hands out the same scripted generator for every key
    pub struct ScriptedFactory(pub Arc<ScriptedGenerator>);

    impl GeneratorFactory for ScriptedFactory {
        fn build(&self, _api_key: &str) -> Result<Arc<dyn TextGenerator>, AiError> {
            Ok(self.0.clone())
        }
    }
}
