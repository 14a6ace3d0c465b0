use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use tucan_core::config::{Engine, Settings};

use crate::error::{AgentError, ProviderError};
use crate::gemini::GeminiProvider;
use crate::openai::OpenAiProvider;
use crate::schema::Schema;

/// One structured generation request: system prompt, user text, sampling
/// parameters, and the expected response shape.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// When present, the backend is asked for JSON conforming to this shape.
    pub schema: Option<Schema>,
}

/// Common interface over the configured LLM backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Send one request and return the raw response text. Protocol problems
    /// (bad status, unexpected finish reason) surface as typed errors and
    /// are never retried here.
    async fn generate(&self, req: &GenerateRequest) -> Result<String, ProviderError>;
}

/// Build the provider selected by `AGENT_ENGINE`. A missing API key is a
/// fatal configuration error.
pub fn build_provider(settings: &Settings) -> Result<Arc<dyn LlmProvider>, AgentError> {
    if settings.agent_engine_api_key.is_empty() {
        return Err(AgentError::Config("AGENT_ENGINE_API_KEY is not set".into()));
    }
    let timeout = settings.request_timeout();
    Ok(match settings.agent_engine {
        Engine::Gemini => Arc::new(GeminiProvider::new(
            settings.agent_engine_api_key.clone(),
            None,
            timeout,
        )),
        Engine::OpenAi => Arc::new(OpenAiProvider::new(
            settings.agent_engine_api_key.clone(),
            None,
            timeout,
        )),
    })
}

pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}
