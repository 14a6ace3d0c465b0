use thiserror::Error;

/// Transport-level failure talking to an LLM backend.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited upstream (retry after {retry_after_ms}ms)")]
    RateLimited { retry_after_ms: u64 },

    #[error("Unparseable response body: {0}")]
    Parse(String),

    #[error("Unexpected finish reason: {0}")]
    UnexpectedFinish(String),

    #[error("Interrupted by shutdown")]
    Interrupted,
}

/// Failure of one agent invocation. Aborts the current article's analysis,
/// never the worker.
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("LLM engine responded with: {0}")]
    Engine(String),

    #[error("Failed to deserialize agent response: {0}")]
    Deserialize(String),
}

impl From<ProviderError> for ResponseError {
    fn from(e: ProviderError) -> Self {
        ResponseError::Engine(e.to_string())
    }
}

/// Misconfiguration detected while wiring the agent stack. Fatal at startup.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Agent configuration error: {0}")]
    Config(String),
}
