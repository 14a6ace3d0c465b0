use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::provider::{http_client, GenerateRequest, LlmProvider};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const TOP_P: f32 = 0.95;
const TOP_K: u32 = 40;

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: String, base_url: Option<String>, timeout: std::time::Duration) -> Self {
        Self {
            client: http_client(timeout),
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, req: &GenerateRequest) -> Result<String, ProviderError> {
        let body = build_request_body(req);
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, req.model
        );

        debug!(model = %req.model, "sending request to Gemini");

        let resp = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status == 429 {
            let retry = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5000);
            return Err(ProviderError::RateLimited {
                retry_after_ms: retry,
            });
        }
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status, body = %text, "Gemini API error");
            return Err(ProviderError::Api {
                status,
                message: text,
            });
        }

        let api_resp: ApiResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        parse_response(api_resp)
    }
}

fn build_request_body(req: &GenerateRequest) -> serde_json::Value {
    let mut generation_config = serde_json::json!({
        "temperature": req.temperature,
        "topP": TOP_P,
        "topK": TOP_K,
        "maxOutputTokens": req.max_tokens,
    });
    if let Some(ref schema) = req.schema {
        generation_config["responseMimeType"] = serde_json::json!("application/json");
        generation_config["responseSchema"] = schema.to_gemini();
    }

    serde_json::json!({
        "system_instruction": { "parts": [{ "text": req.system }] },
        "contents": [{ "role": "user", "parts": [{ "text": req.user }] }],
        "generationConfig": generation_config,
    })
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(rename = "finishReason", default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

fn parse_response(resp: ApiResponse) -> Result<String, ProviderError> {
    let candidate = resp
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Parse("response carries no candidates".into()))?;

    // Anything but a natural stop (safety block, token cap, recitation)
    // means the text cannot be trusted as a complete structured answer.
    match candidate.finish_reason.as_deref() {
        Some("STOP") => {}
        other => {
            return Err(ProviderError::UnexpectedFinish(
                other.unwrap_or("<missing>").to_string(),
            ))
        }
    }

    let text: String = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();
    if text.is_empty() {
        return Err(ProviderError::Parse("candidate carries no text".into()));
    }
    Ok(text)
}
