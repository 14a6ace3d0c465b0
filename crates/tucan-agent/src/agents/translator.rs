//! Translates the English summary into the channel language.

use serde::Deserialize;
use tracing::info;

use crate::error::ResponseError;
use crate::runner::{AgentSpec, ModelTier, Runner};
use crate::schema::Schema;

use super::parse_wire;

const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 8192;

const SYSTEM_PROMPT: &str = r#"
You are a professional translator from English to {language} working for a Telegram channel with recognition of the Society of Editors' prestigious Media Freedom Awards. The channel publishes announcements for news related to Costa Rica. The audience of the channel consists of {language}-speaking expats aged 25-45 who recently moved to Costa Rica.

Your task is to translate the summary of the news article into {language}.

You will receive from another editor the news summary in the following JSON format:
```json
{
  "original_article": "The original article text in Spanish",
  "summary": "The summary of the article in English"
}
```
Translate the summary, ensuring it is clear and accurate while retaining the meaning and tone of the original article.

The output must follow the schema provided. Ensure that all fields are present and correctly formatted.
Here is a description of the schema's fields:
- 'translated_summary': The translation of the summary into {language}
"#;

fn schema() -> Schema {
    Schema::object(vec![("translated_summary", Schema::String)])
}

fn spec(language: &str) -> AgentSpec {
    AgentSpec {
        agent_id: "translator",
        tier: ModelTier::Light,
        temperature: TEMPERATURE,
        max_tokens: MAX_TOKENS,
        system: SYSTEM_PROMPT.replace("{language}", language),
        schema: schema(),
    }
}

#[derive(Debug, Deserialize)]
struct Wire {
    translated_summary: String,
}

#[derive(Debug, Clone)]
pub struct Translated {
    pub translated_summary: String,
}

/// Translate `summary` into `language`; the original article rides along as
/// context in the work-item envelope.
pub async fn run(
    runner: &Runner,
    article: &str,
    summary: &str,
    language: &str,
    session_id: &str,
) -> Result<Translated, ResponseError> {
    info!(language, "translating summary");
    let envelope = serde_json::json!({
        "original_article": article,
        "summary": summary,
    })
    .to_string();
    let raw = runner.run(&spec(language), session_id, &envelope).await?;
    let wire: Wire = parse_wire(&raw)?;
    Ok(Translated {
        translated_summary: wire.translated_summary,
    })
}
