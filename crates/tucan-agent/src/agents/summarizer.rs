//! Produces the English channel summary of a Spanish article.

use serde::Deserialize;
use tracing::info;

use crate::error::ResponseError;
use crate::runner::{AgentSpec, ModelTier, Runner};
use crate::schema::Schema;

use super::parse_wire;

// Creative stage: unlike the categorization agents, the summarizer samples
// at full temperature.
const TEMPERATURE: f32 = 1.0;
const MAX_TOKENS: u32 = 16384;

const SYSTEM_PROMPT: &str = r#"
You are a content editor for a Telegram channel with recognition of the Society of Editors' prestigious Media Freedom Awards. The channel publishes announcements for news related to Costa Rica. The audience of the channel consists of expats aged 25-45 who recently moved to Costa Rica. Your task is to create concise, easy-to-understand news announcements.

Process:
1. Read the original article.
2. Make the article analysis
3. Compose the summary of the article in English, adhering to these guidelines:
   - Avoid idioms and complex terminology
   - Focus on providing factual information. Avoid exclamations, slogans, calls to action, appeals, expressions of well-wishing (e.g., "Stay healthy!" or "Best wishes to all!"), and words of encouragement or support (e.g., "Wishing our team success!" or "Good luck to all!")
   - Do not include URLs or website links in the final transcription. If necessary, summarize or mention the source without using a URL
   - Use a casual, friendly tone
   - If complex topics or necessary technical terms arise, briefly explain them in simple language

Your goal is to provide the output following the schema provided. Ensure that all fields are present and correctly formatted.
Schema Description:
- 'a_news_analysis' is an object that consists of
  - 'a_mainActor': The primary individual, organization, or entity discussed in the news.
  - 'b_otherActors': A list of additional participants mentioned in the news.
  - 'c_mainAction': The main action, event, or decision described in the news.
  - 'd_additionalActions': A list of supplementary actions or events, if mentioned.
  - 'e_timeOrientation': The temporal focus of the main event. Possible values: "past", "present", "future", or "unspecified".
  - 'f_location': The geographical location or context of the event, or "unspecified".
  - 'g_target': The entity, resource, or group affected by the action or event, or "unspecified".
  - 'h_reason': The rationale or motive behind the action or event, or "unspecified".
  - 'i_consequences': A list of potential outcomes explicitly mentioned in the news, each with a type and a description.
  - 'j_contextBackground': Relevant historical or contextual information, or "unspecified".
  - 'k_keyPoints': A list of essential facts, quotes, or data points mentioned in the news.
  - 'l_sentiment': The overall tone of the news. Possible values: "positive", "negative", "neutral", or "unspecified".
- 'b_news_summary': The final news summary in English.
"#;

fn schema() -> Schema {
    Schema::object(vec![
        (
            "a_news_analysis",
            Schema::object(vec![
                ("a_mainActor", Schema::String),
                ("b_otherActors", Schema::array(Schema::String)),
                ("c_mainAction", Schema::String),
                ("d_additionalActions", Schema::array(Schema::String)),
                ("e_timeOrientation", Schema::String),
                ("f_location", Schema::String),
                ("g_target", Schema::String),
                ("h_reason", Schema::String),
                (
                    "i_consequences",
                    Schema::array(Schema::object(vec![
                        ("a_type", Schema::String),
                        ("b_description", Schema::String),
                    ])),
                ),
                ("j_contextBackground", Schema::String),
                ("k_keyPoints", Schema::array(Schema::String)),
                ("l_sentiment", Schema::String),
            ]),
        ),
        ("b_news_summary", Schema::String),
    ])
}

fn spec() -> AgentSpec {
    AgentSpec {
        agent_id: "summarizer",
        tier: ModelTier::Basic,
        temperature: TEMPERATURE,
        max_tokens: MAX_TOKENS,
        system: SYSTEM_PROMPT.to_string(),
        schema: schema(),
    }
}

#[derive(Debug, Deserialize)]
struct Wire {
    b_news_summary: String,
}

#[derive(Debug, Clone)]
pub struct Summarized {
    pub news_summary: String,
}

pub async fn run(
    runner: &Runner,
    article: &str,
    session_id: &str,
) -> Result<Summarized, ResponseError> {
    info!("summarizing article");
    let raw = runner.run(&spec(), session_id, article).await?;
    let wire: Wire = parse_wire(&raw)?;
    Ok(Summarized {
        news_summary: wire.b_news_summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_summary_field_is_kept() {
        let raw = r#"{
          "a_news_analysis": {"a_mainActor": "ICE", "b_otherActors": []},
          "b_news_summary": "Electricity rates drop by 8.5% from April."
        }"#;
        let wire: Wire = parse_wire(raw).unwrap();
        assert_eq!(wire.b_news_summary, "Electricity rates drop by 8.5% from April.");
    }

    #[test]
    fn analysis_schema_is_nested() {
        let doc = schema().to_gemini();
        assert_eq!(
            doc["properties"]["a_news_analysis"]["properties"]["i_consequences"]["items"]["type"],
            "OBJECT"
        );
    }
}
