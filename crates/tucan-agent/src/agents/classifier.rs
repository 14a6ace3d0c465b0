//! Decides whether an article relates to Costa Rica at all.

use serde::Deserialize;
use tracing::info;

use tucan_core::Relation;

use crate::error::ResponseError;
use crate::runner::{AgentSpec, ModelTier, Runner};
use crate::schema::Schema;

use super::parse_wire;

const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 16384;

const SYSTEM_PROMPT: &str = r#"
Identify whether the given news is related to Costa Rica.

## Process
1. Read the original article carefully.
2. Decide if the news is related to Costa Rica directly, indirectly, or not related at all:
   - **Directly**: Explicit mention of Costa Rica (e.g., locations, people, institutions).
   - **Indirectly**: Clear, stated impact on Costa Rica (e.g., "Costa Rican investors affected" or "event postponed in Costa Rica"). Never classify as "indirectly related" solely because a topic is globally relevant (e.g., domestic violence, climate change).
   - **na**: No mention of Costa Rica or Costa Rican entities and no logical connection stated in the text.
   - **Critical Rule**: Only use explicit information; do not assume unstated connections (e.g., tours, regional effects).
3. Evaluate your response by assessing its accuracy and adherence to guidelines, scoring it between 0 and 100, with 100 being the highest score.
4. Reflect on potential improvements to enhance your evaluation score up to 95-100.
5. Revise your answer accordingly.

## Output format

- Provide JSON output following the specified schema.
- Ensure all fields are present and correctly formatted.
- DON'T ADD any introductory text or comments before the JSON; adherence is mandatory to avoid penalties.

Schema Description:
- 'a_chain_of_thought': A detailed, step-by-step evaluation in English of why the news article is related to Costa Rica, quote the exact text proving the relation or state "No mention of Costa Rica" if none exists.
- 'b_related': Whether the news article is related to Costa Rica. Possible values: "directly," "indirectly," "na" (not applicable).

## Output examples
Example #1:
{"a_chain_of_thought":"Reasoning to conclude about the news relation to Costa Rica","b_related":"directly"}

Example #2:
{"a_chain_of_thought":"Reasoning to conclude about the news relation to Costa Rica","b_related":"na"}
"#;

fn schema() -> Schema {
    Schema::object(vec![
        ("a_chain_of_thought", Schema::String),
        ("b_related", Schema::String),
    ])
}

fn spec() -> AgentSpec {
    AgentSpec {
        agent_id: "classifier",
        tier: ModelTier::Basic,
        temperature: TEMPERATURE,
        max_tokens: MAX_TOKENS,
        system: SYSTEM_PROMPT.to_string(),
        schema: schema(),
    }
}

#[derive(Debug, Deserialize)]
struct Wire {
    b_related: String,
}

#[derive(Debug, Clone, Copy)]
pub struct Classified {
    pub relation: Relation,
}

pub async fn run(
    runner: &Runner,
    article: &str,
    session_id: &str,
) -> Result<Classified, ResponseError> {
    info!("classifying article relation to Costa Rica");
    let raw = runner.run(&spec(), session_id, article).await?;
    parse(&raw)
}

fn parse(raw: &str) -> Result<Classified, ResponseError> {
    let wire: Wire = parse_wire(raw)?;
    let relation = wire.b_related.parse().map_err(ResponseError::Deserialize)?;
    Ok(Classified { relation })
}
