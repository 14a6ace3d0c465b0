//! Proposes a fresh category name and description for an article.

use serde::Deserialize;
use tracing::info;

use crate::error::ResponseError;
use crate::runner::{AgentSpec, ModelTier, Runner};
use crate::schema::Schema;

use super::parse_wire;

const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 8192;

const SYSTEM_PROMPT: &str = r#"
Identify the category of the given news.

## Process
1. Read the original article carefully.
2. Suggest a suitable name for the new category where the article could be placed. The category can be one level, such as "lifestyle," or include sub-categories like "sport/football."
3. Evaluate your suggested category on a scale from 0 to 100, with 100 being the highest score.
4. Consider how you might adjust your approach to improve the evaluation score to between 95 and 100.
5. Revise your answer based on this reflection.

## Output format

- Provide JSON output following the specified schema.
- Ensure all fields are present and correctly formatted.
- DON'T ADD any introductory text or comments before the JSON; adherence is mandatory to avoid penalties.

Schema Description:
- 'a_chain_of_thought': A detailed, step-by-step evaluation in English of why the category was chosen.
- 'b_category': The suggested category name as a string (e.g., "weather" or "sport/baseball"). The category or sub-category must not contain any spaces or special characters. Underscores are allowed.
- 'd_category_description': A concise description of the category for future categorization tasks.

## Output Examples
Example #1:
{
  "a_chain_of_thought":"Reasoning which categories are most applicable for the news article",
  "b_category":"weather",
  "d_category_description":"News related to weather conditions, forecasts, and climate-related events"
}
"#;

fn schema() -> Schema {
    Schema::object(vec![
        ("a_chain_of_thought", Schema::String),
        ("b_category", Schema::String),
        ("d_category_description", Schema::String),
    ])
}

fn spec() -> AgentSpec {
    AgentSpec {
        agent_id: "namer",
        tier: ModelTier::Light,
        temperature: TEMPERATURE,
        max_tokens: MAX_TOKENS,
        system: SYSTEM_PROMPT.to_string(),
        schema: schema(),
    }
}

#[derive(Debug, Deserialize)]
struct Wire {
    b_category: String,
    d_category_description: String,
}

#[derive(Debug, Clone)]
pub struct Named {
    pub category: String,
    pub description: String,
}

pub async fn run(runner: &Runner, article: &str, session_id: &str) -> Result<Named, ResponseError> {
    info!("proposing a new category for article");
    let raw = runner.run(&spec(), session_id, article).await?;
    let wire: Wire = parse_wire(&raw)?;
    Ok(Named {
        category: wire.b_category,
        description: wire.d_category_description,
    })
}
