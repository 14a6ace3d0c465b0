//! Ranks existing catalog categories against an article.

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::error::ResponseError;
use crate::runner::{AgentSpec, ModelTier, Runner};
use crate::schema::Schema;

use super::{de_flexible_bool, de_flexible_u32, parse_wire};

const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 8192;

const SYSTEM_PROMPT: &str = r#"
Identify the category of the given news.

## Process
1. Read the original article carefully.
2. Review the list of existing news categories provided below and determine if the article fits into any of them. Assign a suitability rank for each applicable category on a scale from 0 to 100, where 100 represents perfect applicability. If no suitable category exists, indicate that the category cannot be defined.
  - DON'T assign incorrect categories to the article.
  - DON'T over-rank the categories without strong evidence.
3. Evaluate your response by assessing its accuracy and adherence to guidelines, scoring it between 0 and 100, with 100 being the highest score.
4. Reflect on potential improvements to enhance your evaluation score up to 95-100.
5. Revise your answer accordingly.

###EXISTING CATEGORIES LIST###
{existing_categories}
###END OF EXISTING CATEGORIES LIST###

## Output format

- Provide JSON output following the specified schema.
- Ensure all fields are present and correctly formatted.
- DON'T ADD any introductory text or comments before the JSON; adherence is mandatory to avoid penalties.

Schema Description:
- 'a_chain_of_thought': A detailed, step-by-step evaluation in English of which existing categories the news article could be assigned to.
- 'b_no_category': Indicate if a category cannot be selected ('true' or 'false').
- 'c_existing_categories_list': A list containing up to three elements, representing an applicable category with its suitability rank (0-100). An empty list is used if no category applies. Each element consists of
  - 'a_category'
  - 'b_rank'

## Output Examples
Example #1:
{
  "a_chain_of_thought":"Reasoning regarding the most applicable categories for the news article.",
  "b_no_category":"false",
  "c_existing_categories_list":[{"a_category":"health/children","b_rank":"25"},{"a_category":"incidents","b_rank":"80"},{"a_category":"incidents/roads","b_rank":"99"}]
}

Example #2:
{
  "a_chain_of_thought":"Reasoning that no category can be selected.",
  "b_no_category":"true",
  "c_existing_categories_list":[]
}
"#;

fn schema() -> Schema {
    Schema::object(vec![
        ("a_chain_of_thought", Schema::String),
        ("b_no_category", Schema::Boolean),
        (
            "c_existing_categories_list",
            Schema::array(Schema::object(vec![
                ("a_category", Schema::String),
                ("b_rank", Schema::Integer),
            ])),
        ),
    ])
}

/// Render `name: description` pairs as a pretty JSON object for the prompt.
pub(crate) fn render_catalog(categories: &[(String, String)]) -> String {
    let map: serde_json::Map<String, Value> = categories
        .iter()
        .map(|(name, description)| (name.clone(), Value::String(description.clone())))
        .collect();
    serde_json::to_string_pretty(&Value::Object(map)).unwrap_or_default()
}

fn spec(existing: &[(String, String)]) -> AgentSpec {
    AgentSpec {
        agent_id: "labeler",
        tier: ModelTier::Basic,
        temperature: TEMPERATURE,
        max_tokens: MAX_TOKENS,
        system: SYSTEM_PROMPT.replace("{existing_categories}", &render_catalog(existing)),
        schema: schema(),
    }
}

#[derive(Debug, Deserialize)]
struct WireSuggestion {
    a_category: String,
    #[serde(deserialize_with = "de_flexible_u32")]
    b_rank: u32,
}

#[derive(Debug, Deserialize)]
struct Wire {
    #[serde(deserialize_with = "de_flexible_bool")]
    b_no_category: bool,
    c_existing_categories_list: Vec<WireSuggestion>,
}

#[derive(Debug, Clone)]
pub struct Suggestion {
    pub category: String,
    pub rank: u32,
}

#[derive(Debug, Clone)]
pub struct Labeled {
    pub no_category: bool,
    pub suggestions: Vec<Suggestion>,
}

pub async fn run(
    runner: &Runner,
    article: &str,
    existing: &[(String, String)],
    session_id: &str,
) -> Result<Labeled, ResponseError> {
    info!("ranking existing categories for article");
    let raw = runner.run(&spec(existing), session_id, article).await?;
    parse(&raw)
}

fn parse(raw: &str) -> Result<Labeled, ResponseError> {
    let wire: Wire = parse_wire(raw)?;
    Ok(Labeled {
        no_category: wire.b_no_category,
        suggestions: wire
            .c_existing_categories_list
            .into_iter()
            .map(|s| Suggestion {
                category: s.a_category,
                rank: s.b_rank,
            })
            .collect(),
    })
}
