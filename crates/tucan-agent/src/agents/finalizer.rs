//! Chooses between the labeler's suggestions and the namer's proposal.
//!
//! Category names are obfuscated before they reach the model and the answer
//! is translated back, so the choice cannot lean on familiar strings.

use serde::Deserialize;
use tracing::info;

use crate::error::ResponseError;
use crate::obfuscate::ObfuscationMap;
use crate::runner::{AgentSpec, ModelTier, Runner};
use crate::schema::Schema;

use super::{de_flexible_bool, labeler::render_catalog, parse_wire};

const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 8192;

const SYSTEM_PROMPT: &str = r#"
Identify the category of the given news.

## Process
1. Read the original article carefully.
2. Review the list of existing news categories.
   - Compare the article to each existing category.
   - **Important**: If the new category is only slightly different (i.e., it does not offer a clearly distinguishable scope) from an existing category, you must choose the existing category instead.
3. Determine if the new category is necessary. Only select the new category if it represents a significantly different or clearly distinct classification that cannot be covered by any of the existing categories.
4. Resolve ties in favor of existing categories. If two or more categories are equally applicable, pick the one that already exists to avoid unnecessary proliferation.
5. Evaluate your response by assessing its accuracy and adherence to guidelines, scoring it between 0 and 100, with 100 being the highest score.
6. Revise your answer accordingly.

###EXISTING CATEGORIES LIST###
{existing_categories_list}
###END OF EXISTING CATEGORIES LIST###

###NEW CATEGORY###
{new_category}: {new_category_description}
###END OF NEW CATEGORY###

## Output format

- Provide JSON output following the specified schema.
- Ensure all fields are present and correctly formatted.
- DON'T ADD any introductory text or comments before the JSON; adherence is mandatory to avoid penalties.

Schema Description:
- 'a_chain_of_thought': A detailed, step-by-step evaluation in English of which category the news article fits the best into.
- 'b_new_chosen': False, if the chosen category is from the list of existing categories.
- 'c_category': The category that the news article fits the best into.
"#;

fn schema() -> Schema {
    Schema::object(vec![
        ("a_chain_of_thought", Schema::String),
        ("b_new_chosen", Schema::Boolean),
        ("c_category", Schema::String),
    ])
}

fn spec(
    obfuscated_existing: &[(String, String)],
    new_token: &str,
    new_description: &str,
) -> AgentSpec {
    let system = SYSTEM_PROMPT
        .replace(
            "{existing_categories_list}",
            &render_catalog(obfuscated_existing),
        )
        .replace("{new_category}", new_token)
        .replace("{new_category_description}", new_description);
    AgentSpec {
        agent_id: "label_finalizer",
        tier: ModelTier::Basic,
        temperature: TEMPERATURE,
        max_tokens: MAX_TOKENS,
        system,
        schema: schema(),
    }
}

#[derive(Debug, Deserialize)]
struct Wire {
    #[serde(deserialize_with = "de_flexible_bool")]
    b_new_chosen: bool,
    c_category: String,
}

#[derive(Debug, Clone)]
pub struct Finalized {
    pub category: String,
    pub new_chosen: bool,
}

/// Pick the final category for `article` among `suggested` existing
/// categories and the `proposal` (name, description) pair.
pub async fn run(
    runner: &Runner,
    article: &str,
    suggested: &[(String, String)],
    proposal: (&str, &str),
    session_id: &str,
) -> Result<Finalized, ResponseError> {
    info!("finalizing category selection for article");

    let (new_name, new_description) = proposal;
    let (map, obfuscated, new_token) = ObfuscationMap::build(suggested, new_name);

    let raw = runner
        .run(&spec(&obfuscated, &new_token, new_description), session_id, article)
        .await?;
    let wire: Wire = parse_wire(&raw)?;

    let category = map.resolve(&wire.c_category).ok_or_else(|| {
        ResponseError::Deserialize(format!("unknown obfuscated category: {}", wire.c_category))
    })?;
    Ok(Finalized {
        category: category.to_string(),
        new_chosen: wire.b_new_chosen,
    })
}
