//! Orchestration of the multi-agent analysis:
//! classify → label → name → finalize for the category, then
//! summarize → translate for the channel text.

use tracing::warn;

use tucan_core::types::{UNKNOWN_CATEGORY, UNKNOWN_CATEGORY_DESCRIPTION};
use tucan_core::Relation;

use crate::agents::{classifier, finalizer, labeler, namer, summarizer, translator};
use crate::error::ResponseError;
use crate::runner::Runner;

/// A labeler suggestion above this rank is accepted without finalization.
const HIGH_RANK: u32 = 95;

/// Category decision for one article.
#[derive(Debug, Clone)]
pub struct CategoryOutcome {
    pub relation: Relation,
    pub category: String,
    /// Description of the category; used when the category is new.
    pub description: String,
}

/// Summary pair for one article.
#[derive(Debug, Clone)]
pub struct SummaryOutcome {
    pub summary: String,
    pub translated_summary: String,
}

fn description_of(existing: &[(String, String)], category: &str) -> String {
    existing
        .iter()
        .find(|(name, _)| name == category)
        .map(|(_, description)| description.clone())
        .unwrap_or_default()
}

/// Determine the article's relation and smart category.
///
/// Articles unrelated to Costa Rica short-circuit after the first call with
/// the sentinel category. A labeler suggestion ranked above [`HIGH_RANK`]
/// wins immediately; otherwise the namer's proposal competes with the
/// suggestions in the finalizer.
pub async fn categorize_article(
    runner: &Runner,
    article: &str,
    existing: &[(String, String)],
    session_id: &str,
) -> Result<CategoryOutcome, ResponseError> {
    let classified = classifier::run(runner, article, session_id).await?;
    if classified.relation == Relation::Na {
        return Ok(CategoryOutcome {
            relation: Relation::Na,
            category: UNKNOWN_CATEGORY.to_string(),
            description: UNKNOWN_CATEGORY_DESCRIPTION.to_string(),
        });
    }

    let labeled = labeler::run(runner, article, existing, session_id).await?;
    if let Some(high) = labeled.suggestions.iter().find(|s| s.rank > HIGH_RANK) {
        return Ok(CategoryOutcome {
            relation: classified.relation,
            category: high.category.clone(),
            description: description_of(existing, &high.category),
        });
    }

    let named = namer::run(runner, article, session_id).await?;
    if labeled.no_category {
        return Ok(CategoryOutcome {
            relation: classified.relation,
            category: named.category,
            description: named.description,
        });
    }

    // Only categories the labeler actually suggested compete with the
    // proposal; hallucinated names fall out here.
    let suggested: Vec<(String, String)> = labeled
        .suggestions
        .iter()
        .filter_map(|s| {
            let found = existing.iter().find(|(name, _)| *name == s.category);
            if found.is_none() {
                warn!(category = %s.category, "labeler suggested an unknown category");
            }
            found.cloned()
        })
        .collect();

    let finalized = finalizer::run(
        runner,
        article,
        &suggested,
        (&named.category, &named.description),
        session_id,
    )
    .await?;

    let description = if finalized.new_chosen {
        named.description
    } else {
        description_of(existing, &finalized.category)
    };
    Ok(CategoryOutcome {
        relation: classified.relation,
        category: finalized.category,
        description,
    })
}

/// Produce the English summary and its translation.
pub async fn summarize_article(
    runner: &Runner,
    article: &str,
    target_language: &str,
    session_id: &str,
) -> Result<SummaryOutcome, ResponseError> {
    let summarized = summarizer::run(runner, article, session_id).await?;
    let translated = translator::run(
        runner,
        article,
        &summarized.news_summary,
        target_language,
        session_id,
    )
    .await?;
    Ok(SummaryOutcome {
        summary: summarized.news_summary,
        translated_summary: translated.translated_summary,
    })
}
