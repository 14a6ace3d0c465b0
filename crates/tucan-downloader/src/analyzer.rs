//! Drives the LLM analysis for one downloaded article and persists the
//! outcome.

use tracing::{debug, error, info};

use tucan_agent::{categorize_article, session_id, summarize_article, Runner};
use tucan_core::config::Settings;
use tucan_core::trigger::TriggerSchedule;
use tucan_core::types::{
    SUMMARY_LANG, TRANSLATION_LANG, TRANSLATION_LANGUAGE, UNKNOWN_CATEGORY,
};
use tucan_core::{files, Relation};
use tucan_store::{analysis, Article, Store, Verdict};

use crate::error::{DownloadError, Result};

/// Analyze one article with a stored body.
///
/// Unless `force` is set, articles older than the previous trigger are left
/// alone: they can no longer be notified about, so no LLM budget is spent on
/// them. An existing non-failed verdict with summaries also ends the job
/// early; a failed one is redone.
pub async fn analyze(
    store: &Store,
    runner: &Runner,
    settings: &Settings,
    schedule: &TriggerSchedule,
    article: &Article,
    force: bool,
) -> Result<()> {
    if !force {
        let info = schedule.now();
        if article.timestamp < info.previous {
            debug!(
                article_id = article.id,
                timestamp = %article.timestamp,
                previous = %info.previous,
                "article predates the notification window, not analyzing"
            );
            return Ok(());
        }
    }

    let existing = store.with_conn(|conn| analysis::get_verdict(conn, article.id))?;
    if let Some(existing) = existing {
        if !existing.failed {
            let has_summaries =
                store.with_conn(|conn| analysis::has_summaries(conn, article.id))?;
            if existing.skipped || has_summaries {
                info!(article_id = article.id, "article already analyzed");
                return Ok(());
            }
        }
    }

    match run_pipeline(store, runner, settings, article).await {
        Ok(()) => Ok(()),
        Err(e) => {
            record_failure(store, article);
            Err(e)
        }
    }
}

async fn run_pipeline(
    store: &Store,
    runner: &Runner,
    settings: &Settings,
    article: &Article,
) -> Result<()> {
    if article.body_path.is_empty() {
        return Err(DownloadError::MissingBody(article.id));
    }
    let content = std::fs::read_to_string(&article.body_path)
        .map_err(tucan_core::CoreError::from)?;

    let (catalog, ignored) = store.with_conn(|conn| {
        Ok::<_, tucan_store::StoreError>((
            analysis::active_catalog(conn)?,
            analysis::ignored_categories(conn)?,
        ))
    })?;

    let session = session_id(article.id);

    let outcome = categorize_article(runner, &content, &catalog, &session).await?;

    // A freshly minted category lands in its own transaction so the catalog
    // keeps it even if the rest of this article's analysis fails.
    let is_known = outcome.category == UNKNOWN_CATEGORY
        || catalog.iter().any(|(name, _)| *name == outcome.category);
    if !is_known {
        store.with_tx(|tx| {
            analysis::insert_smart_category(tx, &outcome.category, &outcome.description)
        })?;
    }

    let should_skip =
        outcome.relation == Relation::Na || ignored.contains(&outcome.category);
    let verdict = Verdict {
        article_id: article.id,
        timestamp: article.timestamp,
        relation: outcome.relation,
        category: outcome.category.clone(),
        skipped: should_skip,
        failed: false,
    };

    if should_skip {
        store.with_tx(|tx| analysis::upsert_verdict(tx, &verdict))?;
        info!(
            article_id = article.id,
            relation = %outcome.relation,
            category = %outcome.category,
            "article skipped by analysis"
        );
        return Ok(());
    }

    let summary = summarize_article(runner, &content, TRANSLATION_LANGUAGE, &session).await?;

    // Files first; rows referencing them commit afterwards. On a rollback
    // the orphan files are harmless because nothing points at them.
    let en_path = files::save_summary(
        &settings.data_dir,
        article.timestamp,
        article.id,
        SUMMARY_LANG,
        &summary.summary,
    )?;
    let ru_path = files::save_summary(
        &settings.data_dir,
        article.timestamp,
        article.id,
        TRANSLATION_LANG,
        &summary.translated_summary,
    )?;

    store.with_tx(|tx| -> tucan_store::Result<()> {
        analysis::insert_summary(tx, article.id, SUMMARY_LANG, &en_path.to_string_lossy())?;
        analysis::insert_summary(tx, article.id, TRANSLATION_LANG, &ru_path.to_string_lossy())?;
        analysis::upsert_verdict(tx, &verdict)?;
        Ok(())
    })?;

    info!(
        article_id = article.id,
        category = %outcome.category,
        "article analyzed"
    );
    Ok(())
}

/// Best-effort failure marker in its own transaction; the article becomes
/// eligible for reanalysis (failed verdicts are redone).
fn record_failure(store: &Store, article: &Article) {
    let verdict = Verdict {
        article_id: article.id,
        timestamp: article.timestamp,
        relation: Relation::Na,
        category: UNKNOWN_CATEGORY.to_string(),
        skipped: false,
        failed: true,
    };
    if let Err(e) = store.with_tx(|tx| analysis::upsert_verdict(tx, &verdict)) {
        error!(article_id = article.id, "failed to record analysis failure: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use tucan_agent::provider::{GenerateRequest, LlmProvider};
    use tucan_agent::ProviderError;
    use tucan_core::SITE_TZ;
    use tucan_store::seed::seed_smart_categories;
    use tucan_store::{articles, NewArticle};

    struct ScriptedProvider {
        responses: Mutex<VecDeque<String>>,
        calls: Mutex<usize>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<&str>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into_iter().map(String::from).collect()),
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, _req: &GenerateRequest) -> std::result::Result<String, ProviderError> {
            *self.calls.lock().unwrap() += 1;
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ProviderError::Parse("script exhausted".into()))
        }
    }

    struct Fixture {
        store: Store,
        settings: Settings,
        schedule: TriggerSchedule,
        article: Article,
        _dir: tempfile::TempDir,
    }

    fn fixture(timestamp: chrono::DateTime<chrono_tz::Tz>) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.data_dir = dir.path().to_path_buf();

        let store = Store::open_in_memory().unwrap();
        store
            .with_conn(|conn| -> tucan_store::Result<()> {
                seed_smart_categories(conn)?;
                articles::insert_if_absent(
                    conn,
                    &NewArticle {
                        id: 7,
                        url: "https://example.cr/n/7".into(),
                        timestamp,
                    },
                )?;
                Ok(())
            })
            .unwrap();

        let body = files::save_article(dir.path(), timestamp, 7, "Titular", "Cuerpo.").unwrap();
        store
            .with_conn(|conn| articles::set_body_path(conn, 7, &body.to_string_lossy()))
            .unwrap();
        let article = store.with_conn(|conn| articles::get(conn, 7)).unwrap().unwrap();

        let schedule = TriggerSchedule::new(
            settings.news_notifier_trigger_times.clone(),
            settings.check_updates_interval,
        )
        .unwrap();

        Fixture {
            store,
            settings,
            schedule,
            article,
            _dir: dir,
        }
    }

    fn runner_with(provider: Arc<ScriptedProvider>, settings: &Settings) -> Runner {
        Runner::with_provider(provider, settings, tucan_core::Shutdown::new()).unwrap()
    }

    #[tokio::test]
    async fn unrelated_article_gets_a_skipped_sentinel_verdict() {
        let fx = fixture(Utc::now().with_timezone(&SITE_TZ));
        let provider =
            ScriptedProvider::new(vec![r#"{"a_chain_of_thought":"x","b_related":"na"}"#]);
        let runner = runner_with(provider.clone(), &fx.settings);

        analyze(&fx.store, &runner, &fx.settings, &fx.schedule, &fx.article, true)
            .await
            .unwrap();

        let verdict = fx
            .store
            .with_conn(|conn| analysis::get_verdict(conn, 7))
            .unwrap()
            .unwrap();
        assert_eq!(verdict.relation, Relation::Na);
        assert_eq!(verdict.category, UNKNOWN_CATEGORY);
        assert!(verdict.skipped);
        assert!(!verdict.failed);
        // Exactly one LLM call and no summaries.
        assert_eq!(provider.calls(), 1);
        assert!(!fx
            .store
            .with_conn(|conn| analysis::has_summaries(conn, 7))
            .unwrap());
    }

    #[tokio::test]
    async fn successful_analysis_writes_verdict_and_both_summaries() {
        let fx = fixture(Utc::now().with_timezone(&SITE_TZ));
        let provider = ScriptedProvider::new(vec![
            r#"{"a_chain_of_thought":"x","b_related":"directly"}"#,
            r#"{"a_chain_of_thought":"x","b_no_category":false,
                "c_existing_categories_list":[{"a_category":"weather","b_rank":97}]}"#,
            r#"{"a_news_analysis":{},"b_news_summary":"Heavy rain expected."}"#,
            r#"{"translated_summary":"Ожидаются сильные дожди."}"#,
        ]);
        let runner = runner_with(provider.clone(), &fx.settings);

        analyze(&fx.store, &runner, &fx.settings, &fx.schedule, &fx.article, true)
            .await
            .unwrap();

        let verdict = fx
            .store
            .with_conn(|conn| analysis::get_verdict(conn, 7))
            .unwrap()
            .unwrap();
        assert_eq!(verdict.category, "weather");
        assert!(!verdict.skipped && !verdict.failed);

        let ru = fx
            .store
            .with_conn(|conn| analysis::summary_path(conn, 7, "ru"))
            .unwrap()
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(ru).unwrap(),
            "Ожидаются сильные дожди."
        );
        assert!(fx
            .store
            .with_conn(|conn| analysis::summary_path(conn, 7, "en"))
            .unwrap()
            .is_some());
        assert_eq!(provider.calls(), 4);
    }

    #[tokio::test]
    async fn ignored_category_skips_summarization() {
        let fx = fixture(Utc::now().with_timezone(&SITE_TZ));
        let provider = ScriptedProvider::new(vec![
            r#"{"a_chain_of_thought":"x","b_related":"directly"}"#,
            r#"{"a_chain_of_thought":"x","b_no_category":false,
                "c_existing_categories_list":[{"a_category":"crime","b_rank":99}]}"#,
        ]);
        let runner = runner_with(provider.clone(), &fx.settings);

        analyze(&fx.store, &runner, &fx.settings, &fx.schedule, &fx.article, true)
            .await
            .unwrap();

        let verdict = fx
            .store
            .with_conn(|conn| analysis::get_verdict(conn, 7))
            .unwrap()
            .unwrap();
        assert_eq!(verdict.category, "crime");
        assert_eq!(verdict.relation, Relation::Directly);
        assert!(verdict.skipped);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn pipeline_failure_records_a_failed_verdict() {
        let fx = fixture(Utc::now().with_timezone(&SITE_TZ));
        // Classifier answer is unusable garbage.
        let provider = ScriptedProvider::new(vec!["not json at all"]);
        let runner = runner_with(provider.clone(), &fx.settings);

        let result =
            analyze(&fx.store, &runner, &fx.settings, &fx.schedule, &fx.article, true).await;
        assert!(result.is_err());

        let verdict = fx
            .store
            .with_conn(|conn| analysis::get_verdict(conn, 7))
            .unwrap()
            .unwrap();
        assert!(verdict.failed);
    }

    #[tokio::test]
    async fn article_exactly_at_the_previous_trigger_is_still_analyzed() {
        let now = Utc::now().with_timezone(&SITE_TZ);
        let schedule = TriggerSchedule::new(
            Settings::default().news_notifier_trigger_times,
            Settings::default().check_updates_interval,
        )
        .unwrap();
        let fx = fixture(schedule.info_at(now).previous);
        let provider =
            ScriptedProvider::new(vec![r#"{"a_chain_of_thought":"x","b_related":"na"}"#]);
        let runner = runner_with(provider.clone(), &fx.settings);

        analyze(&fx.store, &runner, &fx.settings, &fx.schedule, &fx.article, false)
            .await
            .unwrap();

        // The cutoff is strict: equality is inside the analyzable range.
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn stale_articles_are_not_analyzed_without_force() {
        let old = Utc::now().with_timezone(&SITE_TZ) - Duration::days(7);
        let fx = fixture(old);
        let provider = ScriptedProvider::new(vec![]);
        let runner = runner_with(provider.clone(), &fx.settings);

        analyze(&fx.store, &runner, &fx.settings, &fx.schedule, &fx.article, false)
            .await
            .unwrap();

        assert_eq!(provider.calls(), 0);
        assert!(fx
            .store
            .with_conn(|conn| analysis::get_verdict(conn, 7))
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn new_category_survives_even_when_summarization_fails() {
        let fx = fixture(Utc::now().with_timezone(&SITE_TZ));
        let provider = ScriptedProvider::new(vec![
            r#"{"a_chain_of_thought":"x","b_related":"directly"}"#,
            r#"{"a_chain_of_thought":"x","b_no_category":true,"c_existing_categories_list":[]}"#,
            r#"{"a_chain_of_thought":"x","b_category":"economy/banking","d_category_description":"Bank news"}"#,
            // Summarizer answer is garbage; the article fails afterwards.
            "garbage",
        ]);
        let runner = runner_with(provider.clone(), &fx.settings);

        let result =
            analyze(&fx.store, &runner, &fx.settings, &fx.schedule, &fx.article, true).await;
        assert!(result.is_err());

        // The minted category outlives the failed article.
        let category = fx
            .store
            .with_conn(|conn| analysis::get_smart_category(conn, "economy/banking"))
            .unwrap();
        assert!(category.is_some());
        let verdict = fx
            .store
            .with_conn(|conn| analysis::get_verdict(conn, 7))
            .unwrap()
            .unwrap();
        assert!(verdict.failed);
    }

    #[test]
    fn record_failure_writes_a_failed_sentinel_verdict() {
        let store = Store::open_in_memory().unwrap();
        let timestamp = SITE_TZ.with_ymd_and_hms(2025, 2, 13, 9, 0, 0).unwrap();
        store
            .with_conn(|conn| -> tucan_store::Result<()> {
                seed_smart_categories(conn)?;
                articles::insert_if_absent(
                    conn,
                    &NewArticle {
                        id: 1,
                        url: "https://example.cr/n/1".into(),
                        timestamp,
                    },
                )?;
                Ok(())
            })
            .unwrap();

        let article = store
            .with_conn(|conn| articles::get(conn, 1))
            .unwrap()
            .unwrap();
        record_failure(&store, &article);

        let verdict = store
            .with_conn(|conn| analysis::get_verdict(conn, 1))
            .unwrap()
            .unwrap();
        assert!(verdict.failed);
        assert!(!verdict.skipped);
        assert_eq!(verdict.category, UNKNOWN_CATEGORY);
        assert_eq!(verdict.timestamp, timestamp);
    }
}
