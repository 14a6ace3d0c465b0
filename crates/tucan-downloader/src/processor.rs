//! One downloader iteration: select a chunk, resolve upstream categories,
//! download bodies, hand finished articles to the analyzer.

use tracing::{error, info, warn};

use tucan_agent::Runner;
use tucan_core::config::Settings;
use tucan_core::trigger::TriggerSchedule;
use tucan_core::{files, Shutdown};
use tucan_store::{articles, Store};

use crate::analyzer;
use crate::error::Result;
use crate::fetch::{ArticleFetcher, FetchError};

/// Process up to `downloads_chunk_size` pending articles, each in its own
/// transaction.
pub async fn process_chunk(
    store: &Store,
    fetcher: &dyn ArticleFetcher,
    runner: &Runner,
    settings: &Settings,
    schedule: &TriggerSchedule,
    shutdown: &Shutdown,
) -> Result<()> {
    let watermark = schedule.now().shifted_previous;
    let chunk = store.with_conn(|conn| {
        articles::pending_chunk(conn, &watermark, settings.downloads_chunk_size)
    })?;
    if chunk.is_empty() {
        info!("no articles to process");
        return Ok(());
    }

    let ids: Vec<i64> = chunk.iter().map(|a| a.id).collect();
    let categories = store.with_conn(|conn| articles::category_paths(conn, &ids))?;

    info!(count = chunk.len(), "processing article chunk");

    for mut article in chunk {
        if shutdown.is_requested() {
            break;
        }

        // Upstream-category filter: never downloaded, never analyzed.
        if let Some(category) = categories.get(&article.id) {
            if settings.ignore_categories.contains(category) {
                info!(
                    article_id = article.id,
                    category = %category,
                    "skipping article in ignored upstream category"
                );
                store.with_tx(|tx| articles::mark_skipped(tx, article.id))?;
                continue;
            }
        }

        match fetcher.fetch(&article.url).await {
            Ok(fetched) => {
                let path = files::save_article(
                    &settings.data_dir,
                    article.timestamp,
                    article.id,
                    &fetched.title,
                    &fetched.markdown,
                )?;
                let path = path.to_string_lossy().into_owned();
                let updated =
                    store.with_tx(|tx| articles::set_body_path(tx, article.id, &path))?;
                if !updated {
                    // Lost a race against another worker; leave it be.
                    warn!(article_id = article.id, "article no longer pending, skipping");
                    continue;
                }
                article.body_path = path;
            }
            Err(e) => {
                match e {
                    FetchError::Download(ref reason) => {
                        error!(article_id = article.id, "failed to download article: {reason}")
                    }
                    FetchError::Parse(ref reason) => {
                        error!(article_id = article.id, "failed to parse article: {reason}")
                    }
                }
                store.with_tx(|tx| articles::mark_failed(tx, article.id))?;
                continue;
            }
        }

        if let Err(e) =
            analyzer::analyze(store, runner, settings, schedule, &article, false).await
        {
            // Analysis failures never stop the chunk.
            error!(article_id = article.id, "failed to analyze article: {e}");
        }
    }
    Ok(())
}
