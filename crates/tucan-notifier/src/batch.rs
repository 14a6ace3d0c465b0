//! One notifier sweep over the current window.

use tracing::{error, info, warn};

use tucan_core::config::Settings;
use tucan_core::trigger::TriggerInfo;
use tucan_core::types::TRANSLATION_LANG;
use tucan_core::Shutdown;
use tucan_store::{analysis, delivery, Store};

use crate::error::Result;
use crate::format::{format_message, NewsMessage};
use crate::send::ChannelSender;

/// Sweep analyzed articles inside `[shifted_previous, now]`, send the new
/// ones, and record each delivery as it goes out.
pub async fn run_batch(
    store: &Store,
    sender: &ChannelSender,
    info: &TriggerInfo,
    settings: &Settings,
    shutdown: &Shutdown,
) -> Result<()> {
    let bound = info.shifted_previous;
    info!(window_start = %bound, "processing notification batch");

    // Retention follows the same widened bound as selection, or a slow
    // downloader could resurrect an already-sent article next window.
    let purged = store.with_tx(|tx| delivery::purge_before(tx, &bound))?;
    if purged > 0 {
        info!(count = purged, "purged pre-window delivery records");
    }

    let sent_ids = store.with_conn(|conn| delivery::ids_since(conn, &bound))?;
    info!(count = sent_ids.len(), "already delivered in this window");

    let candidates =
        store.with_conn(|conn| delivery::candidates(conn, &bound, &sent_ids))?;
    info!(count = candidates.len(), "candidates to send");

    for candidate in candidates {
        if shutdown.is_requested() {
            break;
        }
        let started = tokio::time::Instant::now();

        let summary_path = store.with_conn(|conn| {
            analysis::summary_path(conn, candidate.article_id, TRANSLATION_LANG)
        })?;
        let Some(summary_path) = summary_path else {
            warn!(
                article_id = candidate.article_id,
                lang = TRANSLATION_LANG,
                "no summary recorded for candidate, skipping"
            );
            continue;
        };
        let summary = match std::fs::read_to_string(&summary_path) {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                error!(
                    article_id = candidate.article_id,
                    path = %summary_path,
                    "failed to read summary file: {e}"
                );
                continue;
            }
        };

        let message = format_message(&NewsMessage {
            timestamp: candidate.timestamp,
            url: candidate.url.clone(),
            category: candidate.category.clone(),
            summary,
        });

        if sender.send(&message).await {
            store.with_tx(|tx| {
                delivery::record(tx, candidate.article_id, &candidate.timestamp)
            })?;
            info!(article_id = candidate.article_id, "article delivered");
        }
        // Not recorded on failure: the article stays eligible for the rest
        // of the window.

        // Keep overall pacing steady even when the send itself was slow.
        let elapsed = started.elapsed();
        if let Some(remaining) = settings.messages_delay().checked_sub(elapsed) {
            shutdown.sleep(remaining).await;
        }
    }

    Ok(())
}
