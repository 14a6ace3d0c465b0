//! The downloader: drains pending articles produced by the synchronizer
//! and feeds them through the analysis pipeline.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use tucan_agent::Runner;
use tucan_core::config::Settings;
use tucan_core::trigger::TriggerSchedule;
use tucan_core::Shutdown;
use tucan_store::Store;
use tucan_sync::api::{check_internet, SiteClient};

use crate::fetch::{ArticleFetcher, HttpArticleFetcher};
use crate::processor::process_chunk;

const CONNECTIVITY_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Downloader {
    store: Store,
    fetcher: Arc<dyn ArticleFetcher>,
    runner: Runner,
    client: SiteClient,
    settings: Settings,
    schedule: TriggerSchedule,
    shutdown: Shutdown,
}

impl Downloader {
    pub fn new(
        store: Store,
        runner: Runner,
        settings: Settings,
        schedule: TriggerSchedule,
        shutdown: Shutdown,
    ) -> Self {
        let fetcher = Arc::new(HttpArticleFetcher::new(settings.request_timeout()));
        let client = SiteClient::new(settings.request_timeout(), settings.max_retries);
        Self {
            store,
            fetcher,
            runner,
            client,
            settings,
            schedule,
            shutdown,
        }
    }

    /// Main loop with period `download_interval`.
    pub async fn run(self) {
        info!("starting news downloader");

        let interval = Duration::from_secs(self.settings.download_interval);
        while !self.shutdown.is_requested() {
            if !self.check_connectivity().await {
                warn!("no connectivity, skipping this cycle");
                self.shutdown.sleep(interval).await;
                continue;
            }

            if let Err(e) = process_chunk(
                &self.store,
                self.fetcher.as_ref(),
                &self.runner,
                &self.settings,
                &self.schedule,
                &self.shutdown,
            )
            .await
            {
                error!("downloader cycle failed: {e}");
            }

            if !self.shutdown.sleep(interval).await {
                break;
            }
        }

        info!("news downloader stopped");
    }

    async fn check_connectivity(&self) -> bool {
        if !check_internet(CONNECTIVITY_PROBE_TIMEOUT).await {
            warn!("no internet connection available");
            return false;
        }
        if !self.client.probe_site().await {
            warn!("news site is not reachable");
            return false;
        }
        true
    }
}
