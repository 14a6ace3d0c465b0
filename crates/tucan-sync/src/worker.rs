//! The synchronizer: keeps the rolling day current and works through the
//! gap queue, one earliest gap per cycle.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tracing::{error, info, warn};

use tucan_core::config::Settings;
use tucan_core::{Shutdown, SITE_TZ};
use tucan_store::{days, DateRange, Store};

use crate::api::{check_internet, SiteClient};
use crate::error::Result;
use crate::gaps::{handle_day_switch, seed_initial_gaps};
use crate::updater::{apply_day, DayFetch};

const CONNECTIVITY_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Synchronizer {
    store: Store,
    client: SiteClient,
    settings: Settings,
    shutdown: Shutdown,
}

impl Synchronizer {
    pub fn new(store: Store, settings: Settings, shutdown: Shutdown) -> Self {
        let client = SiteClient::new(settings.request_timeout(), settings.max_retries);
        Self {
            store,
            client,
            settings,
            shutdown,
        }
    }

    /// Main loop with period `check_updates_interval`.
    pub async fn run(self) {
        info!("starting metadata synchronizer");

        if let Some(first_day) = self.settings.first_day {
            if let Err(e) =
                seed_initial_gaps(&self.store, first_day, self.settings.days_chunk_size)
            {
                error!("failed to seed initial gaps: {e}");
            }
        }

        let interval = Duration::from_secs(self.settings.check_updates_interval);
        while !self.shutdown.is_requested() {
            if !self.check_connectivity().await {
                warn!("no connectivity, skipping this cycle");
                self.shutdown.sleep(interval).await;
                continue;
            }

            let today = Utc::now().with_timezone(&SITE_TZ).date_naive();
            if let Err(e) = self.cycle(today).await {
                error!("synchronizer cycle failed: {e}");
            }

            if !self.shutdown.sleep(interval).await {
                break;
            }
        }

        info!("metadata synchronizer stopped");
    }

    async fn check_connectivity(&self) -> bool {
        if !check_internet(CONNECTIVITY_PROBE_TIMEOUT).await {
            warn!("no internet connection available");
            return false;
        }
        if !self.client.probe_api().await {
            warn!("index API is not reachable");
            return false;
        }
        true
    }

    /// One iteration: day-switch bookkeeping, the rolling day, one gap.
    async fn cycle(&self, today: NaiveDate) -> Result<()> {
        let today_known = self
            .store
            .with_conn(|conn| days::day_exists(conn, today))?;
        if !today_known {
            handle_day_switch(&self.store, today, self.settings.days_chunk_size)?;
        }

        // The rolling day is re-fetched every cycle, never through a gap.
        if let Err(e) = self.process_date(today).await {
            error!(date = %today, "failed to update current date: {e}");
        }

        self.process_earliest_gap().await;
        Ok(())
    }

    async fn process_date(&self, date: NaiveDate) -> Result<()> {
        let (doc, raw) = self.client.fetch_day_index(date).await?;
        let fetch = DayFetch { date, doc, raw };
        self.store
            .with_tx(|tx| apply_day(tx, &self.settings.data_dir, &fetch))
    }

    /// Fill the earliest gap, all of its days in one transaction; the gap
    /// row goes away only when every day made it in.
    async fn process_earliest_gap(&self) {
        let gap: Option<DateRange> = match self.store.with_conn(days::earliest_gap) {
            Ok(gap) => gap,
            Err(e) => {
                error!("failed to look up earliest gap: {e}");
                return;
            }
        };
        let Some(gap) = gap else { return };

        info!(%gap, "processing earliest gap");

        let mut fetched = Vec::new();
        for date in gap.days() {
            if self.shutdown.is_requested() {
                return;
            }
            match self.client.fetch_day_index(date).await {
                Ok((doc, raw)) => fetched.push(DayFetch { date, doc, raw }),
                Err(e) => {
                    // Transient or not, the gap stays for the next cycle.
                    error!(%gap, %date, "gap day fetch failed: {e}");
                    return;
                }
            }
        }

        let result: Result<()> = self.store.with_tx(|tx| {
            for fetch in &fetched {
                apply_day(tx, &self.settings.data_dir, fetch)?;
            }
            days::delete_gap_covering(tx, gap.start, gap.last_day())?;
            Ok(())
        });
        match result {
            Ok(()) => info!(%gap, "gap processed"),
            Err(e) => error!(%gap, "gap processing failed: {e}"),
        }
    }
}
