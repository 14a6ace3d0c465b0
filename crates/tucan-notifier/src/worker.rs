//! The notifier: wakes on each trigger window and runs one batch.

use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{error, info};

use tucan_core::config::Settings;
use tucan_core::trigger::TriggerSchedule;
use tucan_core::{Shutdown, SITE_TZ};
use tucan_store::Store;

use crate::batch::run_batch;
use crate::error::Result;
use crate::send::ChannelSender;

pub struct Notifier {
    store: Store,
    sender: ChannelSender,
    settings: Settings,
    schedule: TriggerSchedule,
    shutdown: Shutdown,
    /// Wall clock of the last completed run; the distant past initially so
    /// the first loop iteration always runs a batch.
    last_run: DateTime<Tz>,
    connection_lost: bool,
}

impl Notifier {
    pub fn new(
        store: Store,
        settings: Settings,
        schedule: TriggerSchedule,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let sender = ChannelSender::from_settings(&settings)?;
        Ok(Self {
            store,
            sender,
            settings,
            schedule,
            shutdown,
            last_run: DateTime::<Utc>::UNIX_EPOCH.with_timezone(&SITE_TZ),
            connection_lost: false,
        })
    }

    pub async fn run(mut self) {
        info!("starting news notifier");

        while !self.shutdown.is_requested() {
            let now = Utc::now().with_timezone(&SITE_TZ);
            let info = self.schedule.info_at(now);

            if info.current >= self.last_run {
                // A new window has opened since the last completed run.
                if self.sender.probe().await {
                    if self.connection_lost {
                        info!("telegram connection restored");
                        self.connection_lost = false;
                    }
                    self.last_run = now;
                    if let Err(e) = run_batch(
                        &self.store,
                        &self.sender,
                        &info,
                        &self.settings,
                        &self.shutdown,
                    )
                    .await
                    {
                        error!("notification batch failed: {e}");
                    }
                    info!(next = %info.next, "next trigger scheduled");
                } else if !self.connection_lost {
                    // Log the transition once, not every loop turn.
                    error!("failed to connect to telegram");
                    self.connection_lost = true;
                }
            }

            let pause = sleep_duration(
                now,
                info.next,
                self.settings.news_notifier_max_inactivity_interval,
            );
            if !self.shutdown.sleep(pause).await {
                break;
            }
        }

        info!("news notifier stopped");
    }
}

/// Sleep until the next trigger, but never longer than the configured
/// inactivity cap (connectivity recovery must get a chance to run).
fn sleep_duration(now: DateTime<Tz>, next: DateTime<Tz>, max_secs: u64) -> Duration {
    let to_next = (next - now).num_seconds().max(0) as u64;
    Duration::from_secs(to_next.min(max_secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sleep_is_capped_by_the_inactivity_interval() {
        let now = SITE_TZ.with_ymd_and_hms(2025, 2, 13, 6, 1, 0).unwrap();
        let next = SITE_TZ.with_ymd_and_hms(2025, 2, 13, 12, 0, 0).unwrap();
        assert_eq!(sleep_duration(now, next, 300), Duration::from_secs(300));
    }

    #[test]
    fn sleep_shrinks_near_the_trigger() {
        let now = SITE_TZ.with_ymd_and_hms(2025, 2, 13, 11, 58, 0).unwrap();
        let next = SITE_TZ.with_ymd_and_hms(2025, 2, 13, 12, 0, 0).unwrap();
        assert_eq!(sleep_duration(now, next, 300), Duration::from_secs(120));
    }

    #[test]
    fn sleep_never_goes_negative() {
        let now = SITE_TZ.with_ymd_and_hms(2025, 2, 13, 12, 0, 5).unwrap();
        let next = SITE_TZ.with_ymd_and_hms(2025, 2, 13, 12, 0, 0).unwrap();
        assert_eq!(sleep_duration(now, next, 300), Duration::ZERO);
    }
}
