use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{CoreError, Result};
use crate::types::SITE_TZ;

/// Trigger instants surrounding a point in time.
///
/// `shifted_previous` is `previous` pulled back by twice the synchronizer
/// period: the synchronizer may write articles up to one period after their
/// nominal window and the downloader may lag by another, so both the
/// notifier's candidate window and its delivery-record retention start there
/// instead of at `previous`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerInfo {
    pub previous: DateTime<Tz>,
    pub current: DateTime<Tz>,
    pub next: DateTime<Tz>,
    pub shifted_previous: DateTime<Tz>,
}

/// An ordered set of wall-clock trigger times in the site zone.
#[derive(Debug, Clone)]
pub struct TriggerSchedule {
    times: Vec<NaiveTime>,
    shift: Duration,
}

impl TriggerSchedule {
    /// Build a schedule from times-of-day and the synchronizer period used
    /// to derive the shifted lower bound. Times are sorted and deduplicated;
    /// an empty list is a configuration error.
    pub fn new(mut times: Vec<NaiveTime>, check_updates_interval: u64) -> Result<Self> {
        times.sort();
        times.dedup();
        if times.is_empty() {
            return Err(CoreError::Config("no trigger times configured".into()));
        }
        Ok(Self {
            times,
            shift: Duration::seconds(2 * check_updates_interval as i64),
        })
    }

    /// Trigger info for the current instant in the site zone.
    pub fn now(&self) -> TriggerInfo {
        self.info_at(Utc::now().with_timezone(&SITE_TZ))
    }

    /// Trigger info for an arbitrary instant.
    ///
    /// `current` is the most recent trigger occurrence at or before `now`;
    /// `previous` and `next` are its neighbors, which may fall on adjacent
    /// days. At an exact trigger instant, `current` equals that instant.
    pub fn info_at(&self, now: DateTime<Tz>) -> TriggerInfo {
        // Materialize every occurrence over a four-day span around `now`.
        // Two days back guarantees at least two occurrences at or before
        // `now` even with a single configured trigger.
        let today = now.date_naive();
        let mut occurrences: Vec<DateTime<Tz>> = Vec::with_capacity(4 * self.times.len());
        for day_offset in -2..=1i64 {
            let date = today + Duration::days(day_offset);
            for time in &self.times {
                // Costa Rica has no DST, so local datetimes are unambiguous;
                // `earliest` is the defensive pick for zones that fold.
                if let Some(dt) = SITE_TZ
                    .from_local_datetime(&date.and_time(*time))
                    .earliest()
                {
                    occurrences.push(dt);
                }
            }
        }

        let idx = occurrences.partition_point(|t| *t <= now) - 1;
        let previous = occurrences[idx - 1];
        TriggerInfo {
            previous,
            current: occurrences[idx],
            next: occurrences[idx + 1],
            shifted_previous: previous - self.shift,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> TriggerSchedule {
        TriggerSchedule::new(
            vec![
                NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(16, 30, 0).unwrap(),
            ],
            300,
        )
        .unwrap()
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Tz> {
        SITE_TZ.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn mid_interval_straddles_midnight() {
        let info = schedule().info_at(at(2025, 2, 13, 11, 59, 59));
        assert_eq!(info.previous, at(2025, 2, 12, 16, 30, 0));
        assert_eq!(info.current, at(2025, 2, 13, 6, 0, 0));
        assert_eq!(info.next, at(2025, 2, 13, 12, 0, 0));
        assert_eq!(info.shifted_previous, at(2025, 2, 12, 16, 20, 0));
    }

    #[test]
    fn exact_trigger_instant_is_current() {
        let info = schedule().info_at(at(2025, 2, 13, 12, 0, 0));
        assert_eq!(info.previous, at(2025, 2, 13, 6, 0, 0));
        assert_eq!(info.current, at(2025, 2, 13, 12, 0, 0));
        assert_eq!(info.next, at(2025, 2, 13, 16, 30, 0));
    }

    #[test]
    fn last_interval_of_the_day_wraps_next_forward() {
        let info = schedule().info_at(at(2025, 2, 13, 23, 45, 0));
        assert_eq!(info.previous, at(2025, 2, 13, 12, 0, 0));
        assert_eq!(info.current, at(2025, 2, 13, 16, 30, 0));
        assert_eq!(info.next, at(2025, 2, 14, 6, 0, 0));
    }

    #[test]
    fn single_trigger_spans_three_days() {
        let single =
            TriggerSchedule::new(vec![NaiveTime::from_hms_opt(9, 0, 0).unwrap()], 300).unwrap();

        // Before today's occurrence: current is yesterday's.
        let info = single.info_at(at(2025, 3, 10, 8, 59, 0));
        assert_eq!(info.previous, at(2025, 3, 8, 9, 0, 0));
        assert_eq!(info.current, at(2025, 3, 9, 9, 0, 0));
        assert_eq!(info.next, at(2025, 3, 10, 9, 0, 0));

        // After it: current is today's.
        let info = single.info_at(at(2025, 3, 10, 9, 0, 1));
        assert_eq!(info.previous, at(2025, 3, 9, 9, 0, 0));
        assert_eq!(info.current, at(2025, 3, 10, 9, 0, 0));
        assert_eq!(info.next, at(2025, 3, 11, 9, 0, 0));
    }

    #[test]
    fn ordering_invariant_holds_across_a_day() {
        let sched = schedule();
        for hour in 0..24 {
            let now = at(2025, 2, 13, hour, 17, 3);
            let info = sched.info_at(now);
            assert!(info.previous < info.current, "hour {hour}");
            assert!(info.current <= now, "hour {hour}");
            assert!(now < info.next, "hour {hour}");
            assert_eq!(info.shifted_previous, info.previous - Duration::seconds(600));
        }
    }

    #[test]
    fn empty_schedule_is_rejected() {
        assert!(TriggerSchedule::new(vec![], 300).is_err());
    }
}
