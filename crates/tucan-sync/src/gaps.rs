//! Gap construction and the two events that create gaps: startup seeding
//! back to the configured first day, and the daily day-switch.

use chrono::{Duration, NaiveDate};
use tracing::info;

use tucan_store::{days, DateRange, Store};

use crate::error::Result;

/// Split `[start, end_exclusive)` into ranges of at most `chunk_days` days.
/// Chunks abut without overlapping.
pub fn construct_gaps(
    start: NaiveDate,
    end_exclusive: NaiveDate,
    chunk_days: u32,
) -> Vec<DateRange> {
    let mut gaps = Vec::new();
    let mut current = start;
    while current < end_exclusive {
        let end = (current + Duration::days(chunk_days as i64)).min(end_exclusive);
        gaps.push(DateRange {
            start: current,
            end,
        });
        current = end;
    }
    gaps
}

/// Seed historical gaps from `first_day` up to the oldest known index date.
/// Runs once at startup; a no-op when the store is empty or already covers
/// `first_day`.
pub fn seed_initial_gaps(store: &Store, first_day: NaiveDate, chunk_days: u32) -> Result<()> {
    store.with_tx(|tx| -> crate::error::Result<()> {
        let (oldest, _) = days::day_range(tx)?;
        let Some(oldest) = oldest else {
            return Ok(());
        };
        if first_day >= oldest {
            return Ok(());
        }
        let gaps = construct_gaps(first_day, oldest, chunk_days);
        for gap in &gaps {
            days::insert_gap(tx, gap)?;
        }
        info!(
            from = %first_day,
            to = %oldest,
            count = gaps.len(),
            "seeded historical gaps"
        );
        Ok(())
    })?;
    Ok(())
}

/// On the first cycle of a new day, cover `[latest_known, today)` with gaps.
/// The latest known day is included so its final version is re-fetched:
/// articles keep arriving after the day was last synced.
pub fn handle_day_switch(store: &Store, today: NaiveDate, chunk_days: u32) -> Result<()> {
    store.with_tx(|tx| -> crate::error::Result<()> {
        let (_, latest) = days::day_range(tx)?;
        let Some(latest) = latest else {
            return Ok(());
        };
        if latest >= today {
            return Ok(());
        }
        let gaps = construct_gaps(latest, today, chunk_days);
        for gap in &gaps {
            days::insert_gap(tx, gap)?;
        }
        info!(
            from = %latest,
            to = %today,
            count = gaps.len(),
            "inserted day-switch gaps"
        );
        Ok(())
    })?;
    Ok(())
}
