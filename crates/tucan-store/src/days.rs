//! Day-index records and the gap queue the synchronizer works through.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::types::{date_from_db, date_to_db, DateRange};

/// Record (or refresh) where a day's index JSON was persisted.
pub fn upsert_day(conn: &Connection, date: NaiveDate, path: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO day_index (date, path) VALUES (?1, ?2)
         ON CONFLICT(date) DO UPDATE SET path = excluded.path",
        params![date_to_db(date), path],
    )?;
    Ok(())
}

pub fn day_exists(conn: &Connection, date: NaiveDate) -> Result<bool> {
    let found: Option<String> = conn
        .query_row(
            "SELECT date FROM day_index WHERE date = ?1",
            [date_to_db(date)],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Oldest and newest known day-index dates, either `None` when empty.
pub fn day_range(conn: &Connection) -> Result<(Option<NaiveDate>, Option<NaiveDate>)> {
    let (min, max): (Option<String>, Option<String>) = conn.query_row(
        "SELECT MIN(date), MAX(date) FROM day_index",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok((
        min.map(|d| date_from_db(&d)).transpose()?,
        max.map(|d| date_from_db(&d)).transpose()?,
    ))
}

pub fn insert_gap(conn: &Connection, gap: &DateRange) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO gaps (start_date, end_date) VALUES (?1, ?2)",
        params![date_to_db(gap.start), date_to_db(gap.end)],
    )?;
    Ok(())
}

/// The gap with the smallest start date, if any.
pub fn earliest_gap(conn: &Connection) -> Result<Option<DateRange>> {
    let raw: Option<(String, String)> = conn
        .query_row(
            "SELECT start_date, end_date FROM gaps ORDER BY start_date LIMIT 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    raw.map(|(start, end)| {
        Ok(DateRange {
            start: date_from_db(&start)?,
            end: date_from_db(&end)?,
        })
    })
    .transpose()
}

/// Whether any gap contains `date`.
pub fn gap_covering(conn: &Connection, date: NaiveDate) -> Result<bool> {
    let d = date_to_db(date);
    let found: Option<String> = conn
        .query_row(
            "SELECT start_date FROM gaps WHERE start_date <= ?1 AND ?1 < end_date",
            [d],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Delete the gap containing both `first` and `last`. Returns the number of
/// rows removed (0 when no single gap covers both days).
pub fn delete_gap_covering(conn: &Connection, first: NaiveDate, last: NaiveDate) -> Result<usize> {
    let changed = conn.execute(
        "DELETE FROM gaps
         WHERE start_date <= ?1 AND ?1 < end_date
           AND start_date <= ?2 AND ?2 < end_date",
        params![date_to_db(first), date_to_db(last)],
    )?;
    Ok(changed)
}
