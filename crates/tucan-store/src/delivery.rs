//! Delivery log the notifier uses for duplicate suppression, plus the
//! candidate sweep feeding it.

use chrono::DateTime;
use chrono_tz::Tz;
use rusqlite::{params, Connection};

use crate::error::Result;
use crate::types::{ts_from_db, ts_to_db, Candidate};

/// Drop delivery records older than the window's lower bound.
pub fn purge_before(conn: &Connection, bound: &DateTime<Tz>) -> Result<usize> {
    let changed = conn.execute(
        "DELETE FROM deliveries WHERE timestamp < ?1",
        [ts_to_db(bound)],
    )?;
    Ok(changed)
}

/// Ids already delivered inside the current window.
pub fn ids_since(conn: &Connection, bound: &DateTime<Tz>) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT news_id FROM deliveries WHERE timestamp >= ?1")?;
    let ids = stmt
        .query_map([ts_to_db(bound)], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;
    Ok(ids)
}

pub fn record(conn: &Connection, article_id: i64, timestamp: &DateTime<Tz>) -> Result<()> {
    conn.execute(
        "INSERT INTO deliveries (news_id, timestamp) VALUES (?1, ?2)",
        params![article_id, ts_to_db(timestamp)],
    )?;
    Ok(())
}

/// Successful verdicts inside the window, excluding already-delivered ids,
/// joined with the article URL, ordered oldest first.
pub fn candidates(
    conn: &Connection,
    bound: &DateTime<Tz>,
    exclude: &[i64],
) -> Result<Vec<Candidate>> {
    let exclusion = if exclude.is_empty() {
        String::new()
    } else {
        let placeholders = vec!["?"; exclude.len()].join(",");
        format!("AND v.news_id NOT IN ({placeholders})")
    };
    let sql = format!(
        "SELECT v.news_id, v.timestamp, n.url, v.category
         FROM verdicts v JOIN news n ON n.id = v.news_id
         WHERE v.timestamp >= ? AND v.skipped = 0 AND v.failed = 0 {exclusion}
         ORDER BY v.timestamp ASC"
    );

    let mut values: Vec<rusqlite::types::Value> =
        vec![rusqlite::types::Value::Text(ts_to_db(bound))];
    values.extend(exclude.iter().map(|id| rusqlite::types::Value::Integer(*id)));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(values), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|(article_id, timestamp, url, category)| {
            Ok(Candidate {
                article_id,
                timestamp: ts_from_db(&timestamp)?,
                url,
                category,
            })
        })
        .collect()
}
