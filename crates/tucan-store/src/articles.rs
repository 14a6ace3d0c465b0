//! Article rows, their state transitions, and the upstream category catalog.
//!
//! Functions take `&Connection` so they compose under a caller transaction
//! (a `Transaction` derefs to `Connection`).

use std::collections::{HashMap, HashSet};

use chrono::DateTime;
use chrono_tz::Tz;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::types::{ts_from_db, ts_to_db, Article, NewArticle};

fn article_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, String, String, String, bool, bool)> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn decode(raw: (i64, String, String, String, bool, bool)) -> Result<Article> {
    let (id, url, timestamp, body_path, skipped, failed) = raw;
    Ok(Article {
        id,
        url,
        timestamp: ts_from_db(&timestamp)?,
        body_path,
        skipped,
        failed,
    })
}

/// Insert an article if its id is unseen. Returns whether a row was added.
pub fn insert_if_absent(conn: &Connection, article: &NewArticle) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO news (id, url, timestamp, body_path, skipped, failed)
         VALUES (?1, ?2, ?3, '', 0, 0)",
        params![article.id, article.url, ts_to_db(&article.timestamp)],
    )?;
    Ok(changed > 0)
}

/// Which of `ids` already exist in the store.
pub fn existing_ids(conn: &Connection, ids: &[i64]) -> Result<HashSet<i64>> {
    if ids.is_empty() {
        return Ok(HashSet::new());
    }
    let placeholders = vec!["?"; ids.len()].join(",");
    let sql = format!("SELECT id FROM news WHERE id IN ({placeholders})");
    let mut stmt = conn.prepare(&sql)?;
    let found = stmt
        .query_map(rusqlite::params_from_iter(ids.iter()), |row| row.get(0))?
        .collect::<rusqlite::Result<HashSet<i64>>>()?;
    Ok(found)
}

pub fn get(conn: &Connection, id: i64) -> Result<Option<Article>> {
    let raw = conn
        .query_row(
            "SELECT id, url, timestamp, body_path, skipped, failed FROM news WHERE id = ?1",
            [id],
            article_from_row,
        )
        .optional()?;
    raw.map(decode).transpose()
}

/// Record where the body landed. Only applies while the article is still
/// pending, so a concurrent skip/fail is never overwritten.
pub fn set_body_path(conn: &Connection, id: i64, path: &str) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE news SET body_path = ?2
         WHERE id = ?1 AND body_path = '' AND skipped = 0 AND failed = 0",
        params![id, path],
    )?;
    Ok(changed > 0)
}

/// Mark an article as filtered out by category. Pending articles only.
pub fn mark_skipped(conn: &Connection, id: i64) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE news SET skipped = 1
         WHERE id = ?1 AND body_path = '' AND skipped = 0 AND failed = 0",
        [id],
    )?;
    Ok(changed > 0)
}

/// Mark an article as permanently failed to fetch or parse. Pending only.
pub fn mark_failed(conn: &Connection, id: i64) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE news SET failed = 1
         WHERE id = ?1 AND body_path = '' AND skipped = 0 AND failed = 0",
        [id],
    )?;
    Ok(changed > 0)
}

/// Select up to `limit` pending articles in two priority bands.
///
/// The recent band (`timestamp >= watermark`) comes first, oldest to newest,
/// so the current notification window fills up freshest-first; any remaining
/// capacity backfills history newest-first.
pub fn pending_chunk(
    conn: &Connection,
    watermark: &DateTime<Tz>,
    limit: u32,
) -> Result<Vec<Article>> {
    let watermark = ts_to_db(watermark);

    let mut stmt = conn.prepare(
        "SELECT id, url, timestamp, body_path, skipped, failed FROM news
         WHERE body_path = '' AND skipped = 0 AND failed = 0 AND timestamp >= ?1
         ORDER BY timestamp ASC LIMIT ?2",
    )?;
    let mut chunk = stmt
        .query_map(params![watermark, limit], article_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?
        .into_iter()
        .map(decode)
        .collect::<Result<Vec<_>>>()?;

    let remaining = limit as usize - chunk.len();
    if remaining > 0 {
        let mut stmt = conn.prepare(
            "SELECT id, url, timestamp, body_path, skipped, failed FROM news
             WHERE body_path = '' AND skipped = 0 AND failed = 0 AND timestamp < ?1
             ORDER BY timestamp DESC LIMIT ?2",
        )?;
        let older = stmt
            .query_map(params![watermark, remaining as u32], article_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
            .into_iter()
            .map(decode)
            .collect::<Result<Vec<_>>>()?;
        chunk.extend(older);
    }

    Ok(chunk)
}

/// Register an upstream category path if unseen.
pub fn insert_category(conn: &Connection, name: &str) -> Result<()> {
    conn.execute("INSERT OR IGNORE INTO categories (name) VALUES (?1)", [name])?;
    Ok(())
}

/// Relate an article to an upstream category path.
pub fn link_category(conn: &Connection, news_id: i64, category: &str) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO news_categories (news_id, category) VALUES (?1, ?2)",
        params![news_id, category],
    )?;
    Ok(())
}

/// Category path per article id, for a whole chunk in one query.
pub fn category_paths(conn: &Connection, ids: &[i64]) -> Result<HashMap<i64, String>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let placeholders = vec!["?"; ids.len()].join(",");
    let sql =
        format!("SELECT news_id, category FROM news_categories WHERE news_id IN ({placeholders})");
    let mut stmt = conn.prepare(&sql)?;
    let map = stmt
        .query_map(rusqlite::params_from_iter(ids.iter()), |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<rusqlite::Result<HashMap<_, _>>>()?;
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use chrono::TimeZone;
    use tucan_core::SITE_TZ;

    fn ts(h: u32, m: u32) -> DateTime<Tz> {
        SITE_TZ.with_ymd_and_hms(2025, 2, 13, h, m, 0).unwrap()
    }

    fn seed(conn: &Connection, id: i64, at: DateTime<Tz>) {
        insert_if_absent(
            conn,
            &NewArticle {
                id,
                url: format!("https://example.cr/n/{id}"),
                timestamp: at,
            },
        )
        .unwrap();
    }

    #[test]
    fn reinsert_is_a_no_op() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_conn(|conn| -> Result<()> {
                seed(conn, 1, ts(9, 0));
                let again = insert_if_absent(
                    conn,
                    &NewArticle {
                        id: 1,
                        url: "https://example.cr/other".into(),
                        timestamp: ts(10, 0),
                    },
                )?;
                assert!(!again);
                let article = get(conn, 1)?.unwrap();
                assert_eq!(article.url, "https://example.cr/n/1");
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn state_transitions_are_mutually_exclusive() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_conn(|conn| -> Result<()> {
                seed(conn, 1, ts(9, 0));
                assert!(mark_skipped(conn, 1)?);
                // Once skipped, neither body nor failure may be recorded.
                assert!(!set_body_path(conn, 1, "/tmp/x.md")?);
                assert!(!mark_failed(conn, 1)?);

                seed(conn, 2, ts(9, 5));
                assert!(set_body_path(conn, 2, "/tmp/y.md")?);
                assert!(!mark_skipped(conn, 2)?);

                let a1 = get(conn, 1)?.unwrap();
                let a2 = get(conn, 2)?.unwrap();
                assert!(a1.skipped && !a1.failed && a1.body_path.is_empty());
                assert!(!a2.skipped && !a2.failed && a2.body_path == "/tmp/y.md");
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn pending_chunk_orders_recent_then_older() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_conn(|conn| -> Result<()> {
                // Older band candidates.
                seed(conn, 1, ts(1, 0));
                seed(conn, 2, ts(2, 0));
                // Recent band candidates.
                seed(conn, 3, ts(10, 0));
                seed(conn, 4, ts(11, 0));
                // Non-pending rows never appear.
                seed(conn, 5, ts(12, 0));
                mark_failed(conn, 5)?;

                let chunk = pending_chunk(conn, &ts(9, 0), 10)?;
                let ids: Vec<i64> = chunk.iter().map(|a| a.id).collect();
                // Recent oldest→newest, then older newest→oldest.
                assert_eq!(ids, vec![3, 4, 2, 1]);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn pending_chunk_caps_at_limit() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_conn(|conn| -> Result<()> {
                for id in 0..6 {
                    seed(conn, id, ts(10, id as u32));
                }
                let chunk = pending_chunk(conn, &ts(9, 0), 4)?;
                assert_eq!(chunk.len(), 4);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn category_paths_cover_a_chunk() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_conn(|conn| -> Result<()> {
                seed(conn, 1, ts(9, 0));
                seed(conn, 2, ts(9, 5));
                insert_category(conn, "deportes/futbol")?;
                insert_category(conn, "economia")?;
                link_category(conn, 1, "deportes/futbol")?;
                link_category(conn, 2, "economia")?;

                let paths = category_paths(conn, &[1, 2, 99])?;
                assert_eq!(paths.get(&1).unwrap(), "deportes/futbol");
                assert_eq!(paths.get(&2).unwrap(), "economia");
                assert!(!paths.contains_key(&99));
                Ok(())
            })
            .unwrap();
    }
}
