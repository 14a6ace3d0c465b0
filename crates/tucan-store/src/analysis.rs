//! Smart-category catalog, verdicts, and summary rows.

use std::collections::BTreeSet;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use tucan_core::types::UNKNOWN_CATEGORY;

use crate::error::{Result, StoreError};
use crate::types::{ts_from_db, ts_to_db, SmartCategory, Verdict};

/// Catalog handed to the agents: every non-sentinel category with its
/// description, ordered by name so prompt construction is deterministic.
pub fn active_catalog(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare(
        "SELECT name, description FROM smart_categories WHERE name != ?1 ORDER BY name",
    )?;
    let catalog = stmt
        .query_map([UNKNOWN_CATEGORY], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(catalog)
}

/// Names of categories the analyzer must never summarize.
pub fn ignored_categories(conn: &Connection) -> Result<BTreeSet<String>> {
    let mut stmt = conn.prepare("SELECT name FROM smart_categories WHERE ignore = 1")?;
    let set = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<BTreeSet<String>>>()?;
    Ok(set)
}

pub fn get_smart_category(conn: &Connection, name: &str) -> Result<Option<SmartCategory>> {
    let found = conn
        .query_row(
            "SELECT name, description, ignore FROM smart_categories WHERE name = ?1",
            [name],
            |row| {
                Ok(SmartCategory {
                    name: row.get(0)?,
                    description: row.get(1)?,
                    ignore: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(found)
}

/// Add a newly minted category (never ignored). No-op when it already exists,
/// so the catalog only grows.
pub fn insert_smart_category(conn: &Connection, name: &str, description: &str) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO smart_categories (name, description, ignore) VALUES (?1, ?2, 0)",
        params![name, description],
    )?;
    if changed > 0 {
        info!(category = name, "new smart category added");
    }
    Ok(changed > 0)
}

pub fn get_verdict(conn: &Connection, article_id: i64) -> Result<Option<Verdict>> {
    let raw = conn
        .query_row(
            "SELECT news_id, timestamp, relation, category, skipped, failed
             FROM verdicts WHERE news_id = ?1",
            [article_id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, bool>(4)?,
                    row.get::<_, bool>(5)?,
                ))
            },
        )
        .optional()?;
    raw.map(|(article_id, timestamp, relation, category, skipped, failed)| {
        Ok(Verdict {
            article_id,
            timestamp: ts_from_db(&timestamp)?,
            relation: relation
                .parse()
                .map_err(|e: String| StoreError::Corrupt(e))?,
            category,
            skipped,
            failed,
        })
    })
    .transpose()
}

pub fn upsert_verdict(conn: &Connection, verdict: &Verdict) -> Result<()> {
    conn.execute(
        "INSERT INTO verdicts (news_id, timestamp, relation, category, skipped, failed)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(news_id) DO UPDATE SET
             timestamp = excluded.timestamp,
             relation = excluded.relation,
             category = excluded.category,
             skipped = excluded.skipped,
             failed = excluded.failed",
        params![
            verdict.article_id,
            ts_to_db(&verdict.timestamp),
            verdict.relation.to_string(),
            verdict.category,
            verdict.skipped,
            verdict.failed,
        ],
    )?;
    Ok(())
}

pub fn insert_summary(conn: &Connection, article_id: i64, lang: &str, path: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO summaries (news_id, lang, path) VALUES (?1, ?2, ?3)",
        params![article_id, lang, path],
    )?;
    Ok(())
}

pub fn summary_path(conn: &Connection, article_id: i64, lang: &str) -> Result<Option<String>> {
    let found = conn
        .query_row(
            "SELECT path FROM summaries WHERE news_id = ?1 AND lang = ?2",
            params![article_id, lang],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found)
}

pub fn has_summaries(conn: &Connection, article_id: i64) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM summaries WHERE news_id = ?1",
        [article_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}
