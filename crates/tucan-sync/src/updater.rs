//! Applies one fetched day index to the store: unseen articles, unseen
//! categories, their relations, and the day record itself.

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::info;

use tucan_core::files;
use tucan_store::{articles, days, NewArticle};

use crate::error::Result;
use crate::index::IndexDoc;

/// A fetched day ready to be applied.
pub struct DayFetch {
    pub date: NaiveDate,
    pub doc: IndexDoc,
    pub raw: serde_json::Value,
}

/// Persist the index JSON and insert everything new for this day. Runs on
/// the caller's connection so a whole gap can commit atomically; the JSON
/// file is written before the rows referencing it, so a rollback at worst
/// leaves an orphan file.
pub fn apply_day(conn: &Connection, data_dir: &Path, fetch: &DayFetch) -> Result<()> {
    let path = files::save_metadata(data_dir, fetch.date, &fetch.raw)?;

    let ids: Vec<i64> = fetch.doc.ultimas.iter().map(|e| e.id).collect();
    let known = articles::existing_ids(conn, &ids)?;

    let mut added_articles = 0usize;
    let mut added_categories = 0usize;
    for entry in &fetch.doc.ultimas {
        if known.contains(&entry.id) {
            continue;
        }
        let timestamp = entry.timestamp()?;
        articles::insert_if_absent(
            conn,
            &NewArticle {
                id: entry.id,
                url: entry.url.clone(),
                timestamp,
            },
        )?;
        added_articles += 1;

        if let Some(category) = entry.category_path()? {
            articles::insert_category(conn, &category)?;
            articles::link_category(conn, entry.id, &category)?;
            added_categories += 1;
        }
    }

    days::upsert_day(conn, fetch.date, &path.to_string_lossy())?;

    if added_articles > 0 {
        info!(
            date = %fetch.date,
            articles = added_articles,
            categories = added_categories,
            "day index applied"
        );
    } else {
        info!(date = %fetch.date, "no new articles for date");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tucan_store::days::day_exists;
    use tucan_store::Store;

    fn fetch_for(date: NaiveDate, raw: serde_json::Value) -> DayFetch {
        DayFetch {
            date,
            doc: serde_json::from_value(raw.clone()).unwrap(),
            raw,
        }
    }

    fn sample_raw() -> serde_json::Value {
        serde_json::json!({
            "ultimas": [
                {
                    "id": 101,
                    "url": "https://example.cr/n/101",
                    "date": "Febrero 13, 2025",
                    "hour": "9:01 am",
                    "categories": [[3, "economia"]]
                },
                {
                    "id": 102,
                    "url": "https://example.cr/n/102",
                    "date": "Febrero 13, 2025",
                    "hour": "10:30 am",
                    "categories": [[7, "deportes"], [9, "futbol"]]
                }
            ]
        })
    }

    #[test]
    fn applies_articles_categories_and_day_record() {
        let store = Store::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 2, 13).unwrap();

        store
            .with_tx(|tx| -> crate::error::Result<()> {
                apply_day(tx, dir.path(), &fetch_for(date, sample_raw()))?;
                Ok(())
            })
            .unwrap();

        store
            .with_conn(|conn| -> tucan_store::Result<()> {
                assert!(day_exists(conn, date)?);
                let article = articles::get(conn, 102)?.unwrap();
                assert!(article.is_pending());
                let paths = articles::category_paths(conn, &[101, 102])?;
                assert_eq!(paths.get(&101).unwrap(), "economia");
                assert_eq!(paths.get(&102).unwrap(), "deportes/futbol");
                Ok(())
            })
            .unwrap();

        // The index JSON landed under metadata/YYYY/MM/DD.json.
        assert!(dir.path().join("metadata/2025/02/13.json").exists());
    }

    #[test]
    fn reapplying_a_day_is_idempotent_for_articles() {
        let store = Store::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 2, 13).unwrap();

        for _ in 0..2 {
            store
                .with_tx(|tx| -> crate::error::Result<()> {
                    apply_day(tx, dir.path(), &fetch_for(date, sample_raw()))?;
                    Ok(())
                })
                .unwrap();
        }

        store
            .with_conn(|conn| -> tucan_store::Result<()> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM news", [], |r| r.get(0))?;
                assert_eq!(count, 2);
                let categories: i64 =
                    conn.query_row("SELECT COUNT(*) FROM categories", [], |r| r.get(0))?;
                assert_eq!(categories, 2);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn empty_day_still_records_the_day_index() {
        let store = Store::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 2, 14).unwrap();

        store
            .with_tx(|tx| -> crate::error::Result<()> {
                apply_day(
                    tx,
                    dir.path(),
                    &fetch_for(date, serde_json::json!({"ultimas": []})),
                )?;
                Ok(())
            })
            .unwrap();

        store
            .with_conn(|conn| -> tucan_store::Result<()> {
                assert!(day_exists(conn, date)?);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn malformed_entry_fails_the_day_and_rolls_back() {
        let store = Store::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 2, 13).unwrap();
        let raw = serde_json::json!({
            "ultimas": [{
                "id": 101,
                "url": "https://example.cr/n/101",
                "date": "Ventoso 13, 2025",
                "hour": "9:01 am",
                "categories": []
            }]
        });

        let result = store.with_tx(|tx| -> crate::error::Result<()> {
            apply_day(tx, dir.path(), &fetch_for(date, raw))?;
            Ok(())
        });
        assert!(result.is_err());

        store
            .with_conn(|conn| -> tucan_store::Result<()> {
                assert!(!day_exists(conn, date)?);
                assert!(articles::get(conn, 101)?.is_none());
                Ok(())
            })
            .unwrap();
    }
}
