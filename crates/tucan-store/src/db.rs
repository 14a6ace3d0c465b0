use rusqlite::Connection;

use crate::error::Result;

/// Initialise all tables. Safe to call on every startup (idempotent).
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS news (
            id          INTEGER PRIMARY KEY,
            url         TEXT NOT NULL,
            timestamp   TEXT NOT NULL,
            body_path   TEXT NOT NULL DEFAULT '',
            skipped     INTEGER NOT NULL DEFAULT 0,
            failed      INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_news_timestamp
            ON news(timestamp);

        CREATE TABLE IF NOT EXISTS categories (
            name        TEXT PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS news_categories (
            news_id     INTEGER NOT NULL REFERENCES news(id),
            category    TEXT NOT NULL REFERENCES categories(name),
            PRIMARY KEY (news_id, category)
        );

        CREATE TABLE IF NOT EXISTS day_index (
            date        TEXT PRIMARY KEY,
            path        TEXT NOT NULL
        );

        -- Half-open [start_date, end_date) ranges of days still to fetch.
        CREATE TABLE IF NOT EXISTS gaps (
            start_date  TEXT PRIMARY KEY,
            end_date    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS smart_categories (
            name        TEXT PRIMARY KEY,
            description TEXT NOT NULL,
            ignore      INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS summaries (
            news_id     INTEGER NOT NULL REFERENCES news(id),
            lang        TEXT NOT NULL,
            path        TEXT NOT NULL,
            PRIMARY KEY (news_id, lang)
        );

        CREATE TABLE IF NOT EXISTS verdicts (
            news_id     INTEGER PRIMARY KEY REFERENCES news(id),
            timestamp   TEXT NOT NULL,
            relation    TEXT NOT NULL
                        CHECK (relation IN ('directly', 'indirectly', 'na')),
            category    TEXT NOT NULL REFERENCES smart_categories(name),
            skipped     INTEGER NOT NULL DEFAULT 0,
            failed      INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_verdicts_timestamp
            ON verdicts(timestamp);

        CREATE TABLE IF NOT EXISTS deliveries (
            news_id     INTEGER PRIMARY KEY REFERENCES verdicts(news_id),
            timestamp   TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_deliveries_timestamp
            ON deliveries(timestamp);",
    )?;
    Ok(())
}
