use chrono::{DateTime, Duration, NaiveDate};
use chrono_tz::Tz;

use tucan_core::{Relation, SITE_TZ};

use crate::error::{Result, StoreError};

/// A mirrored article. Exactly one of {pending, body stored, skipped,
/// failed} holds at any time, where pending means all three are falsy.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub id: i64,
    pub url: String,
    pub timestamp: DateTime<Tz>,
    pub body_path: String,
    pub skipped: bool,
    pub failed: bool,
}

impl Article {
    pub fn is_pending(&self) -> bool {
        self.body_path.is_empty() && !self.skipped && !self.failed
    }
}

/// Insert form of an article, as materialized from a day index.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub id: i64,
    pub url: String,
    pub timestamp: DateTime<Tz>,
}

/// Analyzer output for one article.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub article_id: i64,
    pub timestamp: DateTime<Tz>,
    pub relation: Relation,
    pub category: String,
    pub skipped: bool,
    pub failed: bool,
}

/// LLM-curated category, possibly introduced at runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct SmartCategory {
    pub name: String,
    pub description: String,
    pub ignore: bool,
}

/// One notifier candidate row: a successful verdict joined with its article.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub article_id: i64,
    pub timestamp: DateTime<Tz>,
    pub url: String,
    pub category: String,
}

/// Half-open date interval `[start, end)` of days without an index record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let (start, end) = (self.start, self.end);
        std::iter::successors(Some(start), move |d| {
            let next = *d + Duration::days(1);
            (next < end).then_some(next)
        })
    }

    /// Last day inside the range.
    pub fn last_day(&self) -> NaiveDate {
        self.end - Duration::days(1)
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

// Every stored timestamp carries the same fixed site offset and width, so
// lexicographic comparison in SQL equals chronological comparison.
pub fn ts_to_db(ts: &DateTime<Tz>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

pub fn ts_from_db(raw: &str) -> Result<DateTime<Tz>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&SITE_TZ))
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp {raw:?}: {e}")))
}

pub fn date_to_db(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn date_from_db(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| StoreError::Corrupt(format!("bad date {raw:?}: {e}")))
}
