//! Upstream day-index documents and their quirks: Spanish month names,
//! 12-hour clock strings, nested category arrays.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use serde::Deserialize;

use tucan_core::SITE_TZ;

use crate::error::{Result, SyncError};

const SPANISH_MONTHS: &[(&str, u32)] = &[
    ("enero", 1),
    ("febrero", 2),
    ("marzo", 3),
    ("abril", 4),
    ("mayo", 5),
    ("junio", 6),
    ("julio", 7),
    ("agosto", 8),
    ("septiembre", 9),
    ("octubre", 10),
    ("noviembre", 11),
    ("diciembre", 12),
];

/// One day's index: `{"ultimas": [...]}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexDoc {
    #[serde(default)]
    pub ultimas: Vec<IndexEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndexEntry {
    pub id: i64,
    pub url: String,
    /// e.g. `"Febrero 6, 2025"`
    pub date: String,
    /// e.g. `" 9:01 am "`
    pub hour: String,
    /// Nested arrays; the second element of each is the URL slug.
    #[serde(default)]
    pub categories: Vec<serde_json::Value>,
}

impl IndexEntry {
    /// The `/`-joined slug path, e.g. `deportes/futbol`.
    /// `None` when the entry lists no categories; malformed entries are a
    /// schema error for the whole day.
    pub fn category_path(&self) -> Result<Option<String>> {
        if self.categories.is_empty() {
            return Ok(None);
        }
        let mut slugs = Vec::with_capacity(self.categories.len());
        for entry in &self.categories {
            let slug = entry
                .get(1)
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    SyncError::Response(format!(
                        "news {}: malformed category entry {entry}",
                        self.id
                    ))
                })?;
            slugs.push(slug);
        }
        Ok(Some(slugs.join("/")))
    }

    /// Combine the Spanish date and 12-hour time into a site-zone instant.
    pub fn timestamp(&self) -> Result<DateTime<Tz>> {
        let date = parse_spanish_date(&self.date)
            .ok_or_else(|| SyncError::Response(format!("news {}: bad date {:?}", self.id, self.date)))?;
        let time = parse_half_day_time(&self.hour)
            .ok_or_else(|| SyncError::Response(format!("news {}: bad hour {:?}", self.id, self.hour)))?;
        SITE_TZ
            .from_local_datetime(&date.and_time(time))
            .earliest()
            .ok_or_else(|| {
                SyncError::Response(format!("news {}: unrepresentable local time", self.id))
            })
    }
}

/// `"Febrero 6, 2025"` → 2025-02-06.
fn parse_spanish_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = raw.to_lowercase().replace(',', "");
    let mut parts = cleaned.split_whitespace();
    let month_name = parts.next()?;
    let day: u32 = parts.next()?.parse().ok()?;
    let year: i32 = parts.next()?.parse().ok()?;
    let month = SPANISH_MONTHS
        .iter()
        .find(|(name, _)| *name == month_name)
        .map(|(_, number)| *number)?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// `" 9:01 am "` → 09:01, `"12:15 pm"` → 12:15, `"12:05 am"` → 00:05.
fn parse_half_day_time(raw: &str) -> Option<NaiveTime> {
    let lowered = raw.trim().to_lowercase();
    let is_pm = lowered.contains("pm");
    let digits = lowered.replace("am", "").replace("pm", "");
    let mut parts = digits.trim().split(':');
    let mut hour: u32 = parts.next()?.trim().parse().ok()?;
    let minute: u32 = parts.next()?.trim().parse().ok()?;

    if is_pm && hour != 12 {
        hour += 12;
    } else if !is_pm && hour == 12 {
        hour = 0;
    }
    NaiveTime::from_hms_opt(hour, minute, 0)
}
