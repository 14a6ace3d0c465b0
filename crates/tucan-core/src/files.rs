//! Data-directory layout shared by the synchronizer, downloader, and
//! notifier. All date/time path components use the site zone.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, NaiveDate};
use chrono_tz::Tz;
use tracing::debug;

use crate::error::Result;

/// `{base}/metadata/YYYY/MM/DD.json`
pub fn metadata_path(base: &Path, date: NaiveDate) -> PathBuf {
    base.join("metadata")
        .join(date.year().to_string())
        .join(format!("{:02}", date.month()))
        .join(format!("{:02}.json", date.day()))
}

/// `{base}/news/YYYY-MM-DD/HH-MM-{id}.md`
pub fn article_path(base: &Path, timestamp: DateTime<Tz>, id: i64) -> PathBuf {
    base.join("news")
        .join(timestamp.format("%Y-%m-%d").to_string())
        .join(format!("{}-{id}.md", timestamp.format("%H-%M")))
}

/// `{base}/news/YYYY-MM-DD/HH-MM-{id}-sum.{lang}.txt`
pub fn summary_path(base: &Path, timestamp: DateTime<Tz>, id: i64, lang: &str) -> PathBuf {
    base.join("news")
        .join(timestamp.format("%Y-%m-%d").to_string())
        .join(format!("{}-{id}-sum.{lang}.txt", timestamp.format("%H-%M")))
}

fn write(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    debug!(path = %path.display(), "file written");
    Ok(())
}

/// Persist a day-index document pretty-printed. Returns the path written.
pub fn save_metadata(base: &Path, date: NaiveDate, doc: &serde_json::Value) -> Result<PathBuf> {
    let path = metadata_path(base, date);
    write(&path, &serde_json::to_string_pretty(doc)?)?;
    Ok(path)
}

/// Persist an article body as markdown with the title as a header line.
pub fn save_article(
    base: &Path,
    timestamp: DateTime<Tz>,
    id: i64,
    title: &str,
    body: &str,
) -> Result<PathBuf> {
    let path = article_path(base, timestamp, id);
    write(&path, &format!("# {title}\n\n{body}"))?;
    Ok(path)
}

/// Persist a per-language summary as plain text.
pub fn save_summary(
    base: &Path,
    timestamp: DateTime<Tz>,
    id: i64,
    lang: &str,
    content: &str,
) -> Result<PathBuf> {
    let path = summary_path(base, timestamp, id, lang);
    write(&path, content)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SITE_TZ;
    use chrono::TimeZone;

    #[test]
    fn layout_uses_site_zone_components() {
        let ts = SITE_TZ.with_ymd_and_hms(2025, 2, 13, 9, 15, 0).unwrap();
        let base = Path::new("/data");
        assert_eq!(
            metadata_path(base, ts.date_naive()),
            Path::new("/data/metadata/2025/02/13.json")
        );
        assert_eq!(
            article_path(base, ts, 42),
            Path::new("/data/news/2025-02-13/09-15-42.md")
        );
        assert_eq!(
            summary_path(base, ts, 42, "ru"),
            Path::new("/data/news/2025-02-13/09-15-42-sum.ru.txt")
        );
    }

    #[test]
    fn save_article_prepends_title_header() {
        let dir = tempfile::tempdir().unwrap();
        let ts = SITE_TZ.with_ymd_and_hms(2025, 2, 13, 9, 15, 0).unwrap();
        let path = save_article(dir.path(), ts, 7, "Titular", "Cuerpo.").unwrap();
        let contents = std::fs::read_to_string(path).unwrap();
        assert_eq!(contents, "# Titular\n\nCuerpo.");
    }

    #[test]
    fn save_metadata_round_trips_json() {
        let dir = tempfile::tempdir().unwrap();
        let doc = serde_json::json!({"ultimas": [{"id": 1}]});
        let date = NaiveDate::from_ymd_opt(2025, 2, 13).unwrap();
        let path = save_metadata(dir.path(), date, &doc).unwrap();
        let loaded: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(loaded, doc);
    }
}
