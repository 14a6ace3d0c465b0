//! Channel message layout and MarkdownV2 escaping.

use chrono::DateTime;
use chrono_tz::Tz;

/// One outgoing channel post.
#[derive(Debug, Clone)]
pub struct NewsMessage {
    pub timestamp: DateTime<Tz>,
    pub url: String,
    pub category: String,
    pub summary: String,
}

/// Escape every character MarkdownV2 treats as markup.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '_' | '*' | '[' | ']' | '(' | ')' | '~' | '`' | '>' | '#' | '+' | '-' | '='
            | '|' | '{' | '}' | '.' | '!' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Render the four-block message:
///
/// ```text
/// _YYYY/MM/DD HH:MM_        (italic, site zone)
///
/// {summary}
///
/// {url}
///
/// #{category}               or  #{parent} #{child}
/// ```
///
/// User-supplied text is escaped; the `#` introducing each hashtag stays a
/// literal hash.
pub fn format_message(news: &NewsMessage) -> String {
    let timestamp = format!(
        "_{}_",
        escape_markdown_v2(&news.timestamp.format("%Y/%m/%d %H:%M").to_string())
    );
    let summary = escape_markdown_v2(&news.summary);
    let url = escape_markdown_v2(&news.url);

    let hashtags = match news.category.split_once('/') {
        Some((parent, child)) => format!(
            "\\#{} \\#{}",
            escape_markdown_v2(parent),
            escape_markdown_v2(child)
        ),
        None => format!("\\#{}", escape_markdown_v2(&news.category)),
    };

    format!("{timestamp}\n\n{summary}\n\n{url}\n\n{hashtags}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tucan_core::SITE_TZ;

    fn message() -> NewsMessage {
        NewsMessage {
            timestamp: SITE_TZ.with_ymd_and_hms(2025, 2, 13, 9, 15, 0).unwrap(),
            url: "https://example.cr/deportes/futbol/el_clasico".into(),
            category: "deportes/futbol".into(),
            summary: "Saprissa won the derby.".into(),
        }
    }

    #[test]
    fn escapes_the_markdown_v2_special_set() {
        let escaped = escape_markdown_v2("a_b*c[d]e(f)g~h`i>j#k+l-m=n|o{p}q.r!s");
        assert_eq!(
            escaped,
            "a\\_b\\*c\\[d\\]e\\(f\\)g\\~h\\`i\\>j\\#k\\+l\\-m\\=n\\|o\\{p\\}q\\.r\\!s"
        );
        assert_eq!(escape_markdown_v2("plain text 123"), "plain text 123");
    }

    #[test]
    fn message_blocks_are_ordered_and_separated() {
        let rendered = format_message(&message());
        let blocks: Vec<&str> = rendered.split("\n\n").collect();
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0], "_2025/02/13 09:15_");
        assert_eq!(blocks[1], "Saprissa won the derby\\.");
        assert_eq!(blocks[3], "\\#deportes \\#futbol");
    }

    #[test]
    fn url_underscores_are_escaped_exactly_once() {
        let rendered = format_message(&message());
        assert!(rendered.contains("el\\_clasico"));
        assert!(!rendered.contains("el\\\\_clasico"));
    }

    #[test]
    fn single_level_category_yields_one_hashtag() {
        let mut news = message();
        news.category = "economia".into();
        let rendered = format_message(&news);
        assert!(rendered.ends_with("\\#economia"));
    }

    #[test]
    fn category_segments_are_escaped_but_hashes_survive() {
        let mut news = message();
        news.category = "economy/interest_rates".into();
        let rendered = format_message(&news);
        assert!(rendered.ends_with("\\#economy \\#interest\\_rates"));
    }
}
