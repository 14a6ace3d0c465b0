//! Article body retrieval. The extraction itself is deliberately thin; the
//! trait is the seam where a proper readability pipeline would plug in.

use async_trait::async_trait;
use scraper::{Html, Selector};
use thiserror::Error;

use tucan_sync::api::REQUEST_USER_AGENT;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level failure; the article is marked failed.
    #[error("Download failed: {0}")]
    Download(String),

    /// The page came back but no usable content could be extracted.
    #[error("Parse failed: {0}")]
    Parse(String),
}

#[derive(Debug, Clone)]
pub struct FetchedArticle {
    pub title: String,
    pub markdown: String,
}

/// Turns an article URL into title + markdown body.
#[async_trait]
pub trait ArticleFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedArticle, FetchError>;
}

/// Straightforward HTTP + DOM extraction.
pub struct HttpArticleFetcher {
    client: reqwest::Client,
}

impl HttpArticleFetcher {
    pub fn new(timeout: std::time::Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(REQUEST_USER_AGENT)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

#[async_trait]
impl ArticleFetcher for HttpArticleFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedArticle, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Download(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(FetchError::Download(format!(
                "HTTP {} for {url}",
                resp.status().as_u16()
            )));
        }
        let html = resp
            .text()
            .await
            .map_err(|e| FetchError::Download(e.to_string()))?;
        extract(&html)
    }
}

/// DOM extraction, kept synchronous so the non-`Send` parse tree never
/// crosses an await point.
fn extract(html: &str) -> Result<FetchedArticle, FetchError> {
    let document = Html::parse_document(html);

    let title_selector =
        Selector::parse("h1").map_err(|e| FetchError::Parse(e.to_string()))?;
    let title: String = document
        .select(&title_selector)
        .next()
        .map(|node| node.text().collect::<String>())
        .map(|t| t.trim().to_string())
        .unwrap_or_default();

    let paragraph_selector =
        Selector::parse("article p, article h2").map_err(|e| FetchError::Parse(e.to_string()))?;
    let fallback_selector =
        Selector::parse("p").map_err(|e| FetchError::Parse(e.to_string()))?;

    let mut blocks: Vec<String> = document
        .select(&paragraph_selector)
        .map(render_block)
        .filter(|b| !b.is_empty())
        .collect();
    if blocks.is_empty() {
        blocks = document
            .select(&fallback_selector)
            .map(render_block)
            .filter(|b| !b.is_empty())
            .collect();
    }

    if title.is_empty() || blocks.is_empty() {
        return Err(FetchError::Parse("empty title or content".into()));
    }
    Ok(FetchedArticle {
        title,
        markdown: blocks.join("\n\n"),
    })
}

fn render_block(node: scraper::ElementRef<'_>) -> String {
    let text = node
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if node.value().name() == "h2" && !text.is_empty() {
        format!("## {text}")
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_title_and_paragraphs() {
        let html = r#"
            <html><body>
              <h1> Rebaja en tarifas  </h1>
              <article>
                <p>El ICE anunció una rebaja.</p>
                <h2>Detalles</h2>
                <p>Aplica desde abril.</p>
              </article>
            </body></html>"#;
        let article = extract(html).unwrap();
        assert_eq!(article.title, "Rebaja en tarifas");
        assert_eq!(
            article.markdown,
            "El ICE anunció una rebaja.\n\n## Detalles\n\nAplica desde abril."
        );
    }

    #[test]
    fn falls_back_to_bare_paragraphs() {
        let html = "<html><body><h1>T</h1><p>Solo un párrafo.</p></body></html>";
        let article = extract(html).unwrap();
        assert_eq!(article.markdown, "Solo un párrafo.");
    }

    #[test]
    fn empty_page_is_a_parse_error() {
        assert!(matches!(
            extract("<html><body></body></html>"),
            Err(FetchError::Parse(_))
        ));
    }
}
