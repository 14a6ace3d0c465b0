//! HTTP client for the CRHoy index API, plus the connectivity probes the
//! workers run before spending a cycle.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::StatusCode;
use tracing::{debug, info, warn};

use crate::error::{Result, SyncError};
use crate::index::IndexDoc;

pub const API_BASE_URL: &str = "https://api.crhoy.net";
pub const SITE_PROBE_URL: &str = "https://www.crhoy.com/site/dist/terminos_y_condiciones.html";

/// The site rejects default library agents.
pub const REQUEST_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub struct SiteClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl SiteClient {
    pub fn new(timeout: Duration, max_retries: u32) -> Self {
        Self::with_base_url(API_BASE_URL.to_string(), timeout, max_retries)
    }

    pub fn with_base_url(base_url: String, timeout: Duration, max_retries: u32) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(REQUEST_USER_AGENT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url,
            max_retries,
        }
    }

    /// Fetch one day's index.
    ///
    /// 404 means the day has no news and yields an empty document. Transport
    /// errors are retried with growing pauses up to `max_retries`; a body
    /// that is not a valid index document fails the day immediately.
    pub async fn fetch_day_index(&self, date: NaiveDate) -> Result<(IndexDoc, serde_json::Value)> {
        let url = format!("{}/ultimas/{}.json?v=3", self.base_url, date);
        let attempts = self.max_retries.max(1);

        for attempt in 1..=attempts {
            debug!(%url, attempt, "fetching day index");
            match self.client.get(&url).send().await {
                Ok(resp) if resp.status() == StatusCode::NOT_FOUND => {
                    // An empty day, not an error.
                    warn!(%date, "no index published for date");
                    return Ok((IndexDoc::default(), serde_json::json!({ "ultimas": [] })));
                }
                Ok(resp) if resp.status().is_success() => {
                    let raw: serde_json::Value = resp
                        .json()
                        .await
                        .map_err(|e| SyncError::Response(format!("invalid JSON: {e}")))?;
                    let doc: IndexDoc = serde_json::from_value(raw.clone())
                        .map_err(|e| SyncError::Response(format!("unexpected format: {e}")))?;
                    info!(%date, count = doc.ultimas.len(), "fetched day index");
                    return Ok((doc, raw));
                }
                Ok(resp) => {
                    warn!(%date, status = resp.status().as_u16(), attempt, "index fetch HTTP error");
                }
                Err(e) => {
                    warn!(%date, attempt, "index fetch request error: {e}");
                }
            }
            if attempt < attempts {
                tokio::time::sleep(Duration::from_secs(1u64 << attempt.min(4))).await;
            }
        }
        Err(SyncError::Connection(format!(
            "failed to fetch index for {date} after {attempts} attempts"
        )))
    }

    /// OPTIONS probe of the index endpoint. A reachable deployment answers
    /// 405 (method not allowed) or 200; a geo-block answers 403.
    pub async fn probe_api(&self) -> bool {
        let url = format!("{}/ultimas/", self.base_url);
        match self
            .client
            .request(reqwest::Method::OPTIONS, &url)
            .send()
            .await
        {
            Ok(resp) => matches!(resp.status().as_u16(), 200 | 405),
            Err(_) => false,
        }
    }

    /// GET probe of a static site page, used by the downloader.
    pub async fn probe_site(&self) -> bool {
        match self.client.get(SITE_PROBE_URL).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

/// Coarse internet check: can we open a TCP connection to a well-known
/// resolver at all.
pub async fn check_internet(timeout: Duration) -> bool {
    matches!(
        tokio::time::timeout(timeout, tokio::net::TcpStream::connect("8.8.8.8:53")).await,
        Ok(Ok(_))
    )
}
