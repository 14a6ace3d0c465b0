//! Telegram channel transport: connectivity probe and paced, retried sends.

use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::{LinkPreviewOptions, ParseMode, Recipient};
use tracing::{debug, error, warn};

use tucan_core::config::Settings;

use crate::error::{NotifyError, Result};

const RETRY_PAUSE: Duration = Duration::from_secs(1);

pub struct ChannelSender {
    bot: Bot,
    chat: Recipient,
    max_retries: u32,
}

impl ChannelSender {
    /// Build the sender. Missing credentials are fatal at startup.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        if settings.news_notifier_telegram_bot_token.is_empty() {
            return Err(NotifyError::Config(
                "NEWS_NOTIFIER_TELEGRAM_BOT_TOKEN is not set".into(),
            ));
        }
        let chat = parse_chat(&settings.news_notifier_telegram_channel_id)?;
        Ok(Self {
            bot: Bot::new(&settings.news_notifier_telegram_bot_token),
            chat,
            max_retries: settings.news_notifier_telegram_max_retries,
        })
    }

    /// `get_me` round trip; false when the transport is unreachable.
    pub async fn probe(&self) -> bool {
        match self.bot.get_me().await {
            Ok(_) => true,
            Err(e) => {
                debug!("telegram probe failed: {e}");
                false
            }
        }
    }

    /// Send one MarkdownV2 message with the link preview disabled, retrying
    /// transient failures with a short pause. Returns whether it went out.
    pub async fn send(&self, text: &str) -> bool {
        let preview_off = LinkPreviewOptions {
            is_disabled: true,
            url: None,
            prefer_small_media: false,
            prefer_large_media: false,
            show_above_text: false,
        };

        let attempts = self.max_retries + 1;
        for attempt in 1..=attempts {
            match self
                .bot
                .send_message(self.chat.clone(), text)
                .parse_mode(ParseMode::MarkdownV2)
                .link_preview_options(preview_off.clone())
                .await
            {
                Ok(_) => return true,
                Err(e) if attempt < attempts => {
                    warn!(attempt, attempts, "failed to send message, retrying: {e}");
                    tokio::time::sleep(RETRY_PAUSE).await;
                }
                Err(e) => {
                    error!(attempts, "failed to send message, giving up: {e}");
                }
            }
        }
        false
    }
}

/// Channel ids come either as numeric chat ids (`-100…`) or `@username`.
fn parse_chat(raw: &str) -> Result<Recipient> {
    if raw.is_empty() {
        return Err(NotifyError::Config(
            "NEWS_NOTIFIER_TELEGRAM_CHANNEL_ID is not set".into(),
        ));
    }
    if let Some(username) = raw.strip_prefix('@') {
        return Ok(Recipient::ChannelUsername(format!("@{username}")));
    }
    raw.parse::<i64>()
        .map(|id| Recipient::Id(ChatId(id)))
        .map_err(|_| {
            NotifyError::Config(format!(
                "channel id must be numeric or @username, got {raw:?}"
            ))
        })
}
