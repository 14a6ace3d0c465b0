use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CoreError, Result};

/// Environment keys the loader honors. Anything else in the environment is
/// left untouched by the merge.
const ENV_KEYS: &[&str] = &[
    "DATA_DIR",
    "DATABASE_URL",
    "FIRST_DAY",
    "CHECK_UPDATES_INTERVAL",
    "DAYS_CHUNK_SIZE",
    "DOWNLOAD_INTERVAL",
    "DOWNLOADS_CHUNK_SIZE",
    "IGNORE_CATEGORIES",
    "REQUEST_TIMEOUT",
    "MAX_RETRIES",
    "AGENT_ENGINE",
    "AGENT_ENGINE_API_KEY",
    "AGENT_ENGINE_BASIC_MODEL",
    "AGENT_ENGINE_BASIC_MODEL_REQUEST_LIMIT",
    "AGENT_ENGINE_BASIC_MODEL_REQUEST_LIMIT_PERIOD_SECONDS",
    "AGENT_ENGINE_BASIC_MODEL_REQUIRES_SUPPLEMENTARY",
    "AGENT_ENGINE_LIGHT_MODEL",
    "AGENT_ENGINE_LIGHT_MODEL_REQUEST_LIMIT",
    "AGENT_ENGINE_LIGHT_MODEL_REQUEST_LIMIT_PERIOD_SECONDS",
    "AGENT_ENGINE_LIGHT_MODEL_REQUIRES_SUPPLEMENTARY",
    "AGENT_ENGINE_SUPPLEMENTARY_MODEL",
    "AGENT_ENGINE_SUPPLEMENTARY_MODEL_REQUEST_LIMIT",
    "AGENT_ENGINE_SUPPLEMENTARY_MODEL_REQUEST_LIMIT_PERIOD_SECONDS",
    "KEEP_RAW_ENGINE_RESPONSES",
    "RAW_ENGINE_RESPONSES_DIR",
    "NEWS_NOTIFIER_TRIGGER_TIMES",
    "NEWS_NOTIFIER_MAX_INACTIVITY_INTERVAL",
    "NEWS_NOTIFIER_TELEGRAM_BOT_TOKEN",
    "NEWS_NOTIFIER_TELEGRAM_CHANNEL_ID",
    "NEWS_NOTIFIER_TELEGRAM_MAX_RETRIES",
    "NEWS_NOTIFIER_TELEGRAM_MESSAGES_DELAY",
];

/// Which LLM backend the agents talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Gemini,
    OpenAi,
}

/// Per-model request budget: at most `request_limit` calls per
/// `request_limit_period_seconds`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelLimits {
    pub name: String,
    pub request_limit: u32,
    pub request_limit_period_seconds: u64,
}

/// Flat settings record covering every worker. Loaded from an optional TOML
/// file with environment overrides (exact keys, no prefix).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub database_url: String,

    #[serde(default)]
    pub first_day: Option<NaiveDate>,
    pub check_updates_interval: u64,
    pub days_chunk_size: u32,

    pub download_interval: u64,
    pub downloads_chunk_size: u32,
    #[serde(deserialize_with = "de_category_set", default)]
    pub ignore_categories: BTreeSet<String>,

    pub request_timeout: f64,
    pub max_retries: u32,

    pub agent_engine: Engine,
    pub agent_engine_api_key: String,
    pub agent_engine_basic_model: String,
    pub agent_engine_basic_model_request_limit: u32,
    pub agent_engine_basic_model_request_limit_period_seconds: u64,
    pub agent_engine_basic_model_requires_supplementary: bool,
    pub agent_engine_light_model: String,
    pub agent_engine_light_model_request_limit: u32,
    pub agent_engine_light_model_request_limit_period_seconds: u64,
    pub agent_engine_light_model_requires_supplementary: bool,
    pub agent_engine_supplementary_model: String,
    pub agent_engine_supplementary_model_request_limit: u32,
    pub agent_engine_supplementary_model_request_limit_period_seconds: u64,

    pub keep_raw_engine_responses: bool,
    pub raw_engine_responses_dir: PathBuf,

    #[serde(deserialize_with = "de_trigger_times")]
    pub news_notifier_trigger_times: Vec<NaiveTime>,
    pub news_notifier_max_inactivity_interval: u64,
    pub news_notifier_telegram_bot_token: String,
    pub news_notifier_telegram_channel_id: String,
    pub news_notifier_telegram_max_retries: u32,
    pub news_notifier_telegram_messages_delay: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/tucan"),
            database_url: "data/tucan/tucan.db".to_string(),
            first_day: None,
            check_updates_interval: 300,
            days_chunk_size: 5,
            download_interval: 60,
            downloads_chunk_size: 10,
            ignore_categories: BTreeSet::new(),
            request_timeout: 30.0,
            max_retries: 3,
            agent_engine: Engine::Gemini,
            agent_engine_api_key: String::new(),
            agent_engine_basic_model: "gemini-2.0-flash".to_string(),
            agent_engine_basic_model_request_limit: 10,
            agent_engine_basic_model_request_limit_period_seconds: 60,
            agent_engine_basic_model_requires_supplementary: false,
            agent_engine_light_model: "gemini-2.0-flash-lite".to_string(),
            agent_engine_light_model_request_limit: 10,
            agent_engine_light_model_request_limit_period_seconds: 60,
            agent_engine_light_model_requires_supplementary: false,
            agent_engine_supplementary_model: String::new(),
            agent_engine_supplementary_model_request_limit: 10,
            agent_engine_supplementary_model_request_limit_period_seconds: 60,
            keep_raw_engine_responses: false,
            raw_engine_responses_dir: PathBuf::from("data/tucan/llm/responses"),
            news_notifier_trigger_times: vec![
                NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(16, 30, 0).unwrap(),
            ],
            news_notifier_max_inactivity_interval: 300,
            news_notifier_telegram_bot_token: String::new(),
            news_notifier_telegram_channel_id: String::new(),
            news_notifier_telegram_max_retries: 3,
            news_notifier_telegram_messages_delay: 1.0,
        }
    }
}

impl Settings {
    /// Load settings from an optional TOML file with env-var overrides.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }
        let settings: Settings = figment
            .merge(Env::raw().only(ENV_KEYS))
            .extract()
            .map_err(|e| CoreError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.database_url.trim().is_empty() {
            return Err(CoreError::Config("DATABASE_URL must not be empty".into()));
        }
        if self.news_notifier_trigger_times.is_empty() {
            return Err(CoreError::Config(
                "NEWS_NOTIFIER_TRIGGER_TIMES must list at least one trigger".into(),
            ));
        }
        if self.days_chunk_size == 0 || self.downloads_chunk_size == 0 {
            return Err(CoreError::Config("chunk sizes must be positive".into()));
        }
        if self.check_updates_interval == 0 || self.download_interval == 0 {
            return Err(CoreError::Config("worker intervals must be positive".into()));
        }
        let limits = [
            self.agent_engine_basic_model_request_limit,
            self.agent_engine_light_model_request_limit,
            self.agent_engine_supplementary_model_request_limit,
        ];
        if limits.contains(&0) {
            return Err(CoreError::Config(
                "model request limits must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Filesystem path of the SQLite database. Accepts a bare path or a
    /// `sqlite://`-prefixed URL.
    pub fn database_path(&self) -> &str {
        self.database_url
            .strip_prefix("sqlite://")
            .unwrap_or(&self.database_url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout)
    }

    pub fn messages_delay(&self) -> Duration {
        Duration::from_secs_f64(self.news_notifier_telegram_messages_delay)
    }

    pub fn basic_model(&self) -> ModelLimits {
        ModelLimits {
            name: self.agent_engine_basic_model.clone(),
            request_limit: self.agent_engine_basic_model_request_limit,
            request_limit_period_seconds: self.agent_engine_basic_model_request_limit_period_seconds,
        }
    }

    pub fn light_model(&self) -> ModelLimits {
        ModelLimits {
            name: self.agent_engine_light_model.clone(),
            request_limit: self.agent_engine_light_model_request_limit,
            request_limit_period_seconds: self.agent_engine_light_model_request_limit_period_seconds,
        }
    }

    pub fn supplementary_model(&self) -> Option<ModelLimits> {
        if self.agent_engine_supplementary_model.is_empty() {
            return None;
        }
        Some(ModelLimits {
            name: self.agent_engine_supplementary_model.clone(),
            request_limit: self.agent_engine_supplementary_model_request_limit,
            request_limit_period_seconds: self
                .agent_engine_supplementary_model_request_limit_period_seconds,
        })
    }
}

/// Trigger times arrive either as a TOML list or as a JSON string of
/// `"HH:MM"` entries (the env-var form). Times are sorted and deduplicated.
fn de_trigger_times<'de, D>(deserializer: D) -> std::result::Result<Vec<NaiveTime>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Json(String),
        List(Vec<String>),
    }

    let entries = match Repr::deserialize(deserializer)? {
        Repr::List(list) => list,
        Repr::Json(raw) => serde_json::from_str::<Vec<String>>(&raw).map_err(|e| {
            serde::de::Error::custom(format!("trigger times must be a JSON array of HH:MM: {e}"))
        })?,
    };

    let mut times = entries
        .iter()
        .map(|t| {
            // `HH:MM` from the env surface, `HH:MM:SS` when round-tripping
            // through serialized defaults.
            NaiveTime::parse_from_str(t, "%H:%M")
                .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M:%S"))
                .map_err(|e| serde::de::Error::custom(format!("bad trigger time {t:?}: {e}")))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;
    times.sort();
    times.dedup();
    Ok(times)
}

/// Ignored categories arrive either as a TOML list or as a comma-separated
/// string (the env-var form).
fn de_category_set<'de, D>(deserializer: D) -> std::result::Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Csv(String),
        List(Vec<String>),
    }

    let set = match Repr::deserialize(deserializer)? {
        Repr::List(list) => list.into_iter().collect(),
        Repr::Csv(raw) => raw
            .split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect(),
    };
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        Settings::default().validate().unwrap();
    }

    #[test]
    fn trigger_times_parse_from_json_string() {
        let json = serde_json::json!({"news_notifier_trigger_times": "[\"16:30\", \"06:00\"]"});
        #[derive(Deserialize)]
        struct Probe {
            #[serde(deserialize_with = "de_trigger_times")]
            news_notifier_trigger_times: Vec<NaiveTime>,
        }
        let probe: Probe = serde_json::from_value(json).unwrap();
        assert_eq!(
            probe.news_notifier_trigger_times,
            vec![
                NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(16, 30, 0).unwrap(),
            ]
        );
    }

    #[test]
    fn trigger_times_accept_the_serialized_default_form() {
        #[derive(Deserialize)]
        struct Probe {
            #[serde(deserialize_with = "de_trigger_times")]
            news_notifier_trigger_times: Vec<NaiveTime>,
        }
        let probe: Probe = serde_json::from_value(
            serde_json::json!({"news_notifier_trigger_times": ["06:00:00", "16:30:00"]}),
        )
        .unwrap();
        assert_eq!(probe.news_notifier_trigger_times.len(), 2);
    }

    #[test]
    fn ignore_categories_parse_from_csv() {
        #[derive(Deserialize)]
        struct Probe {
            #[serde(deserialize_with = "de_category_set")]
            ignore_categories: BTreeSet<String>,
        }
        let probe: Probe = serde_json::from_value(
            serde_json::json!({"ignore_categories": "deportes, sucesos ,, "}),
        )
        .unwrap();
        assert_eq!(
            probe.ignore_categories,
            BTreeSet::from(["deportes".to_string(), "sucesos".to_string()])
        );
    }

    #[test]
    fn database_path_strips_scheme() {
        let mut settings = Settings::default();
        settings.database_url = "sqlite:///var/lib/tucan.db".to_string();
        assert_eq!(settings.database_path(), "/var/lib/tucan.db");
    }

    #[test]
    fn empty_trigger_list_is_rejected() {
        let mut settings = Settings::default();
        settings.news_notifier_trigger_times.clear();
        assert!(settings.validate().is_err());
    }
}
