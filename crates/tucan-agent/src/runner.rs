use std::sync::Arc;

use tracing::debug;

use tucan_core::config::{ModelLimits, Settings};
use tucan_core::{Shutdown, SITE_TZ};

use crate::audit::AuditLog;
use crate::error::{AgentError, ProviderError, ResponseError};
use crate::provider::{build_provider, GenerateRequest, LlmProvider};
use crate::ratelimiter::RateLimiters;
use crate::schema::Schema;

const SUPPLEMENTARY_TEMPERATURE: f32 = 0.0;

const REPACK_PROMPT: &str = "\
You receive another model's free-form answer to a structured task.
Extract the information it contains and return it as JSON following the
provided schema exactly. Output nothing but the JSON.";

/// Which configured model an agent runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    Basic,
    Light,
}

/// Everything one agent invocation needs besides the user text: identity for
/// logging, model tier, sampling parameters, system prompt, response shape.
pub struct AgentSpec {
    pub agent_id: &'static str,
    pub tier: ModelTier,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system: String,
    pub schema: Schema,
}

struct TierConfig {
    limits: ModelLimits,
    /// The model lacks native structured output; its free-form answer is
    /// re-packed into schema JSON by the supplementary model.
    requires_supplementary: bool,
}

/// Drives agent invocations against the configured provider: rate limiting,
/// the optional supplementary re-pack step, and audit logging.
pub struct Runner {
    provider: Arc<dyn LlmProvider>,
    limiters: RateLimiters,
    basic: TierConfig,
    light: TierConfig,
    supplementary: Option<ModelLimits>,
    audit: Option<AuditLog>,
    shutdown: Shutdown,
}

impl Runner {
    pub fn from_settings(settings: &Settings, shutdown: Shutdown) -> Result<Self, AgentError> {
        let provider = build_provider(settings)?;
        Self::with_provider(provider, settings, shutdown)
    }

    /// Build a runner around an already-constructed provider (tests inject a
    /// scripted one here).
    pub fn with_provider(
        provider: Arc<dyn LlmProvider>,
        settings: &Settings,
        shutdown: Shutdown,
    ) -> Result<Self, AgentError> {
        let supplementary = settings.supplementary_model();
        let needs_supplementary = settings.agent_engine_basic_model_requires_supplementary
            || settings.agent_engine_light_model_requires_supplementary;
        if needs_supplementary && supplementary.is_none() {
            return Err(AgentError::Config(
                "a model requires the supplementary re-packer, \
                 but AGENT_ENGINE_SUPPLEMENTARY_MODEL is not set"
                    .into(),
            ));
        }
        Ok(Self {
            provider,
            limiters: RateLimiters::new(),
            basic: TierConfig {
                limits: settings.basic_model(),
                requires_supplementary: settings.agent_engine_basic_model_requires_supplementary,
            },
            light: TierConfig {
                limits: settings.light_model(),
                requires_supplementary: settings.agent_engine_light_model_requires_supplementary,
            },
            supplementary,
            audit: settings
                .keep_raw_engine_responses
                .then(|| AuditLog::new(settings.raw_engine_responses_dir.clone())),
            shutdown,
        })
    }

    async fn call(
        &self,
        limits: &ModelLimits,
        req: GenerateRequest,
        session_id: &str,
        agent_id: &str,
    ) -> Result<String, ProviderError> {
        if !self.limiters.acquire(limits, &self.shutdown).await {
            return Err(ProviderError::Interrupted);
        }
        let text = self.provider.generate(&req).await?;
        if let Some(ref audit) = self.audit {
            audit.record(session_id, agent_id, &text);
        }
        Ok(text)
    }

    /// Run one agent invocation and return the raw JSON string to
    /// deserialize. `session_id` only groups audit files.
    pub async fn run(
        &self,
        spec: &AgentSpec,
        session_id: &str,
        user: &str,
    ) -> Result<String, ResponseError> {
        let tier = match spec.tier {
            ModelTier::Basic => &self.basic,
            ModelTier::Light => &self.light,
        };

        debug!(
            agent = spec.agent_id,
            model = %tier.limits.name,
            provider = self.provider.name(),
            "invoking agent"
        );

        let request = GenerateRequest {
            model: tier.limits.name.clone(),
            system: spec.system.clone(),
            user: user.to_string(),
            temperature: spec.temperature,
            max_tokens: spec.max_tokens,
            schema: (!tier.requires_supplementary).then(|| spec.schema.clone()),
        };
        let text = self
            .call(&tier.limits, request, session_id, spec.agent_id)
            .await?;

        if !tier.requires_supplementary {
            return Ok(text);
        }

        // Presence enforced at construction time.
        let supplementary = self.supplementary.as_ref().ok_or_else(|| {
            ResponseError::Engine("supplementary model required but not configured".into())
        })?;
        let repack = GenerateRequest {
            model: supplementary.name.clone(),
            system: REPACK_PROMPT.to_string(),
            user: text,
            temperature: SUPPLEMENTARY_TEMPERATURE,
            max_tokens: spec.max_tokens,
            schema: Some(spec.schema.clone()),
        };
        let agent_id = format!("{}_repack", spec.agent_id);
        let repacked = self
            .call(supplementary, repack, session_id, &agent_id)
            .await?;
        Ok(repacked)
    }
}

/// Logging-only tag grouping one pipeline invocation's audit files.
pub fn session_id(article_id: i64) -> String {
    let now = chrono::Utc::now().with_timezone(&SITE_TZ);
    format!("{}_{article_id}", now.format("%Y%m%d_%H%M%S"))
}
