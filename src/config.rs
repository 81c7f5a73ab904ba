//! Engine configuration.
//!
//! Everything tunable lives here: retry budgets, the prompt-size ceiling,
//! fetch caps, and the collaborator endpoints. Construction is explicit;
//! nothing reads ambient globals after startup.

use std::time::Duration;

use crate::budget::PROMPT_BUDGET;
use crate::error::ConfigError;
use crate::model::{ModerationConfig, SummaryApiConfig};
use crate::slack::SlackConfig;

/// Tunables for the multi-channel summarizer.
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    /// Ceiling on the estimated request size, in characters.
    pub prompt_budget: usize,
    /// Cap on root messages fetched per channel.
    pub max_messages: usize,
    /// Retry budget for Slack fetches (roots, replies).
    pub fetch_attempts: u32,
    /// Linear backoff step for Slack fetch retries.
    pub fetch_backoff_step: Duration,
    /// Retry budget for one summarization model call.
    pub model_attempts: u32,
    /// Unit of the jittered model-call backoff. One minute in production;
    /// tests shrink it to milliseconds.
    pub model_backoff_unit: Duration,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            prompt_budget: PROMPT_BUDGET,
            max_messages: 100,
            fetch_attempts: 10,
            fetch_backoff_step: Duration::from_millis(1000),
            model_attempts: 10,
            model_backoff_unit: Duration::from_secs(60),
        }
    }
}

/// Full engine configuration: summarizer tunables plus collaborator
/// endpoints and credentials.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub summarizer: SummarizerConfig,
    pub slack: SlackConfig,
    pub summary_api: SummaryApiConfig,
    pub moderation: ModerationConfig,
}

impl EngineConfig {
    /// Load configuration from the environment (and `.env` if present).
    ///
    /// Required: `SLACK_BOT_TOKEN`, `SUMMARY_API_URL`, `SUMMARY_API_KEY`,
    /// `OPENAI_API_KEY`. Optional overrides: `THEGIST_PROMPT_BUDGET`,
    /// `THEGIST_MAX_MESSAGES`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };
        let parsed = |key: &str, default: usize| -> Result<usize, ConfigError> {
            match lookup(key) {
                None => Ok(default),
                Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("expected an integer, got {:?}", raw),
                }),
            }
        };

        let mut summarizer = SummarizerConfig::default();
        summarizer.prompt_budget = parsed("THEGIST_PROMPT_BUDGET", summarizer.prompt_budget)?;
        summarizer.max_messages = parsed("THEGIST_MAX_MESSAGES", summarizer.max_messages)?;

        Ok(Self {
            summarizer,
            slack: SlackConfig::new(required("SLACK_BOT_TOKEN")?),
            summary_api: SummaryApiConfig::new(
                required("SUMMARY_API_KEY")?,
                required("SUMMARY_API_URL")?,
            ),
            moderation: ModerationConfig::new(required("OPENAI_API_KEY")?),
        })
    }
}
