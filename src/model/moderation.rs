//! Content moderation client (OpenAI moderations endpoint).

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{Moderation, ModerationModel};
use crate::error::ModelError;

/// Moderation backend configuration.
#[derive(Debug, Clone)]
pub struct ModerationConfig {
    pub api_key: SecretString,
    pub base_url: String,
    /// Moderation is a short classification call; anything slower than ten
    /// seconds is treated as a failure.
    pub timeout: Duration,
}

impl ModerationConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            base_url: "https://api.openai.com".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// OpenAI moderations client.
pub struct OpenAiModeration {
    client: reqwest::Client,
    config: ModerationConfig,
}

impl OpenAiModeration {
    pub fn new(config: ModerationConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

// -- Wire shapes --

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    results: Option<Vec<WireResult>>,
}

#[derive(Debug, Deserialize)]
struct WireResult {
    flagged: bool,
}

/// Any flagged result flags the whole text.
fn decode_response(body: &str) -> Result<Moderation, ModelError> {
    let wire: WireResponse =
        serde_json::from_str(body).map_err(|e| ModelError::InvalidResponse {
            reason: format!("malformed moderation body: {}", e),
        })?;
    let results = wire.results.ok_or_else(|| ModelError::InvalidResponse {
        reason: "missing results field".to_string(),
    })?;
    Ok(Moderation {
        flagged: results.iter().any(|r| r.flagged),
    })
}

#[async_trait]
impl ModerationModel for OpenAiModeration {
    async fn moderate(&self, text: &str) -> Result<Moderation, ModelError> {
        let url = format!(
            "{}/v1/moderations",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&WireRequest { input: text })
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| ModelError::RequestFailed {
                reason: format!("moderation request failed: {}", e),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ModelError::RateLimited);
        }
        if !status.is_success() {
            return Err(ModelError::RequestFailed {
                reason: format!("moderation status {}", status),
            });
        }

        let body = response.text().await.map_err(|e| ModelError::InvalidResponse {
            reason: format!("failed to read moderation body: {}", e),
        })?;
        decode_response(&body)
    }
}
