//! Summarization service client.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{SummarizeModelRequest, SummarizeModelResponse, SummaryModel};
use crate::error::ModelError;

/// Summarization backend configuration.
#[derive(Debug, Clone)]
pub struct SummaryApiConfig {
    pub api_key: SecretString,
    pub base_url: String,
    /// Summarization is slow on busy channels; the whole request gets ten
    /// minutes before it counts as failed.
    pub timeout: Duration,
}

impl SummaryApiConfig {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            base_url: base_url.into(),
            timeout: Duration::from_secs(600),
        }
    }
}

/// HTTP client for the thread-summarization service.
pub struct SummaryApiClient {
    client: reqwest::Client,
    config: SummaryApiConfig,
}

impl SummaryApiClient {
    pub fn new(config: SummaryApiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/summarize", self.config.base_url.trim_end_matches('/'))
    }
}

// -- Wire shapes --

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    channel_name: &'a str,
    threads: &'a [super::ThreadPayload],
    requesting_user: &'a str,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    summary_by_thread: Option<Vec<String>>,
    titles: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct WireErrorResponse {
    error: Option<WireErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct WireErrorDetail {
    message: String,
}

/// Decode a successful body into a response, rejecting empty summary sets.
fn decode_response(body: &str) -> Result<SummarizeModelResponse, ModelError> {
    let wire: WireResponse =
        serde_json::from_str(body).map_err(|e| ModelError::InvalidResponse {
            reason: format!("malformed body: {}", e),
        })?;
    let summary_by_thread = wire.summary_by_thread.unwrap_or_default();
    if summary_by_thread.is_empty() {
        return Err(ModelError::EmptySummaries);
    }
    Ok(SummarizeModelResponse {
        summary_by_thread,
        titles: wire.titles.unwrap_or_default(),
    })
}

#[async_trait]
impl SummaryModel for SummaryApiClient {
    async fn summarize(
        &self,
        request: &SummarizeModelRequest,
        requesting_user: &str,
    ) -> Result<SummarizeModelResponse, ModelError> {
        let wire_request = WireRequest {
            channel_name: &request.channel_name,
            threads: &request.threads,
            requesting_user,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&wire_request)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| ModelError::RequestFailed {
                reason: format!("HTTP request failed: {}", e),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ModelError::RateLimited);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<WireErrorResponse>(&error_text)
                .ok()
                .and_then(|e| e.error.map(|d| d.message))
                .unwrap_or(error_text);
            return Err(ModelError::RequestFailed {
                reason: format!("status {}: {}", status, reason),
            });
        }

        let body = response.text().await.map_err(|e| ModelError::InvalidResponse {
            reason: format!("failed to read body: {}", e),
        })?;
        decode_response(&body)
    }
}
