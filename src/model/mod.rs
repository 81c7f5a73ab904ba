//! Summarization and moderation backend clients.
//!
//! The engine talks to two endpoints: a text-summarization service that
//! turns a channel's threads into per-thread summaries, and a content
//! moderation classifier applied to generated text before it reaches the
//! user. Both are behind traits so the orchestrator can be exercised with
//! in-memory fakes.

mod moderation;
mod summary_api;

pub use moderation::{ModerationConfig, OpenAiModeration};
pub use summary_api::{SummaryApiClient, SummaryApiConfig};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// One thread of a summarization request, flattened into parallel arrays.
/// All arrays have the same length: one entry per message in the thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThreadPayload {
    pub messages: Vec<String>,
    pub names: Vec<String>,
    pub titles: Vec<String>,
    pub reactions: Vec<u32>,
}

/// Request for one channel's thread set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummarizeModelRequest {
    pub channel_name: String,
    pub threads: Vec<ThreadPayload>,
}

/// Per-thread summaries and titles, index-aligned with the request threads.
/// The backend may under- or over-return entries; callers must tolerate a
/// length mismatch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummarizeModelResponse {
    pub summary_by_thread: Vec<String>,
    pub titles: Vec<String>,
}

/// Moderation verdict for a piece of generated text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Moderation {
    pub flagged: bool,
}

/// Text-summarization backend.
#[async_trait]
pub trait SummaryModel: Send + Sync {
    /// Summarize one channel's threads. Implementations must reject with
    /// [`ModelError::EmptySummaries`] when the backend answers successfully
    /// but returns zero thread summaries.
    async fn summarize(
        &self,
        request: &SummarizeModelRequest,
        requesting_user: &str,
    ) -> Result<SummarizeModelResponse, ModelError>;
}

/// Content moderation backend.
#[async_trait]
pub trait ModerationModel: Send + Sync {
    async fn moderate(&self, text: &str) -> Result<Moderation, ModelError>;
}
