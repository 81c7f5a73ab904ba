//! Multi-channel summarization orchestration.
//!
//! The orchestrator fans out over the requested channels, isolates each
//! channel's failures, fits every request under the prompt budget by
//! evicting the oldest threads, and aggregates per-channel outcomes into a
//! single result the formatter can render.

mod fit;
mod multi_channel;

pub use multi_channel::MultiChannelSummarizer;

use serde::{Deserialize, Serialize};

/// Terminal per-channel failure kinds. Carried as data on the channel's
/// result; never thrown past the channel's own task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryError {
    /// The channel had no qualifying messages in the window.
    ChannelTooSmall,
    /// The generated summary was flagged by content moderation.
    Moderated,
    /// Any other unrecoverable failure after retries were exhausted.
    GeneralError,
}

/// Final per-channel result. Exactly one of `summary` (non-empty) or
/// `error` is meaningful.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelSummary {
    pub channel_id: String,
    pub channel_name: String,
    pub summary: String,
    /// Message id of the first message in the oldest surviving thread.
    /// Empty on error.
    pub earliest_message_ts: String,
    pub error: Option<SummaryError>,
}

impl ChannelSummary {
    pub(crate) fn success(
        channel: &crate::slack::ChannelRequest,
        summary: String,
        earliest_message_ts: String,
    ) -> Self {
        Self {
            channel_id: channel.channel_id.clone(),
            channel_name: channel.channel_name.clone(),
            summary,
            earliest_message_ts,
            error: None,
        }
    }

    pub(crate) fn failed(channel: &crate::slack::ChannelRequest, error: SummaryError) -> Self {
        Self {
            channel_id: channel.channel_id.clone(),
            channel_name: channel.channel_name.clone(),
            summary: String::new(),
            earliest_message_ts: String::new(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregated batch result. The top-level `error` is set only when the
/// batch-level operation itself failed (requester lookup), never for
/// individual channel failures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MultiChannelSummary {
    pub summaries: Vec<ChannelSummary>,
    pub error: Option<SummaryError>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slack::ChannelRequest;

    #[test]
    fn test_summary_error_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&SummaryError::ChannelTooSmall).unwrap(),
            "\"channel_too_small\""
        );
        assert_eq!(
            serde_json::to_string(&SummaryError::Moderated).unwrap(),
            "\"moderated\""
        );
        assert_eq!(
            serde_json::to_string(&SummaryError::GeneralError).unwrap(),
            "\"general_error\""
        );
    }

    #[test]
    fn test_failed_summary_has_empty_summary_text() {
        let channel = ChannelRequest::new("C1", "general");
        let failed = ChannelSummary::failed(&channel, SummaryError::Moderated);
        assert_eq!(failed.summary, "");
        assert_eq!(failed.earliest_message_ts, "");
        assert!(!failed.is_success());
    }

    #[test]
    fn test_success_summary_keeps_channel_identity() {
        let channel = ChannelRequest::new("C2", "releases");
        let ok = ChannelSummary::success(&channel, "shipped 1.2".to_string(), "1.0".to_string());
        assert_eq!(ok.channel_id, "C2");
        assert_eq!(ok.channel_name, "releases");
        assert!(ok.is_success());
    }
}
