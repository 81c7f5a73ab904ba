//! Channel history access.
//!
//! [`ChannelHistory`] is the seam between the orchestrator and the Slack
//! Web API: root-message fetches bounded by a day window, reply fetches per
//! root, permalink resolution, and the requester's timezone offset.
//! [`SlackWebClient`] is the production implementation; tests swap in
//! in-memory fakes.

mod client;
mod types;
mod window;

pub use client::{SlackConfig, SlackWebClient};
pub use types::{ChannelRequest, MessageWithReplies, Reaction, RootMessage, cmp_ts};
pub use window::window_start_ts;

use async_trait::async_trait;

use crate::error::SlackError;

/// Read access to channel conversation history.
#[async_trait]
pub trait ChannelHistory: Send + Sync {
    /// Fetch up to `max_messages` top-level messages from `channel_id`,
    /// newest pages first but returned oldest-first, bounded by the
    /// requester's local day window and excluding messages authored by
    /// `exclude_user`.
    async fn fetch_root_messages(
        &self,
        channel_id: &str,
        exclude_user: &str,
        max_messages: usize,
        days_back: u32,
        tz_offset_secs: i32,
    ) -> Result<Vec<RootMessage>, SlackError>;

    /// Fetch the replies for each root message, excluding `exclude_user`.
    /// Roots without replies come back with an empty reply list.
    async fn fetch_replies(
        &self,
        channel_id: &str,
        roots: &[RootMessage],
        exclude_user: &str,
    ) -> Result<Vec<MessageWithReplies>, SlackError>;

    /// Resolve a permanent link to a message. Best-effort: callers must
    /// tolerate failure.
    async fn get_permalink(&self, channel_id: &str, message_ts: &str)
    -> Result<String, SlackError>;

    /// UTC offset in seconds from the user's profile.
    async fn requester_tz_offset(&self, user_id: &str) -> Result<i32, SlackError>;
}
