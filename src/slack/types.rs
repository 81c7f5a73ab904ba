//! Domain types for channel history.

use serde::{Deserialize, Serialize};

/// A channel selected for summarization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelRequest {
    pub channel_id: String,
    pub channel_name: String,
}

impl ChannelRequest {
    pub fn new(channel_id: impl Into<String>, channel_name: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            channel_name: channel_name.into(),
        }
    }
}

/// An emoji reaction on a message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reaction {
    pub name: String,
    pub count: u32,
}

/// A top-level (non-reply) channel message, enriched with the author's
/// display name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RootMessage {
    /// Slack message timestamp, e.g. `"1717000000.000100"`. Doubles as the
    /// message id.
    pub ts: String,
    pub text: String,
    pub user_id: String,
    pub user_name: String,
    pub reactions: Vec<Reaction>,
}

impl RootMessage {
    /// Total reaction count across all emoji.
    pub fn reaction_total(&self) -> u32 {
        self.reactions.iter().map(|r| r.count).sum()
    }
}

/// A root message bundled with its replies, in timestamp order.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageWithReplies {
    pub message: RootMessage,
    pub replies: Vec<RootMessage>,
}

/// Compare two Slack timestamps numerically, oldest first.
///
/// Timestamps are `seconds.fraction` strings; parsing as f64 keeps ordering
/// stable across differing fraction widths. Unparseable values fall back to
/// lexicographic order so the sort stays total.
pub fn cmp_ts(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
        _ => a.cmp(b),
    }
}
