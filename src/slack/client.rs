//! Slack Web API client.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::types::{MessageWithReplies, Reaction, RootMessage, cmp_ts};
use super::window::window_start_ts;
use super::ChannelHistory;
use crate::error::SlackError;

/// Messages requested per history/replies page.
const PAGE_LIMIT: usize = 200;

/// Upper bound on history pages fetched per channel.
const MAX_PAGES: usize = 50;

/// Slack Web API configuration.
#[derive(Debug, Clone)]
pub struct SlackConfig {
    pub bot_token: SecretString,
    pub base_url: String,
    pub timeout: Duration,
}

impl SlackConfig {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: SecretString::from(bot_token.into()),
            base_url: "https://slack.com/api".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Reqwest-backed [`ChannelHistory`] implementation.
pub struct SlackWebClient {
    client: reqwest::Client,
    config: SlackConfig,
}

impl SlackWebClient {
    pub fn new(config: SlackConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn api_get<T>(&self, method: &str, query: &[(&str, String)]) -> Result<T, SlackError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}/{}", self.config.base_url, method);
        let response = self
            .client
            .get(&url)
            .bearer_auth(self.config.bot_token.expose_secret())
            .query(query)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| SlackError::RequestFailed {
                method: method.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SlackError::RequestFailed {
                method: method.to_string(),
                reason: format!("status {}", status),
            });
        }

        response.json().await.map_err(|e| SlackError::InvalidResponse {
            method: method.to_string(),
            reason: e.to_string(),
        })
    }

    /// Resolve a user's display name, caching per call site. Enrichment is
    /// best-effort: lookup failures fall back to the raw user id.
    async fn display_name(&self, user_id: &str, cache: &mut HashMap<String, String>) -> String {
        if let Some(name) = cache.get(user_id) {
            return name.clone();
        }
        let name = match self
            .api_get::<UserInfoResponse>("users.info", &[("user", user_id.to_string())])
            .await
        {
            Ok(resp) if resp.ok => resp.user.map(pick_display_name).unwrap_or_default(),
            Ok(resp) => {
                tracing::debug!(
                    user = user_id,
                    error = resp.error.as_deref().unwrap_or("unknown"),
                    "users.info lookup failed"
                );
                String::new()
            }
            Err(e) => {
                tracing::debug!(user = user_id, error = %e, "users.info request failed");
                String::new()
            }
        };
        let name = if name.is_empty() {
            user_id.to_string()
        } else {
            name
        };
        cache.insert(user_id.to_string(), name.clone());
        name
    }

    async fn enrich(
        &self,
        messages: Vec<WireMessage>,
        cache: &mut HashMap<String, String>,
    ) -> Vec<RootMessage> {
        let mut enriched = Vec::with_capacity(messages.len());
        for msg in messages {
            let Some(user_id) = msg.user.clone() else {
                continue;
            };
            let user_name = self.display_name(&user_id, cache).await;
            enriched.push(to_root_message(msg, user_id, user_name));
        }
        enriched
    }
}

#[async_trait]
impl ChannelHistory for SlackWebClient {
    async fn fetch_root_messages(
        &self,
        channel_id: &str,
        exclude_user: &str,
        max_messages: usize,
        days_back: u32,
        tz_offset_secs: i32,
    ) -> Result<Vec<RootMessage>, SlackError> {
        let oldest = window_start_ts(Utc::now(), days_back, tz_offset_secs);
        let mut collected: Vec<WireMessage> = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0;

        loop {
            let mut query = vec![
                ("channel", channel_id.to_string()),
                ("oldest", oldest.to_string()),
                ("limit", PAGE_LIMIT.to_string()),
            ];
            if let Some(ref c) = cursor {
                query.push(("cursor", c.clone()));
            }

            let resp: HistoryResponse = self.api_get("conversations.history", &query).await?;
            if !resp.ok {
                return Err(SlackError::Api {
                    method: "conversations.history".to_string(),
                    reason: resp.error.unwrap_or_else(|| "unknown".to_string()),
                });
            }

            collected.extend(
                resp.messages
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|m| is_root_candidate(m, exclude_user)),
            );

            pages += 1;
            cursor = resp
                .response_metadata
                .and_then(|m| m.next_cursor)
                .filter(|c| !c.is_empty());
            if collected.len() >= max_messages || cursor.is_none() || pages >= MAX_PAGES {
                break;
            }
        }

        collected.truncate(max_messages);

        let mut cache = HashMap::new();
        let mut roots = self.enrich(collected, &mut cache).await;
        roots.sort_by(|a, b| cmp_ts(&a.ts, &b.ts));
        Ok(roots)
    }

    async fn fetch_replies(
        &self,
        channel_id: &str,
        roots: &[RootMessage],
        exclude_user: &str,
    ) -> Result<Vec<MessageWithReplies>, SlackError> {
        let mut cache = HashMap::new();
        let mut bundles = Vec::with_capacity(roots.len());

        for root in roots {
            let query = vec![
                ("channel", channel_id.to_string()),
                ("ts", root.ts.clone()),
                ("limit", PAGE_LIMIT.to_string()),
            ];
            let resp: HistoryResponse = self.api_get("conversations.replies", &query).await?;
            if !resp.ok {
                return Err(SlackError::Api {
                    method: "conversations.replies".to_string(),
                    reason: resp.error.unwrap_or_else(|| "unknown".to_string()),
                });
            }

            let replies: Vec<WireMessage> = resp
                .messages
                .unwrap_or_default()
                .into_iter()
                .filter(|m| m.ts != root.ts && is_reply_candidate(m, exclude_user))
                .collect();

            let mut replies = self.enrich(replies, &mut cache).await;
            replies.sort_by(|a, b| cmp_ts(&a.ts, &b.ts));
            bundles.push(MessageWithReplies {
                message: root.clone(),
                replies,
            });
        }

        Ok(bundles)
    }

    async fn get_permalink(
        &self,
        channel_id: &str,
        message_ts: &str,
    ) -> Result<String, SlackError> {
        let query = vec![
            ("channel", channel_id.to_string()),
            ("message_ts", message_ts.to_string()),
        ];
        let resp: PermalinkResponse = self.api_get("chat.getPermalink", &query).await?;
        if !resp.ok {
            return Err(SlackError::Api {
                method: "chat.getPermalink".to_string(),
                reason: resp.error.unwrap_or_else(|| "unknown".to_string()),
            });
        }
        resp.permalink.ok_or_else(|| SlackError::InvalidResponse {
            method: "chat.getPermalink".to_string(),
            reason: "missing permalink field".to_string(),
        })
    }

    async fn requester_tz_offset(&self, user_id: &str) -> Result<i32, SlackError> {
        let resp: UserInfoResponse = self
            .api_get("users.info", &[("user", user_id.to_string())])
            .await?;
        if !resp.ok {
            return Err(SlackError::Api {
                method: "users.info".to_string(),
                reason: resp.error.unwrap_or_else(|| "unknown".to_string()),
            });
        }
        let user = resp.user.ok_or_else(|| SlackError::InvalidResponse {
            method: "users.info".to_string(),
            reason: "missing user field".to_string(),
        })?;
        Ok(user.tz_offset.unwrap_or(0))
    }
}

// -- Wire shapes --

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    ok: bool,
    error: Option<String>,
    messages: Option<Vec<WireMessage>>,
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    next_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct WireMessage {
    ts: String,
    text: Option<String>,
    user: Option<String>,
    bot_id: Option<String>,
    thread_ts: Option<String>,
    subtype: Option<String>,
    reactions: Option<Vec<WireReaction>>,
}

#[derive(Debug, Clone, Deserialize)]
struct WireReaction {
    name: String,
    count: u32,
}

#[derive(Debug, Deserialize)]
struct PermalinkResponse {
    ok: bool,
    error: Option<String>,
    permalink: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    ok: bool,
    error: Option<String>,
    user: Option<WireUser>,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    #[allow(dead_code)]
    id: Option<String>,
    name: Option<String>,
    real_name: Option<String>,
    tz_offset: Option<i32>,
    profile: Option<WireProfile>,
}

#[derive(Debug, Deserialize)]
struct WireProfile {
    display_name: Option<String>,
    real_name: Option<String>,
}

/// A history message qualifies as a thread root when it is an ordinary user
/// message (no subtype, not from a bot, not authored by `exclude_user`),
/// carries text, and is not a reply into some other thread.
fn is_root_candidate(msg: &WireMessage, exclude_user: &str) -> bool {
    let authored = msg
        .user
        .as_deref()
        .is_some_and(|u| !u.is_empty() && u != exclude_user);
    let is_reply = msg
        .thread_ts
        .as_deref()
        .is_some_and(|root_ts| root_ts != msg.ts);
    authored
        && msg.bot_id.is_none()
        && msg.subtype.is_none()
        && msg.text.as_deref().is_some_and(|t| !t.is_empty())
        && !is_reply
}

/// Replies use the same filter minus the thread-position check.
fn is_reply_candidate(msg: &WireMessage, exclude_user: &str) -> bool {
    let authored = msg
        .user
        .as_deref()
        .is_some_and(|u| !u.is_empty() && u != exclude_user);
    authored
        && msg.bot_id.is_none()
        && msg.subtype.is_none()
        && msg.text.as_deref().is_some_and(|t| !t.is_empty())
}

fn pick_display_name(user: WireUser) -> String {
    user.profile
        .and_then(|p| {
            p.display_name
                .filter(|n| !n.is_empty())
                .or(p.real_name.filter(|n| !n.is_empty()))
        })
        .or(user.real_name.filter(|n| !n.is_empty()))
        .or(user.name.filter(|n| !n.is_empty()))
        .unwrap_or_default()
}

fn to_root_message(msg: WireMessage, user_id: String, user_name: String) -> RootMessage {
    RootMessage {
        ts: msg.ts,
        text: msg.text.unwrap_or_default(),
        user_id,
        user_name,
        reactions: msg
            .reactions
            .unwrap_or_default()
            .into_iter()
            .map(|r| Reaction {
                name: r.name,
                count: r.count,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(ts: &str, user: Option<&str>, text: &str) -> WireMessage {
        WireMessage {
            ts: ts.to_string(),
            text: Some(text.to_string()),
            user: user.map(str::to_string),
            bot_id: None,
            thread_ts: None,
            subtype: None,
            reactions: None,
        }
    }

    // ── Root candidate filtering ──

    #[test]
    fn test_plain_user_message_is_root() {
        assert!(is_root_candidate(&wire("1.0", Some("U1"), "hello"), "UBOT"));
    }

    #[test]
    fn test_excluded_user_is_dropped() {
        assert!(!is_root_candidate(&wire("1.0", Some("UBOT"), "hi"), "UBOT"));
    }

    #[test]
    fn test_bot_message_is_dropped() {
        let mut msg = wire("1.0", Some("U1"), "hi");
        msg.bot_id = Some("B1".to_string());
        assert!(!is_root_candidate(&msg, "UBOT"));
    }

    #[test]
    fn test_subtype_message_is_dropped() {
        let mut msg = wire("1.0", Some("U1"), "joined");
        msg.subtype = Some("channel_join".to_string());
        assert!(!is_root_candidate(&msg, "UBOT"));
    }

    #[test]
    fn test_thread_reply_is_not_root() {
        let mut msg = wire("2.0", Some("U1"), "reply");
        msg.thread_ts = Some("1.0".to_string());
        assert!(!is_root_candidate(&msg, "UBOT"));
    }

    #[test]
    fn test_thread_parent_is_root() {
        let mut msg = wire("1.0", Some("U1"), "parent");
        msg.thread_ts = Some("1.0".to_string());
        assert!(is_root_candidate(&msg, "UBOT"));
    }

    #[test]
    fn test_empty_text_is_dropped() {
        assert!(!is_root_candidate(&wire("1.0", Some("U1"), ""), "UBOT"));
        let mut msg = wire("1.0", Some("U1"), "x");
        msg.text = None;
        assert!(!is_root_candidate(&msg, "UBOT"));
    }

    #[test]
    fn test_reply_candidate_allows_threaded_position() {
        let mut msg = wire("2.0", Some("U1"), "reply");
        msg.thread_ts = Some("1.0".to_string());
        assert!(is_reply_candidate(&msg, "UBOT"));
    }

    // ── Display name fallback chain ──

    #[test]
    fn test_display_name_prefers_profile() {
        let user = WireUser {
            id: Some("U1".to_string()),
            name: Some("alice.w".to_string()),
            real_name: Some("Alice Walker".to_string()),
            tz_offset: None,
            profile: Some(WireProfile {
                display_name: Some("alice".to_string()),
                real_name: Some("Alice Walker".to_string()),
            }),
        };
        assert_eq!(pick_display_name(user), "alice");
    }

    #[test]
    fn test_display_name_falls_back_through_chain() {
        let user = WireUser {
            id: Some("U1".to_string()),
            name: Some("alice.w".to_string()),
            real_name: None,
            tz_offset: None,
            profile: Some(WireProfile {
                display_name: Some(String::new()),
                real_name: None,
            }),
        };
        assert_eq!(pick_display_name(user), "alice.w");
    }

    #[test]
    fn test_display_name_empty_when_nothing_set() {
        let user = WireUser {
            id: None,
            name: None,
            real_name: None,
            tz_offset: None,
            profile: None,
        };
        assert_eq!(pick_display_name(user), "");
    }

    // ── Wire-to-domain mapping ──

    #[test]
    fn test_to_root_message_maps_reactions() {
        let mut msg = wire("1.5", Some("U1"), "nice");
        msg.reactions = Some(vec![WireReaction {
            name: "thumbsup".to_string(),
            count: 4,
        }]);
        let root = to_root_message(msg, "U1".to_string(), "alice".to_string());
        assert_eq!(root.ts, "1.5");
        assert_eq!(root.user_name, "alice");
        assert_eq!(root.reaction_total(), 4);
    }

    #[test]
    fn test_history_response_parses_minimal_payload() {
        let body = r#"{"ok":true,"messages":[{"ts":"1.0","text":"hi","user":"U1"}]}"#;
        let resp: HistoryResponse = serde_json::from_str(body).unwrap();
        assert!(resp.ok);
        assert_eq!(resp.messages.unwrap().len(), 1);
    }

    #[test]
    fn test_history_response_parses_error_payload() {
        let body = r#"{"ok":false,"error":"channel_not_found"}"#;
        let resp: HistoryResponse = serde_json::from_str(body).unwrap();
        assert!(!resp.ok);
        assert_eq!(resp.error.as_deref(), Some("channel_not_found"));
    }
}
