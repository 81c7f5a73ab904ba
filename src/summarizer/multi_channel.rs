//! The multi-channel summarizer.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use futures::future::join_all;

use super::fit::fit_to_budget;
use super::{ChannelSummary, MultiChannelSummary, SummaryError};
use crate::config::SummarizerConfig;
use crate::format;
use crate::model::{ModerationModel, SummarizeModelResponse, SummaryModel};
use crate::retry::{Backoff, RetryPolicy, retry};
use crate::slack::{ChannelHistory, ChannelRequest};
use crate::threads::{self, ThreadRecord};

/// Orchestrates summarization across an arbitrary list of channels.
///
/// Every collaborator is injected at construction; the orchestrator holds
/// no ambient state. Channel tasks run concurrently and never share
/// mutable state: each owns its thread queue, and one channel's failure is
/// converted to a tagged result inside its own task.
pub struct MultiChannelSummarizer {
    history: Arc<dyn ChannelHistory>,
    model: Arc<dyn SummaryModel>,
    moderation: Arc<dyn ModerationModel>,
    config: SummarizerConfig,
}

impl MultiChannelSummarizer {
    pub fn new(
        history: Arc<dyn ChannelHistory>,
        model: Arc<dyn SummaryModel>,
        moderation: Arc<dyn ModerationModel>,
        config: SummarizerConfig,
    ) -> Self {
        Self {
            history,
            model,
            moderation,
            config,
        }
    }

    /// Summarize every channel in the batch.
    ///
    /// Returns one entry per requested channel, tagged with its outcome.
    /// Result order is not part of the contract; callers must match
    /// results to channels by `channel_id`, not by position. The call never
    /// fails: the only batch-fatal condition (the requesting user's
    /// profile lookup) is reported through the top-level `error` field.
    pub async fn summarize(
        &self,
        channels: &[ChannelRequest],
        requesting_user: &str,
        bot_user: &str,
        days_back: u32,
    ) -> MultiChannelSummary {
        let tz_offset = match self.history.requester_tz_offset(requesting_user).await {
            Ok(offset) => offset,
            Err(e) => {
                tracing::error!(
                    user = requesting_user,
                    error = %e,
                    "Requester profile lookup failed, aborting batch"
                );
                return MultiChannelSummary {
                    summaries: Vec::new(),
                    error: Some(SummaryError::GeneralError),
                };
            }
        };

        tracing::info!(
            channels = channels.len(),
            days_back,
            "Starting multi-channel summarization"
        );

        let tasks = channels.iter().map(|channel| {
            self.summarize_channel(channel, requesting_user, bot_user, days_back, tz_offset)
        });
        let summaries = join_all(tasks).await;

        MultiChannelSummary {
            summaries,
            error: None,
        }
    }

    /// Summarize the batch and render user-facing lines: either a single
    /// aggregate warning, or one line per channel with best-effort
    /// permalinks on successes.
    pub async fn summarize_formatted(
        &self,
        channels: &[ChannelRequest],
        requesting_user: &str,
        bot_user: &str,
        days_back: u32,
    ) -> Vec<String> {
        let output = self
            .summarize(channels, requesting_user, bot_user, days_back)
            .await;
        if let Some(message) = format::aggregate_error_message(&output) {
            return vec![message];
        }
        let permalinks = self.permalinks_for(&output).await;
        format::channel_lines(&output, &permalinks)
    }

    /// Resolve a permalink for each successful summary's earliest message.
    /// Best-effort: failures are logged and the channel falls back to its
    /// id reference when formatted.
    pub async fn permalinks_for(&self, output: &MultiChannelSummary) -> HashMap<String, String> {
        let mut permalinks = HashMap::new();
        for summary in output
            .summaries
            .iter()
            .filter(|s| s.is_success() && !s.earliest_message_ts.is_empty())
        {
            match self
                .history
                .get_permalink(&summary.channel_id, &summary.earliest_message_ts)
                .await
            {
                Ok(link) => {
                    permalinks.insert(summary.channel_id.clone(), link);
                }
                Err(e) => {
                    tracing::debug!(
                        channel = %summary.channel_id,
                        error = %e,
                        "Permalink resolution failed"
                    );
                }
            }
        }
        permalinks
    }

    /// One channel's whole pipeline. Infallible by construction: every
    /// failure is folded into the returned summary's error tag.
    async fn summarize_channel(
        &self,
        channel: &ChannelRequest,
        requesting_user: &str,
        bot_user: &str,
        days_back: u32,
        tz_offset: i32,
    ) -> ChannelSummary {
        match self
            .try_summarize_channel(channel, requesting_user, bot_user, days_back, tz_offset)
            .await
        {
            Ok(summary) => summary,
            Err(error) => ChannelSummary::failed(channel, error),
        }
    }

    /// Linear-backoff policy for Slack fetches and moderation calls.
    fn fetch_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.config.fetch_attempts,
            backoff: Backoff::Linear {
                step: self.config.fetch_backoff_step,
            },
        }
    }

    async fn try_summarize_channel(
        &self,
        channel: &ChannelRequest,
        requesting_user: &str,
        bot_user: &str,
        days_back: u32,
        tz_offset: i32,
    ) -> Result<ChannelSummary, SummaryError> {
        let fetch_policy = self.fetch_policy();

        let mut roots = retry(&fetch_policy, || {
            self.history.fetch_root_messages(
                &channel.channel_id,
                bot_user,
                self.config.max_messages,
                days_back,
                tz_offset,
            )
        })
        .await
        .map_err(|e| {
            tracing::warn!(channel = %channel.channel_id, error = %e, "History fetch failed");
            SummaryError::GeneralError
        })?;

        if roots.is_empty() {
            tracing::info!(channel = %channel.channel_id, "No qualifying messages in window");
            return Err(SummaryError::ChannelTooSmall);
        }
        threads::sort_ascending(&mut roots);

        let bundles = retry(&fetch_policy, || {
            self.history
                .fetch_replies(&channel.channel_id, &roots, bot_user)
        })
        .await
        .map_err(|e| {
            tracing::warn!(channel = %channel.channel_id, error = %e, "Reply fetch failed");
            SummaryError::GeneralError
        })?;

        let mut queue: VecDeque<ThreadRecord> = threads::build_threads(&bundles).into();
        self.summarize_threads(channel, requesting_user, &mut queue)
            .await
    }

    /// The size-fitting loop. Owns the channel's thread queue: fit under
    /// the budget, call the model, and on failure evict the oldest thread
    /// and try again until the queue runs dry.
    async fn summarize_threads(
        &self,
        channel: &ChannelRequest,
        requesting_user: &str,
        queue: &mut VecDeque<ThreadRecord>,
    ) -> Result<ChannelSummary, SummaryError> {
        let model_policy =
            RetryPolicy::jittered(self.config.model_attempts, self.config.model_backoff_unit);
        let moderation_policy = self.fetch_policy();

        loop {
            let Some(request) =
                fit_to_budget(&channel.channel_name, queue, self.config.prompt_budget)
            else {
                tracing::warn!(
                    channel = %channel.channel_id,
                    "Ran out of threads before producing a summary"
                );
                return Err(SummaryError::GeneralError);
            };

            let response = match retry(&model_policy, || {
                self.model.summarize(&request, requesting_user)
            })
            .await
            {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(
                        channel = %channel.channel_id,
                        error = %e,
                        remaining = queue.len().saturating_sub(1),
                        "Model call failed, evicting oldest thread"
                    );
                    queue.pop_front();
                    continue;
                }
            };

            let summary = compose_summary(&response);
            let moderation = retry(&moderation_policy, || self.moderation.moderate(&summary))
                .await
                .map_err(|e| {
                    tracing::warn!(channel = %channel.channel_id, error = %e, "Moderation failed");
                    SummaryError::GeneralError
                })?;
            if moderation.flagged {
                tracing::info!(channel = %channel.channel_id, "Summary flagged by moderation");
                return Err(SummaryError::Moderated);
            }

            let earliest_message_ts = queue
                .front()
                .and_then(|thread| thread.message_ids.first())
                .cloned()
                .unwrap_or_default();
            return Ok(ChannelSummary::success(channel, summary, earliest_message_ts));
        }
    }
}

/// Stitch per-thread summaries into one channel summary. Tolerates a
/// backend that returns fewer or more titles than summaries.
fn compose_summary(response: &SummarizeModelResponse) -> String {
    response
        .summary_by_thread
        .iter()
        .enumerate()
        .map(|(i, summary)| {
            match response.titles.get(i).filter(|title| !title.is_empty()) {
                Some(title) => format!("*{}*\n{}", title, summary),
                None => summary.clone(),
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
