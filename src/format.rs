//! User-facing rendering of batch results.
//!
//! Two layers: one display line per channel, and an aggregate warning used
//! instead of per-channel lines when the whole batch failed in a uniform
//! way. The aggregate rules are evaluated strictly in written order; the
//! first matching rule wins.

use std::collections::HashMap;

use crate::summarizer::{ChannelSummary, MultiChannelSummary, SummaryError};

const WARNING: &str = "\u{26a0}\u{fe0f}";

pub const MSG_MIXED_FAILURE: &str = "\u{26a0}\u{fe0f} Unfortunately the channels you selected either didn't have enough messages, were flagged as inappropriate, or failed to generate summaries.";
pub const MSG_ALL_TOO_SMALL: &str =
    "\u{26a0}\u{fe0f} None of the channels you selected had enough meaningful conversations to summarize.";
pub const MSG_ALL_MODERATED: &str =
    "\u{26a0}\u{fe0f} The summaries for all of the channels you selected were flagged as inappropriate.";
pub const MSG_ALL_FAILED: &str =
    "\u{26a0}\u{fe0f} We couldn't generate summaries for the channels you selected. We're on it!";
pub const MSG_TOO_SMALL_OR_MODERATED: &str = "\u{26a0}\u{fe0f} The channels you selected either didn't have enough messages or their summaries were flagged as inappropriate.";
pub const MSG_MODERATED_OR_FAILED: &str = "\u{26a0}\u{fe0f} The summaries for the channels you selected were either flagged as inappropriate or failed to generate.";
pub const MSG_TOO_SMALL_OR_FAILED: &str = "\u{26a0}\u{fe0f} The channels you selected either didn't have enough messages or their summaries failed to generate.";

/// Render one channel's display line.
///
/// Successes link to the earliest summarized message when a permalink is
/// available and fall back to the raw channel id reference when it is not.
pub fn channel_line(summary: &ChannelSummary, permalink: Option<&str>) -> String {
    match summary.error {
        None => match permalink {
            Some(link) => format!(
                "<{}|#{}>\n{}",
                link, summary.channel_name, summary.summary
            ),
            None => format!("#{}\n{}", summary.channel_id, summary.summary),
        },
        Some(SummaryError::Moderated) => format!(
            "{} The summary for #{} was flagged as inappropriate.",
            WARNING, summary.channel_name
        ),
        Some(SummaryError::ChannelTooSmall) => format!(
            "{} #{} didn't have enough messages to summarize.",
            WARNING, summary.channel_name
        ),
        Some(SummaryError::GeneralError) => format!(
            "{} We couldn't generate a summary for #{}. We're on it!",
            WARNING, summary.channel_name
        ),
    }
}

/// Render every channel's line, looking up permalinks by channel id.
pub fn channel_lines(
    output: &MultiChannelSummary,
    permalinks: &HashMap<String, String>,
) -> Vec<String> {
    output
        .summaries
        .iter()
        .map(|s| channel_line(s, permalinks.get(&s.channel_id).map(String::as_str)))
        .collect()
}

/// Pick a single combined warning for the whole batch, or `None` when the
/// channels should be rendered individually.
///
/// The rules are order-sensitive and checked in written order:
/// 1. batch-level error, zero results, or every channel failed with all
///    three kinds represented;
/// 2.-4. every channel failed with the same single kind;
/// 5.-7. the batch split evenly between two failure kinds;
/// 8. anything else renders individually.
pub fn aggregate_error_message(output: &MultiChannelSummary) -> Option<String> {
    let total = output.summaries.len();
    let too_small = count(output, SummaryError::ChannelTooSmall);
    let moderated = count(output, SummaryError::Moderated);
    let failed = count(output, SummaryError::GeneralError);

    if output.error.is_some()
        || total == 0
        || (too_small > 0
            && moderated > 0
            && failed > 0
            && too_small + moderated + failed == total)
    {
        return Some(MSG_MIXED_FAILURE.to_string());
    }
    if too_small == total {
        return Some(MSG_ALL_TOO_SMALL.to_string());
    }
    if moderated == total {
        return Some(MSG_ALL_MODERATED.to_string());
    }
    if failed == total {
        return Some(MSG_ALL_FAILED.to_string());
    }
    if moderated > 0 && too_small > 0 && moderated == too_small && moderated + too_small == total {
        return Some(MSG_TOO_SMALL_OR_MODERATED.to_string());
    }
    if moderated > 0 && failed > 0 && moderated == failed && moderated + failed == total {
        return Some(MSG_MODERATED_OR_FAILED.to_string());
    }
    if too_small > 0 && failed > 0 && too_small == failed && too_small + failed == total {
        return Some(MSG_TOO_SMALL_OR_FAILED.to_string());
    }
    None
}

fn count(output: &MultiChannelSummary, kind: SummaryError) -> usize {
    output
        .summaries
        .iter()
        .filter(|s| s.error == Some(kind))
        .count()
}
