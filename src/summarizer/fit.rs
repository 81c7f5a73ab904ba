//! Prompt-budget fitting.
//!
//! Builds the model request for a channel's thread queue and evicts the
//! oldest threads from the front until the estimated size fits the budget.

use std::collections::VecDeque;

use crate::budget::estimate_size;
use crate::model::{SummarizeModelRequest, ThreadPayload};
use crate::threads::ThreadRecord;

fn to_payload(thread: &ThreadRecord) -> ThreadPayload {
    ThreadPayload {
        messages: thread.messages.clone(),
        names: thread.users.clone(),
        titles: thread.titles.clone(),
        reactions: thread.reactions.clone(),
    }
}

/// Assemble the request for the current thread queue, oldest thread first.
pub(crate) fn build_request(
    channel_name: &str,
    threads: &VecDeque<ThreadRecord>,
) -> SummarizeModelRequest {
    SummarizeModelRequest {
        channel_name: channel_name.to_string(),
        threads: threads.iter().map(to_payload).collect(),
    }
}

/// Evict oldest threads until the request fits under `budget`.
///
/// Returns the fitted request, or `None` when eviction emptied the queue
/// (a single oversized thread is evicted too; there is no partial-thread
/// truncation).
pub(crate) fn fit_to_budget(
    channel_name: &str,
    threads: &mut VecDeque<ThreadRecord>,
    budget: usize,
) -> Option<SummarizeModelRequest> {
    loop {
        if threads.is_empty() {
            return None;
        }
        let request = build_request(channel_name, threads);
        let size = estimate_size(&request);
        if size <= budget {
            return Some(request);
        }
        threads.pop_front();
        tracing::debug!(
            channel = channel_name,
            size,
            budget,
            remaining = threads.len(),
            "Evicted oldest thread to fit prompt budget"
        );
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn thread(text: &str) -> ThreadRecord {
        ThreadRecord {
            message_ids: vec!["1.0".to_string()],
            messages: vec![text.to_string()],
            users: vec!["alice".to_string()],
            user_ids: vec!["U1".to_string()],
            reactions: vec![0],
            titles: vec![String::new()],
        }
    }

    fn queue_of(texts: &[&str]) -> VecDeque<ThreadRecord> {
        texts.iter().map(|t| thread(t)).collect()
    }

    #[test]
    fn test_request_preserves_thread_order() {
        let queue = queue_of(&["oldest", "middle", "newest"]);
        let request = build_request("general", &queue);
        let firsts: Vec<_> = request
            .threads
            .iter()
            .map(|t| t.messages[0].as_str())
            .collect();
        assert_eq!(firsts, vec!["oldest", "middle", "newest"]);
    }

    #[test]
    fn test_fitting_request_is_untouched() {
        let mut queue = queue_of(&["short", "also short"]);
        let request = fit_to_budget("general", &mut queue, 15_000).unwrap();
        assert_eq!(request.threads.len(), 2);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_evicts_oldest_first() {
        // Each thread costs message + name + 2 + 2; budget forces exactly
        // one eviction.
        let mut queue = queue_of(&["aaaaaaaaaa", "bbbbbbbbbb", "cccccccccc"]);
        let one_thread = estimate_size(&build_request("general", &queue_of(&["aaaaaaaaaa"])));
        let budget = one_thread * 2;
        let request = fit_to_budget("general", &mut queue, budget).unwrap();
        let firsts: Vec<_> = request
            .threads
            .iter()
            .map(|t| t.messages[0].as_str())
            .collect();
        assert_eq!(firsts, vec!["bbbbbbbbbb", "cccccccccc"]);
    }

    #[test]
    fn test_each_eviction_strictly_shrinks() {
        let mut queue = queue_of(&["aaaaaaaaaa", "bbbbbbbbbb", "cccccccccc", "dddddddddd"]);
        let mut sizes = Vec::new();
        while !queue.is_empty() {
            sizes.push(estimate_size(&build_request("general", &queue)));
            queue.pop_front();
        }
        for pair in sizes.windows(2) {
            assert!(pair[1] < pair[0], "eviction must strictly reduce size");
        }
    }

    #[test]
    fn test_single_oversized_thread_empties_queue() {
        let big = "x".repeat(100);
        let mut queue = queue_of(&[big.as_str()]);
        assert!(fit_to_budget("general", &mut queue, 10).is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_empty_queue_yields_none() {
        let mut queue: VecDeque<ThreadRecord> = VecDeque::new();
        assert!(fit_to_budget("general", &mut queue, 15_000).is_none());
    }
}
