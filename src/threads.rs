//! Thread assembly.
//!
//! A thread is one root message plus its replies, flattened into parallel
//! arrays in the shape the summarization backend expects. All arrays are
//! index-aligned: entry `i` describes the i-th message of the thread, root
//! first, replies in ascending timestamp order.

use crate::slack::{MessageWithReplies, RootMessage, cmp_ts};

/// One channel thread, flattened for the summarization request.
///
/// Invariant: every array has length `1 + reply count`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadRecord {
    pub message_ids: Vec<String>,
    pub messages: Vec<String>,
    pub users: Vec<String>,
    pub user_ids: Vec<String>,
    pub reactions: Vec<u32>,
    pub titles: Vec<String>,
}

impl ThreadRecord {
    /// Number of messages in the thread (root included).
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Sort roots oldest-first so thread order is deterministic.
pub fn sort_ascending(roots: &mut [RootMessage]) {
    roots.sort_by(|a, b| cmp_ts(&a.ts, &b.ts));
}

/// Flatten one root-plus-replies bundle into a [`ThreadRecord`].
pub fn build_thread(bundle: &MessageWithReplies) -> ThreadRecord {
    let mut replies: Vec<&RootMessage> = bundle.replies.iter().collect();
    replies.sort_by(|a, b| cmp_ts(&a.ts, &b.ts));

    let count = 1 + replies.len();
    let mut record = ThreadRecord {
        message_ids: Vec::with_capacity(count),
        messages: Vec::with_capacity(count),
        users: Vec::with_capacity(count),
        user_ids: Vec::with_capacity(count),
        reactions: Vec::with_capacity(count),
        titles: Vec::with_capacity(count),
    };

    for message in std::iter::once(&bundle.message).chain(replies) {
        record.message_ids.push(message.ts.clone());
        record.messages.push(message.text.clone());
        record.users.push(message.user_name.clone());
        record.user_ids.push(message.user_id.clone());
        record.reactions.push(message.reaction_total());
        record.titles.push(String::new());
    }

    record
}

/// Build thread records for a whole channel batch, preserving bundle order.
pub fn build_threads(bundles: &[MessageWithReplies]) -> Vec<ThreadRecord> {
    bundles.iter().map(build_thread).collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::slack::Reaction;

    fn message(ts: &str, user: &str, name: &str, text: &str, reactions: u32) -> RootMessage {
        RootMessage {
            ts: ts.to_string(),
            text: text.to_string(),
            user_id: user.to_string(),
            user_name: name.to_string(),
            reactions: if reactions == 0 {
                vec![]
            } else {
                vec![Reaction {
                    name: "thumbsup".to_string(),
                    count: reactions,
                }]
            },
        }
    }

    #[test]
    fn test_parallel_arrays_have_equal_length() {
        let bundle = MessageWithReplies {
            message: message("1.0", "U1", "alice", "root", 2),
            replies: vec![
                message("2.0", "U2", "bob", "first reply", 0),
                message("3.0", "U3", "carol", "second reply", 1),
            ],
        };
        let record = build_thread(&bundle);

        assert_eq!(record.len(), 3);
        assert_eq!(record.message_ids.len(), 3);
        assert_eq!(record.messages.len(), 3);
        assert_eq!(record.users.len(), 3);
        assert_eq!(record.user_ids.len(), 3);
        assert_eq!(record.reactions.len(), 3);
        assert_eq!(record.titles.len(), 3);
    }

    #[test]
    fn test_root_comes_first_then_replies_ascending() {
        let bundle = MessageWithReplies {
            message: message("5.0", "U1", "alice", "root", 0),
            replies: vec![
                message("9.0", "U2", "bob", "late", 0),
                message("6.0", "U3", "carol", "early", 0),
            ],
        };
        let record = build_thread(&bundle);

        assert_eq!(record.messages, vec!["root", "early", "late"]);
        assert_eq!(record.message_ids, vec!["5.0", "6.0", "9.0"]);
        assert_eq!(record.users, vec!["alice", "carol", "bob"]);
    }

    #[test]
    fn test_reaction_counts_are_per_message_totals() {
        let mut root = message("1.0", "U1", "alice", "root", 0);
        root.reactions = vec![
            Reaction {
                name: "rocket".to_string(),
                count: 2,
            },
            Reaction {
                name: "eyes".to_string(),
                count: 3,
            },
        ];
        let bundle = MessageWithReplies {
            message: root,
            replies: vec![message("2.0", "U2", "bob", "reply", 1)],
        };
        let record = build_thread(&bundle);

        assert_eq!(record.reactions, vec![5, 1]);
    }

    #[test]
    fn test_reply_free_root_is_single_entry_thread() {
        let bundle = MessageWithReplies {
            message: message("1.0", "U1", "alice", "solo", 0),
            replies: vec![],
        };
        let record = build_thread(&bundle);
        assert_eq!(record.len(), 1);
        assert!(!record.is_empty());
    }

    #[test]
    fn test_sort_ascending_orders_numerically() {
        let mut roots = vec![
            message("10.1", "U1", "a", "third", 0),
            message("9.5", "U2", "b", "first", 0),
            message("9.9", "U3", "c", "second", 0),
        ];
        sort_ascending(&mut roots);
        let texts: Vec<_> = roots.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_build_threads_preserves_bundle_order() {
        let bundles = vec![
            MessageWithReplies {
                message: message("1.0", "U1", "a", "oldest", 0),
                replies: vec![],
            },
            MessageWithReplies {
                message: message("2.0", "U2", "b", "newest", 0),
                replies: vec![],
            },
        ];
        let records = build_threads(&bundles);
        assert_eq!(records[0].messages[0], "oldest");
        assert_eq!(records[1].messages[0], "newest");
    }
}
