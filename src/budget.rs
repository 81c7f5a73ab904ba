//! Prompt budget estimation.
//!
//! Approximates the serialized character cost of a summarization request as
//! a proxy for backend token cost. Deliberately crude: characters outside
//! printable ASCII are counted as a fixed-width `\uXXXX` escape, and each
//! message and name carries a small overhead for separators and quoting.

use crate::model::SummarizeModelRequest;

/// Hard ceiling on the estimated request size, in characters.
pub const PROMPT_BUDGET: usize = 15_000;

/// Structural overhead charged per message and per name.
const ENTRY_OVERHEAD: usize = 2;

/// Width of a serialized `\uXXXX` escape.
const ESCAPE_WIDTH: usize = 6;

/// Serialized length of `text` with everything outside printable ASCII
/// (0x20..=0x7E) escaped.
fn escaped_len(text: &str) -> usize {
    text.chars()
        .map(|c| if (' '..='~').contains(&c) { 1 } else { ESCAPE_WIDTH })
        .sum()
}

/// Estimated serialized size of the request.
///
/// Pure and deterministic: identical inputs always yield the same estimate.
pub fn estimate_size(request: &SummarizeModelRequest) -> usize {
    request
        .threads
        .iter()
        .map(|thread| {
            let messages: usize = thread
                .messages
                .iter()
                .map(|m| escaped_len(m) + ENTRY_OVERHEAD)
                .sum();
            let names: usize = thread
                .names
                .iter()
                .map(|n| escaped_len(n) + ENTRY_OVERHEAD)
                .sum();
            messages + names
        })
        .sum()
}
