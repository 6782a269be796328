//! Boundary-aware document chunking.
//!
//! Documents are split on paragraph breaks first, and oversized paragraphs
//! are carved at sentence or word boundaries so that no chunk exceeds the
//! configured character budget. Only a paragraph with no usable delimiter is
//! cut mid-word, and such a cut lands at exactly the budget.

use std::sync::LazyLock;

use regex::Regex;

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("paragraph break pattern is valid"));

/// Split `text` into ordered chunks of at most `max_size` characters.
///
/// Paragraphs (runs of two or more newlines) are never merged. Within an
/// oversized paragraph, the cut prefers the last period inside the budget,
/// then the last space, then a hard mid-word cut; a sentence cut leaves the
/// period at the head of the remainder. The remainder has its leading
/// whitespace stripped before the next round, so rejoining chunks loses the
/// exact whitespace at cut points.
///
/// Pure and deterministic. `max_size` must be at least one; callers clamp.
pub fn split_document(text: &str, max_size: usize) -> Vec<String> {
    debug_assert!(max_size > 0, "chunk size must be greater than zero");
    if text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    for paragraph in PARAGRAPH_BREAK.split(text) {
        let mut rest = paragraph;
        while rest.chars().count() > max_size {
            let window_end = byte_offset_at(rest, max_size);
            let cut = cut_point(&rest[..window_end], window_end);
            chunks.push(rest[..cut].to_string());
            rest = rest[cut..].trim_start();
        }
        if !rest.is_empty() {
            chunks.push(rest.to_string());
        }
    }
    chunks
}

/// Byte offset to cut at: the last period in the window, else the last space,
/// else the full window (a mid-word cut). A delimiter at offset zero cannot
/// make progress and is skipped.
fn cut_point(window: &str, window_end: usize) -> usize {
    match window.rfind('.') {
        Some(offset) if offset > 0 => offset,
        _ => match window.rfind(' ') {
            Some(offset) if offset > 0 => offset,
            _ => window_end,
        },
    }
}

/// Byte offset of the `n`-th character, or the string's length when it has
/// fewer than `n` characters.
fn byte_offset_at(text: &str, n: usize) -> usize {
    text.char_indices()
        .nth(n)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}
