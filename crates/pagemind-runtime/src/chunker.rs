//! Line-oriented text chunking under a character budget.
//!
//! Lengths are counted in `char`s. Every accepted line is stored followed by
//! a single `'\n'`, and that newline counts against the budget.

/// Minimum whitespace-separated tokens for a line to be kept.
pub const MIN_LINE_TOKENS: usize = 3;

/// Number of `char`s in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Whether a line carries enough words to be worth sending to the model.
pub fn is_qualifying_line(line: &str) -> bool {
    line.split_whitespace().nth(MIN_LINE_TOKENS - 1).is_some()
}

/// Split `text` into chunks of at most `max_chars`, dropping noise lines.
///
/// Lines with fewer than [`MIN_LINE_TOKENS`] tokens are discarded. A single
/// line longer than the budget becomes its own oversized chunk.
pub fn chunk(text: &str, max_chars: usize) -> Vec<String> {
    pack(text.lines().filter(|line| is_qualifying_line(line)), max_chars)
}

/// Greedily pack non-empty lines of `text` into chunks, keeping every line.
pub fn chunk_unfiltered(text: &str, max_chars: usize) -> Vec<String> {
    pack(text.lines().filter(|line| !line.trim().is_empty()), max_chars)
}

fn pack<'a>(lines: impl Iterator<Item = &'a str>, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in lines {
        let line_len = char_len(line);
        if current_len > 0 && current_len + line_len >= max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push_str(line);
        current.push('\n');
        current_len += line_len + 1;
    }

    if current_len > 0 {
        chunks.push(current);
    }

    chunks
}

/// Cut `text` to at most `max_chars` chars on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
