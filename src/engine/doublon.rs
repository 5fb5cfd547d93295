//! Doubled-word detection.
//!
//! Two distinct mechanisms live here. Adjacency detection catches an
//! immediately repeated token ("the the") before the backend is ever
//! consulted. Distance escalation runs only after the backend has flagged a
//! word: a second occurrence of the same misspelling within the configured
//! window downgrades it from a plain misspelling to a repeated one.

use super::locator::{self, floor_char_boundary, prev_char};
use crate::config::EngineConfig;
use crate::{Direction, Word};
use regex::RegexBuilder;

/// True if the same word occurs immediately before `word` with only
/// separators in between. Backend-checked misspelling is skipped for such
/// words; they are flagged as doublons directly.
pub fn is_doublon(config: &EngineConfig, text: &str, word: &Word) -> bool {
    if !config.mark_duplications {
        return false;
    }
    let folded = fold(config, &word.text);
    if config
        .duplication_exceptions
        .iter()
        .any(|e| fold(config, e) == folded)
    {
        return false;
    }
    // Control sequences (\word) repeat legitimately.
    if prev_char(text, word.span.start).map_or(false, |(c, _)| c == '\\') {
        return false;
    }

    // Skip separators backward from the word start.
    let mut pos = word.span.start;
    while let Some((c, p)) = prev_char(text, pos) {
        if config.is_word_char(c) || config.is_other_char(c) {
            break;
        }
        pos = p;
    }
    if pos == word.span.start || pos == 0 {
        return false;
    }

    // Re-run the locator to confirm a whole-word occurrence, not a
    // substring hit.
    match locator::locate(config, text, pos - 1, Direction::Backward) {
        Some(prev) => prev.span.end == pos && fold(config, &prev.text) == folded,
        None => false,
    }
}

/// True if `word` (already known misspelled) occurs again within
/// `duplicate_distance` bytes in either direction. Negative distance means
/// unbounded; zero disables the search entirely.
pub fn recurs_within_distance(config: &EngineConfig, text: &str, word: &Word) -> bool {
    let distance = config.duplicate_distance;
    if distance == 0 {
        return false;
    }

    let (lo, hi) = if distance < 0 {
        (0, text.len())
    } else {
        let d = distance as usize;
        (
            floor_char_boundary(text, word.span.start.saturating_sub(d)),
            floor_char_boundary(text, (word.span.end + d).min(text.len())),
        )
    };

    find_word_occurrence(config, text, lo, word.span.start, &word.text).is_some()
        || find_word_occurrence(config, text, word.span.end, hi, &word.text).is_some()
}

/// First whole-word occurrence of `needle` in `text[from..to]`, validated
/// through the locator so substring hits do not count.
pub fn find_word_occurrence(
    config: &EngineConfig,
    text: &str,
    from: usize,
    to: usize,
    needle: &str,
) -> Option<Word> {
    if from >= to || needle.is_empty() {
        return None;
    }
    let pattern = RegexBuilder::new(&regex::escape(needle))
        .case_insensitive(config.case_fold_duplications)
        .build()
        .ok()?;

    for m in pattern.find_iter(&text[from..to]) {
        let start = from + m.start();
        if let Some(found) = locator::locate(config, text, start, Direction::Forward) {
            if found.span.start == start && fold(config, &found.text) == fold(config, needle) {
                return Some(found);
            }
        }
    }
    None
}

pub(crate) fn fold(config: &EngineConfig, word: &str) -> String {
    if config.case_fold_duplications {
        word.to_lowercase()
    } else {
        word.to_string()
    }
}
