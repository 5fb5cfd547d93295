//! Word locator: decides which exact span is "the word" for every other
//! component.
//!
//! Two character classes drive the scan: word chars (letters admissible by
//! the active dictionary) and other chars (e.g. apostrophes), which may
//! appear inside a word only between two word chars. Whether more than one
//! such bridge is allowed comes from the backend's declaration
//! (`many_other_chars`), so "qu'est-ce" is one word for some dictionaries
//! and three for others.

use crate::config::EngineConfig;
use crate::{Direction, Span, Word};

pub(crate) fn char_at(text: &str, pos: usize) -> Option<char> {
    text.get(pos..)?.chars().next()
}

/// Char ending at byte `pos`, with its start offset.
pub(crate) fn prev_char(text: &str, pos: usize) -> Option<(char, usize)> {
    text.get(..pos)?.char_indices().next_back().map(|(i, c)| (c, i))
}

pub(crate) fn floor_char_boundary(text: &str, mut pos: usize) -> usize {
    pos = pos.min(text.len());
    while pos > 0 && !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

/// Extract the word at or nearest `point`, seeking in `direction` when
/// `point` does not sit on a word char. Returns `None` when no word exists
/// on that side.
pub fn locate(config: &EngineConfig, text: &str, point: usize, direction: Direction) -> Option<Word> {
    let mut pos = floor_char_boundary(text, point);

    // Seek to a word char if we are not on one.
    if !char_at(text, pos).map_or(false, |c| config.is_word_char(c)) {
        pos = match direction {
            Direction::Forward => text[pos..]
                .char_indices()
                .find(|(_, c)| config.is_word_char(*c))
                .map(|(i, _)| pos + i)?,
            Direction::Backward => text[..pos]
                .char_indices()
                .rev()
                .find(|(_, c)| config.is_word_char(*c))
                .map(|(i, _)| i)?,
        };
    }

    // Walk backward to the true start: through word chars, and over an
    // other char only when it bridges two word chars.
    let mut start = pos;
    let mut bridges = 0usize;
    loop {
        while let Some((c, p)) = prev_char(text, start) {
            if config.is_word_char(c) {
                start = p;
            } else {
                break;
            }
        }
        let Some((other, other_pos)) = prev_char(text, start) else {
            break;
        };
        if !config.is_other_char(other) {
            break;
        }
        let Some((before, _)) = prev_char(text, other_pos) else {
            break;
        };
        if !config.is_word_char(before) {
            break;
        }
        if !config.many_other_chars && bridges >= 1 {
            break;
        }
        bridges += 1;
        start = other_pos;
    }

    // Match `wordchars+ (otherchar wordchars+){0,1 or *}` forward from the
    // start to find the end.
    let mut end = eat_word_chars(config, text, start);
    if end == start {
        return None;
    }
    let mut groups = 0usize;
    loop {
        let Some(other) = char_at(text, end) else {
            break;
        };
        if !config.is_other_char(other) {
            break;
        }
        let after = end + other.len_utf8();
        let group_end = eat_word_chars(config, text, after);
        if group_end == after {
            break;
        }
        if !config.many_other_chars && groups >= 1 {
            break;
        }
        groups += 1;
        end = group_end;
    }

    Some(Word {
        text: text[start..end].to_string(),
        span: Span::new(start, end),
    })
}

fn eat_word_chars(config: &EngineConfig, text: &str, from: usize) -> usize {
    let mut end = from;
    while let Some(c) = char_at(text, end) {
        if !config.is_word_char(c) {
            break;
        }
        end += c.len_utf8();
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    fn word_at(text: &str, point: usize) -> Option<Word> {
        locate(&config(), text, point, Direction::Forward)
    }

    #[test]
    fn test_word_under_point() {
        let w = word_at("the cat sat", 5).unwrap();
        assert_eq!(w.text, "cat");
        assert_eq!(w.span, Span::new(4, 7));
    }

    #[test]
    fn test_point_mid_word_finds_start() {
        let w = word_at("hello world", 3).unwrap();
        assert_eq!(w.text, "hello");
        assert_eq!(w.span, Span::new(0, 5));
    }

    #[test]
    fn test_seek_forward_from_separator() {
        let w = word_at("a  bcd", 1).unwrap();
        assert_eq!(w.text, "bcd");
    }

    #[test]
    fn test_seek_backward_from_separator() {
        let w = locate(&config(), "abc  ", 4, Direction::Backward).unwrap();
        assert_eq!(w.text, "abc");
        assert_eq!(w.span, Span::new(0, 3));
    }

    #[test]
    fn test_no_word_near_buffer_end() {
        assert!(word_at("abc   ", 4).is_none());
        assert!(word_at("", 0).is_none());
    }

    #[test]
    fn test_apostrophe_bridges_word_chars() {
        let w = word_at("it don't work", 4).unwrap();
        assert_eq!(w.text, "don't");
        assert_eq!(w.span, Span::new(3, 8));
    }

    #[test]
    fn test_point_after_bridge_walks_back() {
        // Point on the trailing "t" of "don't" must find the whole word.
        let w = word_at("don't", 4).unwrap();
        assert_eq!(w.text, "don't");
        assert_eq!(w.span, Span::new(0, 5));
    }

    #[test]
    fn test_trailing_other_char_excluded() {
        // An apostrophe not followed by a word char is not part of the word.
        let w = word_at("cats' tails", 1).unwrap();
        assert_eq!(w.text, "cats");
        assert_eq!(w.span, Span::new(0, 4));
    }

    #[test]
    fn test_leading_other_char_excluded() {
        let w = word_at("'tis", 1).unwrap();
        assert_eq!(w.text, "tis");
        assert_eq!(w.span, Span::new(1, 4));
    }

    #[test]
    fn test_single_bridge_limit() {
        // With many_other_chars off, only one bridge group matches.
        let w = word_at("a'b'c rest", 0).unwrap();
        assert_eq!(w.text, "a'b");
    }

    #[test]
    fn test_many_other_chars_allows_repeats() {
        let config = EngineConfig {
            many_other_chars: true,
            ..Default::default()
        };
        let w = locate(&config, "a'b'c rest", 0, Direction::Forward).unwrap();
        assert_eq!(w.text, "a'b'c");
    }

    #[test]
    fn test_hyphen_as_other_char() {
        let config = EngineConfig {
            other_chars: "'-".to_string(),
            ..Default::default()
        };
        let w = locate(&config, "well-known fact", 2, Direction::Forward).unwrap();
        assert_eq!(w.text, "well-known");
    }

    #[test]
    fn test_unicode_word() {
        let w = word_at("voilà tout", 0).unwrap();
        assert_eq!(w.text, "voilà");
        assert_eq!(w.span.end, 6);
    }

    #[test]
    fn test_point_past_end_backward() {
        let text = "final";
        let w = locate(&config(), text, 99, Direction::Backward).unwrap();
        assert_eq!(w.text, "final");
    }
}
