//! Single-slot memo of the last checked word.
//!
//! The scheduler's main tool for not re-checking a word merely because the
//! cursor revisited it without editing it: at most one backend round trip
//! per stable `(span, text)` pair between invalidations.

use crate::Word;

#[derive(Debug, Clone, Default)]
pub struct WordCache {
    entry: Option<CacheEntry>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    start: usize,
    end: usize,
    text: String,
    acceptable: bool,
}

impl WordCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hit iff both span and text exactly match the cached check; any
    /// mismatch forces a fresh check.
    pub fn lookup(&self, word: &Word) -> Option<bool> {
        let entry = self.entry.as_ref()?;
        if entry.start == word.span.start && entry.end == word.span.end && entry.text == word.text {
            Some(entry.acceptable)
        } else {
            None
        }
    }

    pub fn store(&mut self, word: &Word, acceptable: bool) {
        self.entry = Some(CacheEntry {
            start: word.span.start,
            end: word.span.end,
            text: word.text.clone(),
            acceptable,
        });
    }

    /// Cleared on backend-session teardown, and whenever a word was skipped
    /// solely because its command was delayed (a skip must not silently
    /// mark the word good).
    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_requires_exact_span_and_text() {
        let mut cache = WordCache::new();
        let word = Word::new("cat", 4, 7);
        cache.store(&word, true);

        assert_eq!(cache.lookup(&word), Some(true));
        assert_eq!(cache.lookup(&Word::new("cat", 5, 8)), None);
        assert_eq!(cache.lookup(&Word::new("car", 4, 7)), None);
    }

    #[test]
    fn test_invalidate() {
        let mut cache = WordCache::new();
        let word = Word::new("cat", 4, 7);
        cache.store(&word, false);
        cache.invalidate();
        assert_eq!(cache.lookup(&word), None);
    }
}
