pub mod annotations;
pub mod cache;
pub mod correct;
pub mod doublon;
pub mod locator;
pub mod region;
pub mod scheduler;

pub use annotations::AnnotationManager;
pub use cache::WordCache;
pub use correct::{CorrectionChoice, CorrectionSession};
pub use scheduler::{PendingChange, SessionState};

use crate::backend::{BulkChecker, SpellClient, Transport};
use crate::config::{CommandClasses, EngineConfig};
use crate::host::Host;
use crate::{AnnotationKind, CheckVerdict, Direction, Result, Span, Word};

/// The incremental spell-annotation engine for one buffer.
///
/// Owns the protocol client, the annotation map, and the per-buffer
/// scheduler state; the host feeds it editor events and it feeds back
/// highlight/replace/notify effects. All work is synchronous and
/// command-driven; at most one backend check is in flight at a time.
pub struct Engine<T: Transport> {
    pub(crate) config: EngineConfig,
    pub(crate) classes: CommandClasses,
    pub(crate) client: SpellClient<T>,
    pub(crate) bulk: Option<Box<dyn BulkChecker>>,
    pub annotations: AnnotationManager,
    pub state: SessionState,
}

impl<T: Transport> Engine<T> {
    pub fn new(config: EngineConfig, transport: T) -> Self {
        let classes = config.command_classes();
        let client = SpellClient::new(transport, config.sort_candidates);
        let annotations =
            AnnotationManager::new(config.persistent_highlight, config.highlight_over_others);
        Self {
            config,
            classes,
            client,
            bulk: None,
            annotations,
            state: SessionState::default(),
        }
    }

    /// Attach the whole-region checker used for large regions.
    pub fn with_bulk(mut self, bulk: Box<dyn BulkChecker>) -> Self {
        self.bulk = Some(bulk);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The backend session was torn down (dictionary change, restart):
    /// nothing previously learned from it is authoritative any more.
    pub fn on_backend_restart(&mut self) {
        self.state.cache.invalidate();
        self.state.accepted_words.clear();
    }

    /// Check the word at point and annotate accordingly.
    pub fn check_word_at_point(&mut self, host: &mut dyn Host) -> Result<()> {
        let point = host.point();
        self.check_word_at(host, point, Direction::Backward)
            .map(|_| ())
    }

    /// Check the word at `point`; returns the span that was handled, or
    /// `None` when no word could be located there.
    pub(crate) fn check_word_at(
        &mut self,
        host: &mut dyn Host,
        point: usize,
        direction: Direction,
    ) -> Result<Option<Span>> {
        let word = match locator::locate(&self.config, host.text(), point, direction) {
            Some(word) => word,
            None => return Ok(None),
        };
        let span = word.span;
        self.check_word(host, word)?;
        Ok(Some(span))
    }

    /// Run the full per-word pipeline: cache, session-accepted set, doublon
    /// detection, backend check, duplicate-distance escalation, annotation.
    pub fn check_word(&mut self, host: &mut dyn Host, word: Word) -> Result<()> {
        if self
            .state
            .accepted_words
            .contains(&doublon::fold(&self.config, &word.text))
        {
            self.annotations.unhighlight(host, word.span.start);
            self.state.cache.store(&word, true);
            self.state.last_checked = Some(word.span);
            return Ok(());
        }

        if self.state.cache.lookup(&word).is_some() {
            // Same span, same text, no intervening invalidation: the
            // annotation state already reflects the verdict.
            self.state.last_checked = Some(word.span);
            return Ok(());
        }

        if doublon::is_doublon(&self.config, host.text(), &word) {
            self.annotations
                .highlight(host, word.span, AnnotationKind::Doublon, &[]);
            self.state.cache.store(&word, false);
            self.state.last_checked = Some(word.span);
            return Ok(());
        }

        let verdict = match self.client.check(&word.text)? {
            Some(verdict) => verdict,
            // Interrupted: no verdict, nothing cached, nothing annotated.
            None => return Ok(()),
        };

        match verdict {
            CheckVerdict::Correct => {
                self.annotations.unhighlight(host, word.span.start);
                self.state.cache.store(&word, true);
            }
            CheckVerdict::Misspelled {
                candidates,
                matched_offset,
                matched_text,
            } => {
                let span = self.narrow_span(&word, matched_offset, matched_text.as_deref());
                if doublon::recurs_within_distance(&self.config, host.text(), &word) {
                    // A misspelling recurring nearby is rendered with the
                    // duplicate style and without the correction list.
                    self.annotations
                        .highlight(host, span, AnnotationKind::Doublon, &[]);
                } else {
                    self.annotations
                        .highlight(host, span, AnnotationKind::Misspelled, &candidates);
                }
                self.state.cache.store(&word, false);
            }
            CheckVerdict::Doublon => {
                self.annotations
                    .highlight(host, word.span, AnnotationKind::Doublon, &[]);
                self.state.cache.store(&word, false);
            }
        }
        self.state.last_checked = Some(word.span);
        Ok(())
    }

    /// Check, reporting failures through the host instead of propagating:
    /// one failed check must not abort the rest of a command's handling.
    pub(crate) fn guarded_check_at(
        &mut self,
        host: &mut dyn Host,
        point: usize,
        direction: Direction,
    ) -> Option<Span> {
        match self.check_word_at(host, point, direction) {
            Ok(span) => span,
            Err(e) => {
                host.notify(&format!("spell check failed: {e}"));
                None
            }
        }
    }

    /// Narrow the flagged span when the backend reports a matched sub-word
    /// (compound words), independent of the originally located span.
    fn narrow_span(&self, word: &Word, offset: Option<usize>, matched: Option<&str>) -> Span {
        let Some(matched) = matched else {
            return word.span;
        };
        if matched == word.text {
            return word.span;
        }
        let found = offset
            .and_then(|i| {
                word.text
                    .get(i..)
                    .and_then(|tail| tail.find(matched).map(|j| i + j))
            })
            .or_else(|| word.text.find(matched));
        match found {
            Some(idx) => Span::new(
                word.span.start + idx,
                word.span.start + idx + matched.len(),
            ),
            None => word.span,
        }
    }

    /// Move point to the nearest flagged word in `direction`; returns the
    /// new offset, or `None` when there is none to go to.
    pub fn goto_next_flagged(&mut self, host: &mut dyn Host, direction: Direction) -> Option<usize> {
        let offset = self.annotations.next_flagged(host.point(), direction)?;
        host.move_point(offset);
        Some(offset)
    }

    /// One raw protocol exchange, for callers that want the verdict itself
    /// (the CLI's single-word query).
    pub fn query(&mut self, word: &str) -> Result<Option<CheckVerdict>> {
        self.client.check(word)
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use crate::backend::scripted::ScriptedTransport;

    pub fn engine(config: EngineConfig, records: &[&[&str]]) -> Engine<ScriptedTransport> {
        let mut transport = ScriptedTransport::new();
        for record in records {
            transport.push_record(record);
        }
        Engine::new(config, transport)
    }

    impl Engine<ScriptedTransport> {
        pub fn checks_sent(&self) -> usize {
            self.client.transport_ref().checks_sent()
        }

        pub fn push_record(&mut self, lines: &[&str]) {
            self.client.transport_mut().push_record(lines);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::engine;
    use super::*;
    use crate::host::StringHost;

    #[test]
    fn test_cache_skips_stable_word() {
        // Property: for identical (span, text) with no intervening edit,
        // the client is invoked at most once.
        let mut e = engine(EngineConfig::default(), &[&["*"]]);
        let mut host = StringHost::with_cursor("hello there", 2);

        for _ in 0..5 {
            e.check_word_at_point(&mut host).unwrap();
        }
        assert_eq!(e.checks_sent(), 1);
    }

    #[test]
    fn test_distinct_words_each_checked_once() {
        let mut e = engine(EngineConfig::default(), &[&["*"], &["*"], &["*"]]);
        let mut host = StringHost::new("one two three");

        for point in [0, 0, 4, 4, 8, 8] {
            host.move_point(point);
            e.check_word_at_point(&mut host).unwrap();
        }
        // Three distinct (span, text) pairs, three round trips.
        assert_eq!(e.checks_sent(), 3);
    }

    #[test]
    fn test_doublon_precedence_over_backend() {
        // "the the cat": the second "the" is a doublon; the backend is not
        // consulted for it.
        let mut e = engine(EngineConfig::default(), &[]);
        let mut host = StringHost::with_cursor("the the cat", 5);

        e.check_word_at_point(&mut host).unwrap();
        assert_eq!(e.checks_sent(), 0);
        assert_eq!(
            e.annotations.at(4).map(|a| a.kind),
            Some(AnnotationKind::Doublon)
        );
    }

    #[test]
    fn test_misspelling_annotated_with_candidates() {
        let mut e = engine(EngineConfig::default(), &[&["& teh 2 1: the, ten"]]);
        let mut host = StringHost::with_cursor("teh cat", 1);

        e.check_word_at_point(&mut host).unwrap();
        let a = e.annotations.at(0).unwrap();
        assert_eq!(a.kind, AnnotationKind::Misspelled);
        assert_eq!(a.span, Span::new(0, 3));
        assert_eq!(host.highlights.len(), 1);
    }

    #[test]
    fn test_correct_word_clears_stale_annotation() {
        let mut e = engine(
            EngineConfig::default(),
            &[&["& teh 1 1: the"], &["*"]],
        );
        let mut host = StringHost::with_cursor("teh cat", 1);
        e.check_word_at_point(&mut host).unwrap();
        assert!(e.annotations.at(0).is_some());

        host.buffer.replace_range(0..3, "the");
        e.check_word_at_point(&mut host).unwrap();
        assert!(e.annotations.at(0).is_none());
    }

    #[test]
    fn test_duplicate_distance_escalation() {
        // The same misspelling twice within the window: both render with
        // the duplicate style.
        let records: &[&[&str]] = &[&["& teh 1 1: the"], &["& teh 1 1: the"]];
        let mut e = engine(EngineConfig::default(), records);
        let mut host = StringHost::new("teh cat teh");

        host.move_point(1);
        e.check_word_at_point(&mut host).unwrap();
        host.move_point(9);
        e.check_word_at_point(&mut host).unwrap();

        assert_eq!(
            e.annotations.at(0).map(|a| a.kind),
            Some(AnnotationKind::Doublon)
        );
        assert_eq!(
            e.annotations.at(8).map(|a| a.kind),
            Some(AnnotationKind::Doublon)
        );
    }

    #[test]
    fn test_zero_distance_disables_escalation() {
        let config = EngineConfig {
            duplicate_distance: 0,
            ..Default::default()
        };
        let records: &[&[&str]] = &[&["& teh 1 1: the"], &["& teh 1 1: the"]];
        let mut e = engine(config, records);
        let mut host = StringHost::new("teh cat teh");

        host.move_point(1);
        e.check_word_at_point(&mut host).unwrap();
        host.move_point(9);
        e.check_word_at_point(&mut host).unwrap();

        assert_eq!(
            e.annotations.at(0).map(|a| a.kind),
            Some(AnnotationKind::Misspelled)
        );
        assert_eq!(
            e.annotations.at(8).map(|a| a.kind),
            Some(AnnotationKind::Misspelled)
        );
    }

    #[test]
    fn test_accepted_word_skips_backend() {
        let mut e = engine(EngineConfig::default(), &[]);
        e.state.accepted_words.insert("qzwx".to_string());
        let mut host = StringHost::with_cursor("qzwx here", 1);

        e.check_word_at_point(&mut host).unwrap();
        assert_eq!(e.checks_sent(), 0);
        assert!(e.annotations.is_empty());
    }

    #[test]
    fn test_narrowed_span_from_matched_text() {
        // The backend narrows the flagged sub-span of a compound: it
        // objects to "cat" inside "tehcat".
        let mut e = engine(EngineConfig::default(), &[&["& cat 1 4: bat"]]);
        let mut host = StringHost::with_cursor("xyz tehcat", 5);

        e.check_word_at_point(&mut host).unwrap();
        assert_eq!(e.annotations.at(7).unwrap().span, Span::new(7, 10));
        assert!(e.annotations.at(4).is_none());
    }

    #[test]
    fn test_backend_restart_invalidates() {
        let mut e = engine(EngineConfig::default(), &[&["*"], &["*"]]);
        let mut host = StringHost::with_cursor("hello", 1);
        e.check_word_at_point(&mut host).unwrap();
        e.on_backend_restart();
        e.check_word_at_point(&mut host).unwrap();
        assert_eq!(e.checks_sent(), 2);
    }

    #[test]
    fn test_goto_next_flagged() {
        let mut e = engine(
            EngineConfig::default(),
            &[&["& aab 1 1: abba"], &["& bba 1 1: abba"]],
        );
        let mut host = StringHost::new("aab x bba");
        host.move_point(0);
        e.check_word_at_point(&mut host).unwrap();
        host.move_point(7);
        e.check_word_at_point(&mut host).unwrap();

        host.move_point(0);
        assert_eq!(e.goto_next_flagged(&mut host, Direction::Forward), Some(6));
        assert_eq!(host.point(), 6);
        assert_eq!(e.goto_next_flagged(&mut host, Direction::Forward), None);
        assert_eq!(e.goto_next_flagged(&mut host, Direction::Backward), Some(0));
    }
}
