//! Region and whole-buffer checking.
//!
//! Small regions walk word by word through the normal pipeline. Large
//! regions cost one backend invocation for the whole range, whose ordered
//! misspelled-word list is then reconciled against buffer positions.
//! Doublons are not detected on the bulk path (a documented limitation);
//! an adjacent-identical-token sweep runs afterwards instead.

use super::{doublon, locator, Engine};
use crate::backend::Transport;
use crate::host::Host;
use crate::{AnnotationKind, Direction, Error, Result, Span};
use regex::RegexBuilder;
use unicode_segmentation::UnicodeSegmentation;

impl<T: Transport> Engine<T> {
    pub fn check_buffer(&mut self, host: &mut dyn Host) -> Result<()> {
        let end = host.text().len();
        self.check_region(host, 0, end)
    }

    pub fn check_region(&mut self, host: &mut dyn Host, start: usize, end: usize) -> Result<()> {
        let text = host.text();
        let start = locator::floor_char_boundary(text, start);
        let end = locator::floor_char_boundary(text, end);
        if start >= end {
            return Ok(());
        }
        if end - start > self.config.large_region_threshold && self.bulk.is_some() {
            self.check_region_bulk(host, start, end)
        } else {
            self.check_region_words(host, start, end)
        }
    }

    fn check_region_words(&mut self, host: &mut dyn Host, start: usize, end: usize) -> Result<()> {
        let mut pos = start;
        while pos < end {
            let word = match locator::locate(&self.config, host.text(), pos, Direction::Forward) {
                Some(word) => word,
                None => break,
            };
            if word.span.start >= end {
                break;
            }
            let next = word.span.end.max(pos + 1);
            self.check_word(host, word)?;
            pos = next;
        }
        Ok(())
    }

    fn check_region_bulk(&mut self, host: &mut dyn Host, start: usize, end: usize) -> Result<()> {
        let region = host.text()[start..end].to_string();
        let mut listed = {
            let bulk = self
                .bulk
                .as_mut()
                .ok_or_else(|| Error::Region("no bulk backend attached".into()))?;
            // A failure here is fatal for the whole region call; nothing
            // below runs, so no partial annotations are trusted.
            bulk.list_misspellings(&region)?
        };

        // Words accepted for this buffer are not misspellings.
        listed.retain(|w| {
            !self
                .state
                .accepted_words
                .contains(&doublon::fold(&self.config, w))
        });

        self.annotations.clear_range(host, start, end);

        // The backend reports words in region order but without positions;
        // match each occurrence in order, never scanning backward.
        let mut scan = start;
        for miss in listed {
            match self.match_listed_word(host.text(), scan, end, &miss) {
                Some(span) => {
                    self.annotations
                        .highlight(host, span, AnnotationKind::Misspelled, &[]);
                    scan = span.end;
                }
                None => {
                    host.notify(&format!("reported misspelling {miss:?} not found in region"));
                }
            }
        }

        self.sweep_adjacent_tokens(host, start, end);
        Ok(())
    }

    /// Find the next occurrence of a listed misspelling, validating each
    /// substring hit through the locator. When the match site cannot form
    /// a checkable token at all (foreign-script runs), the match is flagged
    /// as misspelled anyway rather than dropped.
    fn match_listed_word(&self, text: &str, from: usize, to: usize, miss: &str) -> Option<Span> {
        if from >= to || miss.is_empty() {
            return None;
        }
        let pattern = RegexBuilder::new(&regex::escape(miss)).build().ok()?;
        for m in pattern.find_iter(&text[from..to]) {
            let s = from + m.start();
            let e = from + m.end();
            match locator::locate(&self.config, text, s, Direction::Forward) {
                Some(w) if w.span.start == s && w.span.end == e => return Some(w.span),
                Some(w) if w.span.start >= e => return Some(Span::new(s, e)),
                Some(_) => continue,
                None => return Some(Span::new(s, e)),
            }
        }
        None
    }

    /// Flag adjacent identical tokens inside the region. This is the only
    /// doubled-word detection the bulk path gets.
    fn sweep_adjacent_tokens(&mut self, host: &mut dyn Host, start: usize, end: usize) {
        let region = host.text()[start..end].to_string();
        let mut prev: Option<(usize, String)> = None;

        for (off, token) in region.unicode_word_indices() {
            let folded = doublon::fold(&self.config, token);
            if let Some((prev_end, prev_folded)) = &prev {
                let gap = &region[*prev_end..off];
                let excepted = self
                    .config
                    .duplication_exceptions
                    .iter()
                    .any(|e| doublon::fold(&self.config, e) == folded);
                if *prev_folded == folded
                    && !excepted
                    && gap.chars().all(char::is_whitespace)
                {
                    let span = Span::new(start + off, start + off + token.len());
                    self.annotations
                        .highlight(host, span, AnnotationKind::Doublon, &[]);
                }
            }
            prev = Some((off + token.len(), folded));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::engine;
    use super::*;
    use crate::backend::scripted::ScriptedBulk;
    use crate::config::EngineConfig;
    use crate::host::StringHost;

    fn bulk_config() -> EngineConfig {
        EngineConfig {
            // Everything is "large" so the bulk path always runs.
            large_region_threshold: 0,
            ..Default::default()
        }
    }

    fn flagged_spans(e: &Engine<crate::backend::scripted::ScriptedTransport>) -> Vec<Span> {
        e.annotations.iter().map(|a| a.span).collect()
    }

    #[test]
    fn test_bulk_flags_listed_words_in_order() {
        let mut e = engine(bulk_config(), &[])
            .with_bulk(Box::new(ScriptedBulk::new(vec![vec!["teh", "wrod"]])));
        let mut host = StringHost::new("teh cat ate a wrod");

        e.check_buffer(&mut host).unwrap();
        assert_eq!(
            flagged_spans(&e),
            vec![Span::new(0, 3), Span::new(14, 18)]
        );
        // No interactive round trips on the bulk path.
        assert_eq!(e.checks_sent(), 0);
    }

    #[test]
    fn test_bulk_substring_hits_are_skipped() {
        // "he" must not match inside "the"; only the standalone token is
        // flagged.
        let mut e = engine(bulk_config(), &[])
            .with_bulk(Box::new(ScriptedBulk::new(vec![vec!["he"]])));
        let mut host = StringHost::new("the he");

        e.check_buffer(&mut host).unwrap();
        assert_eq!(flagged_spans(&e), vec![Span::new(4, 6)]);
    }

    #[test]
    fn test_bulk_unmatched_word_reported_not_fatal() {
        let mut e = engine(bulk_config(), &[])
            .with_bulk(Box::new(ScriptedBulk::new(vec![vec!["ghost", "teh"]])));
        let mut host = StringHost::new("teh cat");

        e.check_buffer(&mut host).unwrap();
        assert!(host
            .notifications
            .iter()
            .any(|n| n.contains("ghost")));
        assert_eq!(flagged_spans(&e), vec![Span::new(0, 3)]);
    }

    #[test]
    fn test_bulk_failure_is_fatal_for_region() {
        let mut bulk = ScriptedBulk::new(vec![]);
        bulk.fail = true;
        let mut e = engine(bulk_config(), &[]).with_bulk(Box::new(bulk));
        let mut host = StringHost::new("teh cat");

        assert!(matches!(
            e.check_buffer(&mut host),
            Err(Error::Region(_))
        ));
        assert!(e.annotations.is_empty());
    }

    #[test]
    fn test_bulk_respects_accepted_words() {
        let mut e = engine(bulk_config(), &[])
            .with_bulk(Box::new(ScriptedBulk::new(vec![vec!["qzwx"]])));
        e.state.accepted_words.insert("qzwx".to_string());
        let mut host = StringHost::new("qzwx here");

        e.check_buffer(&mut host).unwrap();
        assert!(e.annotations.is_empty());
    }

    #[test]
    fn test_bulk_adjacent_token_sweep() {
        let mut e = engine(bulk_config(), &[])
            .with_bulk(Box::new(ScriptedBulk::new(vec![vec![]])));
        let mut host = StringHost::new("the the cat");

        e.check_buffer(&mut host).unwrap();
        assert_eq!(
            e.annotations.at(4).map(|a| a.kind),
            Some(AnnotationKind::Doublon)
        );
    }

    #[test]
    fn test_bulk_defensive_flag_for_unlocatable_match() {
        // With a restricted word-char set the match site cannot form a
        // token, but the reported misspelling is still flagged.
        let config = EngineConfig {
            large_region_threshold: 0,
            word_chars: Some("abcdefghijklmnopqrstuvwxyz".to_string()),
            ..Default::default()
        };
        let mut e = engine(config, &[])
            .with_bulk(Box::new(ScriptedBulk::new(vec![vec!["ПРИВЕТ"]])));
        let mut host = StringHost::new("ПРИВЕТ mir");

        e.check_buffer(&mut host).unwrap();
        assert_eq!(flagged_spans(&e), vec![Span::new(0, 12)]);
    }

    #[test]
    fn test_small_region_matches_bulk_spans() {
        // Equivalence below the threshold: word-by-word flags the same
        // spans the bulk path would, modulo doublon detection.
        let text = "teh cat and a wrod";
        let records: &[&[&str]] = &[
            &["& teh 1 1: the"],
            &["*"],
            &["*"],
            &["*"],
            &["& wrod 1 1: word"],
        ];
        let mut small = engine(EngineConfig::default(), records);
        let mut host = StringHost::new(text);
        small.check_region(&mut host, 0, text.len()).unwrap();

        let mut bulk = engine(bulk_config(), &[])
            .with_bulk(Box::new(ScriptedBulk::new(vec![vec!["teh", "wrod"]])));
        let mut bulk_host = StringHost::new(text);
        bulk.check_buffer(&mut bulk_host).unwrap();

        assert_eq!(flagged_spans(&small), flagged_spans(&bulk));
    }

    #[test]
    fn test_word_by_word_region_detects_doublons() {
        let records: &[&[&str]] = &[&["*"], &["*"]];
        let mut e = engine(EngineConfig::default(), records);
        let mut host = StringHost::new("cat cat");

        e.check_region(&mut host, 0, 7).unwrap();
        assert_eq!(
            e.annotations.at(4).map(|a| a.kind),
            Some(AnnotationKind::Doublon)
        );
    }
}
