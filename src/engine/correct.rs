//! Correction engine: candidate rings, in-place replacement, and the
//! explicit pick actions.

use super::{doublon, locator, Engine};
use crate::backend::Transport;
use crate::host::Host;
use crate::{CheckVerdict, Direction, Error, Result, Span};

/// Command identifier under which cycling runs; the scheduler tears the
/// session down when any other command follows.
pub const AUTO_CORRECT_COMMAND: &str = "auto-correct-word";

/// State of an in-progress correction cycle at one location.
#[derive(Debug, Clone)]
pub struct CorrectionSession {
    /// Span currently occupied by the applied candidate.
    pub span: Span,
    /// Candidates in order, with the original word appended last so
    /// cycling eventually returns to the original spelling.
    pub ring: Vec<String>,
    /// Index of the next candidate to apply.
    pub ring_pos: usize,
    /// Point right after the previous cycle step; a cycle command anywhere
    /// else starts a fresh session.
    pub anchor: usize,
}

/// Outcome selected from an explicit correction menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrectionChoice {
    Candidate(String),
    Ignore,
    SaveToPersonalDict,
    AcceptSession,
    AcceptBuffer,
}

impl<T: Transport> Engine<T> {
    /// Cycle-at-point: start a correction session on the word at point, or
    /// advance the ring of the session anchored here by the immediately
    /// preceding command.
    pub fn auto_correct_word(&mut self, host: &mut dyn Host) -> Result<()> {
        let point = host.point();
        if let Some(session) = self.state.correction.take() {
            if session.anchor == point {
                return self.advance_ring(host, session);
            }
        }
        self.start_session(host, point)
    }

    /// Correct the nearest previous flagged word instead of the word at
    /// point; cycling semantics are identical.
    pub fn auto_correct_previous_word(&mut self, host: &mut dyn Host) -> Result<()> {
        if let Some(session) = self.state.correction.take() {
            if session.anchor == host.point() {
                return self.advance_ring(host, session);
            }
        }
        let Some(start) = self
            .annotations
            .next_flagged(host.point(), Direction::Backward)
        else {
            host.notify("no flagged word before point");
            return Ok(());
        };
        let end = self
            .annotations
            .at(start)
            .map(|a| a.span.end)
            .unwrap_or(start);
        self.start_session(host, end)
    }

    fn start_session(&mut self, host: &mut dyn Host, point: usize) -> Result<()> {
        let word = locator::locate(&self.config, host.text(), point, Direction::Backward)
            .ok_or(Error::NoWord(point))?;

        let verdict = match self.client.check(&word.text)? {
            Some(verdict) => verdict,
            None => return Ok(()),
        };
        let candidates = match verdict {
            CheckVerdict::Correct => {
                host.notify(&format!("{:?} is correct", word.text));
                return Ok(());
            }
            CheckVerdict::Misspelled { candidates, .. } => candidates,
            CheckVerdict::Doublon => Vec::new(),
        };
        let mut ring = candidates;
        // Backends can echo the word itself among the candidates (case or
        // affix echo); replacing a word with itself is a wasted cycle step,
        // so echoes never enter the ring.
        ring.retain(|c| c != &word.text);
        if ring.is_empty() {
            host.notify(&format!("no corrections for {:?}", word.text));
            return Ok(());
        }
        ring.push(word.text.clone());

        let replacement = ring[0].clone();
        let span = self.replace_and_recheck(host, word.span, &replacement);
        self.state.correction = Some(CorrectionSession {
            span,
            ring_pos: 1,
            ring,
            anchor: host.point(),
        });
        Ok(())
    }

    fn advance_ring(&mut self, host: &mut dyn Host, mut session: CorrectionSession) -> Result<()> {
        let candidate = session.ring[session.ring_pos].clone();
        session.ring_pos = (session.ring_pos + 1) % session.ring.len();
        session.span = self.replace_and_recheck(host, session.span, &candidate);
        session.anchor = host.point();
        self.state.correction = Some(session);
        Ok(())
    }

    /// Explicit pick from a presented menu: either a replacement or one of
    /// the fixed backend actions.
    pub fn correct_word_with(&mut self, host: &mut dyn Host, choice: CorrectionChoice) -> Result<()> {
        let word = locator::locate(&self.config, host.text(), host.point(), Direction::Backward)
            .ok_or(Error::NoWord(host.point()))?;

        match choice {
            CorrectionChoice::Candidate(candidate) => {
                self.replace_and_recheck(host, word.span, &candidate);
            }
            CorrectionChoice::Ignore => {
                self.annotations.unhighlight(host, word.span.start);
            }
            CorrectionChoice::SaveToPersonalDict => {
                self.client.save_word(&word.text)?;
                self.client.flush_personal_dictionary()?;
                // The backend's idea of "known" changed; nothing cached is
                // authoritative.
                self.state.cache.invalidate();
                self.annotations.unhighlight(host, word.span.start);
            }
            CorrectionChoice::AcceptSession => {
                self.client.accept_word(&word.text)?;
                self.state.cache.invalidate();
                self.annotations.unhighlight(host, word.span.start);
            }
            CorrectionChoice::AcceptBuffer => {
                self.client.accept_word(&word.text)?;
                self.state
                    .accepted_words
                    .insert(doublon::fold(&self.config, &word.text));
                self.state.cache.invalidate();
                self.annotations.unhighlight(host, word.span.start);
            }
        }
        Ok(())
    }

    /// Candidate list for the word at `point`, for menu presentation.
    pub fn candidates_at(&mut self, host: &mut dyn Host, point: usize) -> Result<Vec<String>> {
        let word = locator::locate(&self.config, host.text(), point, Direction::Backward)
            .ok_or(Error::NoWord(point))?;
        match self.client.check(&word.text)? {
            Some(CheckVerdict::Misspelled { candidates, .. }) => Ok(candidates),
            _ => Ok(Vec::new()),
        }
    }

    /// Replace `span` with `new_text`, keep the saved point consistent,
    /// shift annotations, and re-run the check so the annotation state
    /// reflects the replacement. The point adjustment happens even when
    /// the follow-up check fails.
    pub(crate) fn replace_and_recheck(
        &mut self,
        host: &mut dyn Host,
        span: Span,
        new_text: &str,
    ) -> Span {
        let saved_point = host.point();

        self.annotations.clear_range(host, span.start, span.end);
        host.replace_text(span, new_text);
        self.annotations.adjust_after_edit(span, new_text.len());
        self.state.cache.invalidate();

        let new_span = Span::new(span.start, span.start + new_text.len());
        let adjusted = adjust_point(saved_point, span, new_text.len(), host.text().len());
        host.move_point(adjusted);

        if let Err(e) = self.check_word_at(host, new_span.start, Direction::Forward) {
            host.notify(&format!("spell check failed: {e}"));
        }
        new_span
    }
}

/// Where the saved point lands after `span` was replaced by `new_len`
/// bytes: at or after the old end it drifts by the length delta (clamped
/// to the buffer); before the start it is restored exactly.
pub(crate) fn adjust_point(saved: usize, span: Span, new_len: usize, buf_len: usize) -> usize {
    if saved >= span.end {
        let delta = new_len as isize - span.len() as isize;
        let shifted = (saved as isize + delta).max(0) as usize;
        shifted.min(buf_len)
    } else {
        saved.min(buf_len)
    }
}
