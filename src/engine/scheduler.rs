//! Check scheduler: the state machine deciding, per editor command and per
//! text change, which words need checking now.
//!
//! Driven entirely by the host's event callbacks. The fixed post-command
//! order matters: prior word, then current word, then queued edits — later
//! steps rely on the cache state left by earlier ones.

use super::cache::WordCache;
use super::correct::{CorrectionSession, AUTO_CORRECT_COMMAND};
use super::locator;
use super::Engine;
use crate::backend::Transport;
use crate::host::Host;
use crate::{Direction, Span, Word};
use std::collections::{HashSet, VecDeque};

/// One queued text mutation, recorded by `on_text_changed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingChange {
    pub start: usize,
    pub end: usize,
}

/// Snapshot taken on pre-command, consumed by the matching post-command.
#[derive(Debug, Clone)]
pub(crate) struct PreSnapshot {
    pub point: usize,
    pub column: usize,
    pub word: Option<Word>,
}

/// All buffer-local mutable engine state, passed explicitly rather than
/// living in ambient globals. No two buffers contend over it.
#[derive(Debug, Default)]
pub struct SessionState {
    pub cache: WordCache,
    pub pending: VecDeque<PendingChange>,
    pub previous_command: Option<String>,
    pub(crate) snapshot: Option<PreSnapshot>,
    /// Point of the one check deferred to idle time, if any.
    pub deferred: Option<usize>,
    /// Span handled by the most recent check.
    pub last_checked: Option<Span>,
    pub(crate) correction: Option<CorrectionSession>,
    /// Words accepted for this session/buffer; consulted before the
    /// backend and subtracted from bulk results.
    pub accepted_words: HashSet<String>,
}

fn column_of(text: &str, point: usize) -> usize {
    let point = locator::floor_char_boundary(text, point);
    let line_start = text[..point].rfind('\n').map_or(0, |i| i + 1);
    point - line_start
}

impl<T: Transport> Engine<T> {
    /// Snapshot point, column and the word before point; the matching
    /// post-command consumes it.
    pub fn on_pre_command(&mut self, host: &mut dyn Host) {
        let text = host.text();
        let point = host.point();
        self.state.snapshot = Some(PreSnapshot {
            point,
            column: column_of(text, point),
            word: locator::locate(&self.config, text, point, Direction::Backward),
        });
    }

    /// Queue the edited span; drained by the next post-command.
    pub fn on_text_changed(&mut self, start: usize, end: usize) {
        self.state.pending.push_back(PendingChange { start, end });
    }

    /// The deferred check fires once input has been idle long enough.
    pub fn on_idle_elapsed(&mut self, host: &mut dyn Host) {
        if let Some(point) = self.state.deferred.take() {
            let point = point.min(host.text().len());
            self.guarded_check_at(host, point, Direction::Backward);
        }
    }

    /// Post-command processing, in the fixed order: transposition word,
    /// prior word, current word, queued edits.
    pub fn on_post_command(&mut self, host: &mut dyn Host, command: &str) {
        let pre = self.state.snapshot.take();
        let mut covered: Vec<Span> = Vec::new();

        // 1. A transposition-style edit reshuffles the word at the prior
        // point; check it before anything else.
        if self.classes.transposition.contains(command) {
            if let Some(pre) = &pre {
                let at = pre.point.min(host.text().len());
                if let Some(span) = self.guarded_check_at(host, at, Direction::Backward) {
                    covered.push(span);
                }
            }
        }

        // 2. Moving off a word after editing it: the word before point
        // changed identity relative to the snapshot and was not the word
        // the previous invocation just checked. While point still sits
        // inside (or just after) that word, typing is in progress and the
        // word is left alone.
        if let Some(p) = pre.as_ref().filter(|p| p.word.is_some()) {
            let at = p.point.min(host.text().len());
            if let Some(prior) =
                locator::locate(&self.config, host.text(), at, Direction::Backward)
            {
                let point = host.point();
                let inside = prior.span.start <= point && point <= prior.span.end;
                let changed = locator::locate(
                    &self.config,
                    host.text(),
                    point,
                    Direction::Backward,
                )
                .map_or(true, |w| w.span != prior.span || w.text != prior.text);
                let just_checked = self.state.last_checked == Some(prior.span);
                if !inside && changed && !just_checked {
                    let span = prior.span;
                    if let Err(e) = self.check_word(host, prior) {
                        host.notify(&format!("spell check failed: {e}"));
                    } else {
                        covered.push(span);
                    }
                }
            }
        }

        // 3. The word at the current point.
        let delayed = self.classes.delayed.contains(command);
        let movement = self.classes.movement.contains(command);
        let repeated = self.state.previous_command.as_deref() == Some(command);
        let point = host.point();
        let column = column_of(host.text(), point);
        let where_typing_left_it = pre.as_ref().map_or(false, |p| p.column == column)
            || column == 0
            || point >= host.text().len();

        if delayed && where_typing_left_it {
            // Defer until idle. The skipped word must not be silently
            // remembered as good.
            self.state.deferred = Some(point);
            self.state.cache.invalidate();
        } else {
            // A pending deferred check resolves on the next non-delayed
            // command.
            if let Some(deferred) = self.state.deferred.take() {
                let at = deferred.min(host.text().len());
                if let Some(span) = self.guarded_check_at(host, at, Direction::Backward) {
                    covered.push(span);
                }
            }
            if movement && repeated {
                // Same movement command repeating: skip outright.
            } else if let Some(span) = self.guarded_check_at(host, point, Direction::Backward) {
                covered.push(span);
            }
        }

        // 4. Queued edits not already covered, oldest first. Edits
        // touching the word a deferral is holding are discarded: the
        // deferred check covers them when it fires, and checking now would
        // defeat the deferral.
        let deferred_span = self.state.deferred.map(|d| {
            let d = d.min(host.text().len());
            locator::locate(&self.config, host.text(), d, Direction::Backward)
                .map_or(Span::new(d, d), |w| w.span)
        });
        while let Some(change) = self.state.pending.pop_front() {
            let len = host.text().len();
            let start = locator::floor_char_boundary(host.text(), change.start.min(len));
            let end = locator::floor_char_boundary(host.text(), change.end.min(len));

            if let Some(s) = deferred_span {
                if start <= s.end && end >= s.start {
                    continue;
                }
            }
            if covered
                .iter()
                .any(|s| s.start <= start && end <= s.end)
            {
                continue;
            }
            // An edit touching only a line break with no other changes is
            // not worth a check.
            let slice = &host.text()[start..end];
            if !slice.is_empty() && slice.chars().all(|c| c == '\n' || c == '\r') {
                continue;
            }

            if let Some(word) = locator::locate(&self.config, host.text(), start, Direction::Forward)
            {
                if word.span.start <= end {
                    let span = word.span;
                    if let Err(e) = self.check_word(host, word) {
                        host.notify(&format!("spell check failed: {e}"));
                    } else {
                        covered.push(span);
                    }
                }
            }
        }

        // 5. Bookkeeping for the next invocation.
        if command != AUTO_CORRECT_COMMAND {
            self.state.correction = None;
        }
        self.state.previous_command = Some(command.to_string());
    }
}
