//! Annotation manager: the span → kind map that is the source of truth for
//! "is this word currently flagged".
//!
//! The host's visual overlays are a projection of this map, kept in sync
//! through `Host::highlight`/`Host::unhighlight`; nothing in the engine
//! ever queries overlays back.

use crate::host::Host;
use crate::{Annotation, AnnotationKind, Direction, Span};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct AnnotationManager {
    /// Keyed by span start; at most one annotation owns a given start.
    map: BTreeMap<usize, Annotation>,
    persistent: bool,
    highlight_over_others: bool,
}

impl AnnotationManager {
    pub fn new(persistent: bool, highlight_over_others: bool) -> Self {
        Self {
            map: BTreeMap::new(),
            persistent,
            highlight_over_others,
        }
    }

    /// Install or refresh an annotation over `span`. Any existing
    /// annotation starting within `(span.start, span.end]` is cleared
    /// first, except one already sitting exactly at `span.start` with the
    /// same kind, which is only refreshed.
    pub fn highlight(
        &mut self,
        host: &mut dyn Host,
        span: Span,
        kind: AnnotationKind,
        suggestions: &[String],
    ) {
        if !self.persistent {
            // Non-persistent mode keeps at most one annotation buffer-wide.
            self.clear_all(host);
        }

        let stale: Vec<usize> = self
            .map
            .range(span.start + 1..=span.end)
            .map(|(k, _)| *k)
            .collect();
        for key in stale {
            self.map.remove(&key);
            host.unhighlight(key);
        }

        if host.occupied(span.start) && !self.highlight_over_others {
            return;
        }

        self.map.insert(span.start, Annotation { span, kind });
        host.highlight(span, kind, suggestions);
    }

    /// Remove the annotation(s) at `offset`. In persistent mode every
    /// annotation containing the offset goes; in non-persistent mode the
    /// single live annotation goes regardless of where it is.
    pub fn unhighlight(&mut self, host: &mut dyn Host, offset: usize) {
        if self.persistent {
            let stale: Vec<usize> = self
                .map
                .iter()
                .filter(|(_, a)| a.span.contains(offset))
                .map(|(k, _)| *k)
                .collect();
            for key in stale {
                self.map.remove(&key);
                host.unhighlight(key);
            }
        } else {
            self.clear_all(host);
        }
    }

    pub fn clear_range(&mut self, host: &mut dyn Host, start: usize, end: usize) {
        let stale: Vec<usize> = self
            .map
            .iter()
            .filter(|(_, a)| a.span.start < end && a.span.end > start)
            .map(|(k, _)| *k)
            .collect();
        for key in stale {
            self.map.remove(&key);
            host.unhighlight(key);
        }
    }

    pub fn clear_all(&mut self, host: &mut dyn Host) {
        let stale: Vec<usize> = self.map.keys().copied().collect();
        for key in stale {
            self.map.remove(&key);
            host.unhighlight(key);
        }
    }

    /// Shift annotations after an in-place replacement of `old` by text of
    /// `new_len` bytes. Annotations overlapping the replaced span are
    /// dropped; everything at or after its old end drifts by the length
    /// delta.
    pub fn adjust_after_edit(&mut self, old: Span, new_len: usize) {
        let delta = new_len as isize - old.len() as isize;
        let mut next = BTreeMap::new();
        for (_, a) in std::mem::take(&mut self.map) {
            if a.span.end <= old.start {
                next.insert(a.span.start, a);
            } else if a.span.start >= old.end {
                let span = Span::new(
                    (a.span.start as isize + delta) as usize,
                    (a.span.end as isize + delta) as usize,
                );
                next.insert(span.start, Annotation { span, kind: a.kind });
            }
            // Overlapping the edit: dropped; the follow-up check re-flags
            // the word if still wrong.
        }
        self.map = next;
    }

    pub fn at(&self, offset: usize) -> Option<&Annotation> {
        self.map.values().find(|a| a.span.contains(offset))
    }

    /// Start offset of the nearest flagged word strictly after (or before)
    /// `from`.
    pub fn next_flagged(&self, from: usize, direction: Direction) -> Option<usize> {
        match direction {
            Direction::Forward => self.map.range(from + 1..).next().map(|(k, _)| *k),
            Direction::Backward => self.map.range(..from).next_back().map(|(k, _)| *k),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.map.values()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
