use crate::{AnnotationKind, Span};

/// Surface the engine consumes from the editing host.
///
/// The host owns the buffer, the cursor, and the visual overlays; the
/// engine drives all of them through this trait and never reaches around
/// it. `highlight`/`unhighlight` mirror the annotation map kept by the
/// engine so the host can render flags however it likes.
pub trait Host {
    /// Current buffer contents.
    fn text(&self) -> &str;

    /// Cursor offset (byte position, on a char boundary).
    fn point(&self) -> usize;

    fn move_point(&mut self, offset: usize);

    /// Replace `span` with `new_text`. The host must apply the edit to the
    /// buffer before returning.
    fn replace_text(&mut self, span: Span, new_text: &str);

    /// Render a flagged span, with correction candidates when known.
    fn highlight(&mut self, span: Span, kind: AnnotationKind, suggestions: &[String]);

    /// Remove the rendering of a flagged span containing `offset`.
    fn unhighlight(&mut self, offset: usize);

    /// Mode-line / minibuffer style message.
    fn notify(&mut self, message: &str);

    /// Whether a foreign (non-spell) annotation already occupies `offset`.
    /// Hosts without such a concept can keep the default.
    fn occupied(&self, _offset: usize) -> bool {
        false
    }
}

/// Host backed by a plain string buffer. Enough for the CLI and for tests;
/// real editors implement [`Host`] over their own buffer type.
#[derive(Debug, Default)]
pub struct StringHost {
    pub buffer: String,
    pub cursor: usize,
    pub notifications: Vec<String>,
    pub highlights: Vec<(Span, AnnotationKind)>,
}

impl StringHost {
    pub fn new(buffer: impl Into<String>) -> Self {
        Self {
            buffer: buffer.into(),
            cursor: 0,
            notifications: Vec::new(),
            highlights: Vec::new(),
        }
    }

    pub fn with_cursor(buffer: impl Into<String>, cursor: usize) -> Self {
        let mut host = Self::new(buffer);
        host.cursor = cursor;
        host
    }
}

impl Host for StringHost {
    fn text(&self) -> &str {
        &self.buffer
    }

    fn point(&self) -> usize {
        self.cursor
    }

    fn move_point(&mut self, offset: usize) {
        self.cursor = offset.min(self.buffer.len());
    }

    fn replace_text(&mut self, span: Span, new_text: &str) {
        self.buffer.replace_range(span.start..span.end, new_text);
    }

    fn highlight(&mut self, span: Span, kind: AnnotationKind, _suggestions: &[String]) {
        self.highlights.retain(|(s, _)| s.start != span.start);
        self.highlights.push((span, kind));
    }

    fn unhighlight(&mut self, offset: usize) {
        self.highlights
            .retain(|(s, _)| !(s.start <= offset && offset < s.end));
    }

    fn notify(&mut self, message: &str) {
        self.notifications.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_updates_buffer() {
        let mut host = StringHost::new("teh cat");
        host.replace_text(Span::new(0, 3), "the");
        assert_eq!(host.text(), "the cat");
    }

    #[test]
    fn test_move_point_clamps() {
        let mut host = StringHost::new("abc");
        host.move_point(99);
        assert_eq!(host.point(), 3);
    }

    #[test]
    fn test_unhighlight_by_containment() {
        let mut host = StringHost::new("teh cat");
        host.highlight(Span::new(0, 3), AnnotationKind::Misspelled, &[]);
        host.unhighlight(1);
        assert!(host.highlights.is_empty());
    }
}
