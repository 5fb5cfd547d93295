pub mod backend;
pub mod cli;
pub mod config;
pub mod engine;
pub mod host;

pub use backend::SpellClient;
pub use config::EngineConfig;
pub use engine::Engine;
pub use host::Host;

use thiserror::Error;

/// Half-open `[start, end)` byte range in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// A word extracted from the buffer. Produced fresh by the locator on every
/// query; never persisted beyond a single check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    pub span: Span,
}

impl Word {
    pub fn new(text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            span: Span::new(start, end),
        }
    }
}

/// Outcome of checking one word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckVerdict {
    Correct,
    Misspelled {
        candidates: Vec<String>,
        /// Offset of the flagged sub-span as reported by the backend,
        /// relative to the word that was sent (compound words may narrow
        /// the span).
        matched_offset: Option<usize>,
        matched_text: Option<String>,
    },
    Doublon,
}

impl CheckVerdict {
    pub fn is_acceptable(&self) -> bool {
        matches!(self, CheckVerdict::Correct)
    }
}

/// How a flagged span should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    Misspelled,
    Doublon,
}

/// A flagged span owned by the annotation manager. The host's visual
/// overlay is a projection of these; engine logic never reads overlays back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub span: Span,
    pub kind: AnnotationKind,
}

/// Direction for word location and flagged-word navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("spell backend is unavailable: {0}")]
    BackendUnavailable(String),

    #[error("spell backend protocol desync: {0}")]
    Protocol(String),

    #[error("region check failed: {0}")]
    Region(String),

    #[error("no word found at offset {0}")]
    NoWord(usize),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
