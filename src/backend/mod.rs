pub mod process;

use crate::{CheckVerdict, Error, Result};
use std::cmp::Ordering;
use std::io;

/// Line-oriented channel to the backend process. Implementations own the
/// process plumbing; the client only ever sends and receives whole lines.
pub trait Transport {
    fn send_line(&mut self, line: &str) -> io::Result<()>;

    /// Next reply line, `None` at end of stream. Blocks until the backend
    /// produces one. An `ErrorKind::Interrupted` error means the user quit
    /// out of the wait.
    fn read_line(&mut self) -> io::Result<Option<String>>;
}

/// Whole-region checker: one non-interactive backend invocation over a
/// byte range, yielding the ordered misspelled-word list (no positions).
pub trait BulkChecker {
    fn list_misspellings(&mut self, text: &str) -> Result<Vec<String>>;
}

/// Comparator applied to candidate lists when sorting is enabled.
pub type CandidateOrder = fn(&String, &String) -> Ordering;

fn lexicographic(a: &String, b: &String) -> Ordering {
    a.cmp(b)
}

/// Client for the ispell `-a` line protocol: one word per exchange, one
/// reply record per word.
pub struct SpellClient<T: Transport> {
    transport: T,
    sort_candidates: bool,
    comparator: CandidateOrder,
}

impl<T: Transport> SpellClient<T> {
    pub fn new(transport: T, sort_candidates: bool) -> Self {
        Self {
            transport,
            sort_candidates,
            comparator: lexicographic,
        }
    }

    pub fn with_comparator(mut self, comparator: CandidateOrder) -> Self {
        self.comparator = comparator;
        self
    }

    /// Check one word. `Ok(None)` means the wait was interrupted by the
    /// user; the word has no verdict and the caller moves on.
    ///
    /// A record with no lines at all means the backend had no objection:
    /// the word is accepted. That leniency is deliberate and load-bearing.
    pub fn check(&mut self, word: &str) -> Result<Option<CheckVerdict>> {
        // Verbose-mode marker first, then the word itself. The caret keeps
        // the backend from interpreting the word as a directive.
        self.transport.send_line("%")?;
        self.transport.send_line(&format!("^{word}"))?;

        let mut record = Vec::new();
        loop {
            match self.transport.read_line() {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        break;
                    }
                    record.push(line);
                }
                Ok(None) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => return Ok(None),
                Err(e) => return Err(Error::BackendUnavailable(e.to_string())),
            }
        }

        self.parse_record(&record).map(Some)
    }

    /// `*<word>`: save to the personal dictionary.
    pub fn save_word(&mut self, word: &str) -> Result<()> {
        self.transport.send_line(&format!("*{word}"))?;
        Ok(())
    }

    /// `@<word>`: accept for this session without saving.
    pub fn accept_word(&mut self, word: &str) -> Result<()> {
        self.transport.send_line(&format!("@{word}"))?;
        Ok(())
    }

    /// `#`: flush the personal dictionary to disk.
    pub fn flush_personal_dictionary(&mut self) -> Result<()> {
        self.transport.send_line("#")?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn transport_ref(&self) -> &T {
        &self.transport
    }

    #[cfg(test)]
    pub(crate) fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn parse_record(&self, record: &[String]) -> Result<CheckVerdict> {
        let Some(first) = record.first() else {
            // No reply record at all: no objection.
            return Ok(CheckVerdict::Correct);
        };

        match first.chars().next() {
            Some('*') | Some('+') | Some('-') => Ok(CheckVerdict::Correct),
            Some('&') | Some('?') => self.parse_suggestions(first),
            Some('#') => parse_no_suggestions(first),
            _ => Err(Error::Protocol(format!(
                "unrecognized reply record: {first:?}"
            ))),
        }
    }

    /// `& <orig> <count> <offset>: <cand>, <cand>, ...`
    fn parse_suggestions(&self, line: &str) -> Result<CheckVerdict> {
        let rest = line[1..].trim_start();
        let (head, tail) = rest
            .split_once(':')
            .ok_or_else(|| Error::Protocol(format!("malformed suggestion record: {line:?}")))?;

        let mut head_fields = head.split_whitespace();
        let matched_text = head_fields.next().map(|s| s.to_string());
        let _count = head_fields.next();
        // Offsets count from the start of the sent line; the leading caret
        // occupies the first column.
        let matched_offset = head_fields
            .next()
            .and_then(|s| s.parse::<usize>().ok())
            .map(|n| n.saturating_sub(1));

        let mut candidates: Vec<String> = tail
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if self.sort_candidates {
            candidates.sort_by(self.comparator);
        }

        Ok(CheckVerdict::Misspelled {
            candidates,
            matched_offset,
            matched_text,
        })
    }
}

/// `# <orig> <offset>`: misspelled, nothing to suggest.
fn parse_no_suggestions(line: &str) -> Result<CheckVerdict> {
    let mut fields = line[1..].split_whitespace();
    let matched_text = fields.next().map(|s| s.to_string());
    let matched_offset = fields
        .next()
        .and_then(|s| s.parse::<usize>().ok())
        .map(|n| n.saturating_sub(1));

    Ok(CheckVerdict::Misspelled {
        candidates: Vec::new(),
        matched_offset,
        matched_text,
    })
}


#[cfg(test)]
mod tests {
    use super::scripted::ScriptedTransport;
    use super::*;

    fn client(transport: ScriptedTransport) -> SpellClient<ScriptedTransport> {
        SpellClient::new(transport, false)
    }

    #[test]
    fn test_correct_word() {
        let mut t = ScriptedTransport::new();
        t.push_record(&["*"]);
        let mut c = client(t);
        assert_eq!(c.check("hello").unwrap(), Some(CheckVerdict::Correct));
    }

    #[test]
    fn test_empty_record_means_accepted() {
        let t = ScriptedTransport::new();
        let mut c = client(t);
        assert_eq!(c.check("hello").unwrap(), Some(CheckVerdict::Correct));
    }

    #[test]
    fn test_suggestion_record() {
        let mut t = ScriptedTransport::new();
        t.push_record(&["& teh 3 1: the, ten, tea"]);
        let mut c = client(t);
        match c.check("teh").unwrap().unwrap() {
            CheckVerdict::Misspelled {
                candidates,
                matched_offset,
                matched_text,
            } => {
                assert_eq!(candidates, vec!["the", "ten", "tea"]);
                assert_eq!(matched_offset, Some(0));
                assert_eq!(matched_text.as_deref(), Some("teh"));
            }
            other => panic!("unexpected verdict: {other:?}"),
        }
    }

    #[test]
    fn test_sorted_candidates() {
        let mut t = ScriptedTransport::new();
        t.push_record(&["& teh 3 1: ten, the, tea"]);
        let mut c = SpellClient::new(t, true);
        match c.check("teh").unwrap().unwrap() {
            CheckVerdict::Misspelled { candidates, .. } => {
                assert_eq!(candidates, vec!["tea", "ten", "the"]);
            }
            other => panic!("unexpected verdict: {other:?}"),
        }
    }

    #[test]
    fn test_no_suggestions_record() {
        let mut t = ScriptedTransport::new();
        t.push_record(&["# qzwx 1"]);
        let mut c = client(t);
        match c.check("qzwx").unwrap().unwrap() {
            CheckVerdict::Misspelled { candidates, .. } => assert!(candidates.is_empty()),
            other => panic!("unexpected verdict: {other:?}"),
        }
    }

    #[test]
    fn test_protocol_desync() {
        let mut t = ScriptedTransport::new();
        t.push_record(&["!garbage"]);
        let mut c = client(t);
        assert!(matches!(c.check("word"), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_interrupt_yields_no_verdict() {
        let mut t = ScriptedTransport::new();
        t.push_record(&["*"]);
        t.interrupt_next = true;
        let mut c = client(t);
        assert_eq!(c.check("hello").unwrap(), None);
    }

    #[test]
    fn test_directives() {
        let t = ScriptedTransport::new();
        let mut c = client(t);
        c.save_word("zig").unwrap();
        c.accept_word("zag").unwrap();
        c.flush_personal_dictionary().unwrap();
        assert_eq!(c.transport.sent, vec!["*zig", "@zag", "#"]);
    }
}
