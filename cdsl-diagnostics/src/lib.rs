//! Accumulating diagnostic sink shared by every pass and renderer.
//!
//! Mirrors the split the teacher draws between recoverable, path-tagged
//! diagnostics and the rare internal error that must abort a compile
//! outright: everything that can be attributed to a spot in the input model
//! flows through [`Sink`]; only [`Severity::Error`] with
//! [`MessageCode::Internal`] is expected to additionally propagate as a hard
//! `Err` from the pass that raised it.

mod path;
mod span;

pub use path::PathSegment;
pub use span::Span;

use std::collections::HashSet;
use std::fmt;

/// The five error classes from the error-handling design, plus `Duplicate`
/// which the source text calls out as its own always-an-error bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageCode {
    /// Missing required property, wrong shape, unknown property.
    Structural,
    /// Target not found, ambiguous partner, dotted-name collision.
    Reference,
    /// Nullable/array/disallowed-type key, v2 partial constraint.
    SpecViolation,
    /// Illegal identifier, reserved keyword, geometry type in v2, nested array-of.
    DialectViolation,
    /// Two definitions or elements collide under the chosen naming mode.
    Duplicate,
    /// An invariant the passes rely on was broken; always fatal.
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct Message {
    pub severity: Severity,
    pub code: MessageCode,
    pub path: Vec<PathSegment>,
    pub text: String,
    pub span: Option<Span>,
}

impl Message {
    fn dedup_key(&self) -> (MessageCode, Vec<PathSegment>) {
        (self.code, self.path.clone())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use colored::Colorize;

        let tag = match self.severity {
            Severity::Info => "info".cyan(),
            Severity::Warning => "warning".yellow(),
            Severity::Error => "error".red().bold(),
        };
        write!(f, "{tag}: {}", self.text)?;
        if !self.path.is_empty() {
            write!(f, " (at {})", path::join(&self.path))?;
        }
        Ok(())
    }
}

/// Accumulates messages for one compile. Deduplicates by `(code, path)` per
/// the error-handling design: a pass that revisits the same definition twice
/// (e.g. once per containment recursion) must not double-report.
#[derive(Debug, Default)]
pub struct Sink {
    messages: Vec<Message>,
    seen: HashSet<(MessageCode, Vec<PathSegment>)>,
}

impl Sink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        if self.seen.insert(message.dedup_key()) {
            self.messages.push(message);
        }
    }

    pub fn info(&mut self, code: MessageCode, path: Vec<PathSegment>, text: impl Into<String>) {
        self.push(Message {
            severity: Severity::Info,
            code,
            path,
            text: text.into(),
            span: None,
        });
    }

    pub fn warning(&mut self, code: MessageCode, path: Vec<PathSegment>, text: impl Into<String>) {
        self.push(Message {
            severity: Severity::Warning,
            code,
            path,
            text: text.into(),
            span: None,
        });
    }

    pub fn error(&mut self, code: MessageCode, path: Vec<PathSegment>, text: impl Into<String>) {
        self.push(Message {
            severity: Severity::Error,
            code,
            path,
            text: text.into(),
            span: None,
        });
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|m| m.severity == Severity::Error)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

/// Fatal condition that aborts the compile immediately: the `Internal` class
/// of §7, which "terminates compile" rather than merely being recorded.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("internal invariant violated: {0}")]
    Invariant(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedups_by_code_and_path() {
        let mut sink = Sink::new();
        let path = vec![PathSegment::Name("S.E".into())];
        sink.error(MessageCode::Duplicate, path.clone(), "first");
        sink.error(MessageCode::Duplicate, path, "second, should be swallowed");
        assert_eq!(sink.messages().len(), 1);
        assert_eq!(sink.messages()[0].text, "first");
    }

    #[test]
    fn has_errors_ignores_info_and_warning() {
        let mut sink = Sink::new();
        sink.info(MessageCode::Structural, vec![], "fyi");
        sink.warning(MessageCode::SpecViolation, vec![], "careful");
        assert!(!sink.has_errors());
        sink.error(MessageCode::Internal, vec![], "boom");
        assert!(sink.has_errors());
    }
}
