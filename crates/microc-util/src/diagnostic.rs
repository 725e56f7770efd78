//! A small fluent diagnostic builder, in the spirit of a compiler's
//! diagnostic engine but trimmed to what this language needs: one
//! message per error, no error codes, no secondary notes/help text.

use std::fmt;

use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    SyntaxError,
    RuntimeError,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::SyntaxError => write!(f, "syntax error"),
            Level::RuntimeError => write!(f, "runtime error"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: Level,
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    pub fn builder(level: Level) -> DiagnosticBuilder {
        DiagnosticBuilder::new(level)
    }

    /// Renders the message as it is written to the output sink, wrapped
    /// in the `__ER__` protocol marker.
    pub fn framed(&self) -> String {
        format!("__ER__{}\n__ER__", self.message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.span == Span::DUMMY {
            write!(f, "{}: {}", self.level, self.message)
        } else {
            write!(f, "{} at {}: {}", self.level, self.span, self.message)
        }
    }
}

/// Fluent builder, e.g. `Diagnostic::builder(Level::SyntaxError).span(s).message("...").build()`.
#[derive(Debug, Default)]
pub struct DiagnosticBuilder {
    level: Option<Level>,
    span: Span,
    message: String,
}

impl DiagnosticBuilder {
    pub fn new(level: Level) -> Self {
        DiagnosticBuilder { level: Some(level), span: Span::DUMMY, message: String::new() }
    }

    pub fn span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn build(self) -> Diagnostic {
        Diagnostic {
            level: self.level.expect("DiagnosticBuilder::new always sets level"),
            span: self.span,
            message: self.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_produces_framed_message() {
        let diag = Diagnostic::builder(Level::RuntimeError)
            .message("division by zero")
            .build();
        assert_eq!(diag.framed(), "__ER__division by zero\n__ER__");
    }

    #[test]
    fn display_includes_span_when_present() {
        let diag = Diagnostic::builder(Level::SyntaxError)
            .span(Span::new(0, 1, 3, 7))
            .message("unexpected token")
            .build();
        assert_eq!(diag.to_string(), "syntax error at 3:7: unexpected token");
    }
}
