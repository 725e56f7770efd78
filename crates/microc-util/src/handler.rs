//! Cooperative error/cancellation latch shared by the parser and interpreter.
//!
//! A single `Handler` is constructed once per program run and threaded
//! through parsing and interpretation (the lexer cannot fail, so it never
//! sees one). The first call to `handle_error` flips the stop latch; every
//! loop and recursive call checks `should_stop` and unwinds quickly.

use parking_lot::Mutex;

use crate::diagnostic::{Diagnostic, Level};
use crate::sink::OutputSink;
use crate::span::Span;

struct Inner {
    stop: bool,
    diagnostics: Vec<Diagnostic>,
}

pub struct Handler {
    inner: Mutex<Inner>,
    sink: Mutex<Box<dyn OutputSink>>,
}

impl Handler {
    pub fn new(sink: Box<dyn OutputSink>) -> Self {
        Handler {
            inner: Mutex::new(Inner { stop: false, diagnostics: Vec::new() }),
            sink: Mutex::new(sink),
        }
    }

    /// Records a diagnostic, writes its framed form to the sink, and
    /// latches `stop` so callers unwind instead of continuing.
    pub fn handle_error(&self, level: Level, span: Span, message: impl Into<String>) {
        let diagnostic = Diagnostic::builder(level).span(span).message(message).build();
        tracing::error!(%diagnostic, "handled error");
        self.sink.lock().write(&diagnostic.framed());
        let mut inner = self.inner.lock();
        inner.stop = true;
        inner.diagnostics.push(diagnostic);
    }

    pub fn should_stop(&self) -> bool {
        self.inner.lock().stop
    }

    pub fn trigger_stop(&self) {
        self.inner.lock().stop = true;
    }

    pub fn reset_stop(&self) {
        let mut inner = self.inner.lock();
        inner.stop = false;
        inner.diagnostics.clear();
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.inner.lock().diagnostics.clone()
    }

    pub fn print(&self, payload: &str) {
        self.write_raw(&format!("__P__{payload}\n__P__"));
    }

    pub fn write_raw(&self, message: &str) {
        self.sink.lock().write(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::BufferSink;

    #[test]
    fn handle_error_latches_stop_and_frames_message() {
        let handler = Handler::new(Box::new(BufferSink::new()));
        assert!(!handler.should_stop());
        handler.handle_error(Level::RuntimeError, Span::DUMMY, "boom");
        assert!(handler.should_stop());
        assert_eq!(handler.diagnostics().len(), 1);
    }

    #[test]
    fn reset_stop_clears_latch_and_diagnostics() {
        let handler = Handler::new(Box::new(BufferSink::new()));
        handler.handle_error(Level::SyntaxError, Span::DUMMY, "bad token");
        handler.reset_stop();
        assert!(!handler.should_stop());
        assert!(handler.diagnostics().is_empty());
    }
}
