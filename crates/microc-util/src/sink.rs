//! External collaborator traits.
//!
//! The interpreter never talks to stdout, a BLE radio, or a GPIO pin
//! directly. It talks to these two traits, and the embedding program
//! supplies concrete implementations.

/// Receives the textual output of a running program.
///
/// `print` and diagnostic messages are both delivered through `write`,
/// already framed with the `__P__`/`__ER__` protocol markers.
pub trait OutputSink: Send {
    fn write(&mut self, message: &str);
}

/// A stdout-backed sink, used by the desktop CLI.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write(&mut self, message: &str) {
        print!("{message}");
    }
}

/// An in-memory sink used by tests to assert on exact emitted text.
#[derive(Debug, Default)]
pub struct BufferSink {
    buf: String,
}

impl BufferSink {
    pub fn new() -> Self {
        BufferSink::default()
    }

    pub fn contents(&self) -> &str {
        &self.buf
    }
}

impl OutputSink for BufferSink {
    fn write(&mut self, message: &str) {
        self.buf.push_str(message);
    }
}

/// An in-memory sink whose contents stay readable through a cloned handle
/// after the original has been boxed away inside a [`crate::handler::Handler`].
///
/// `BufferSink` itself can't serve this purpose: `Handler` takes ownership
/// of its `Box<dyn OutputSink>`, so a plain `BufferSink` passed in is gone
/// for good. This wraps the buffer in a shared, lockable cell instead.
#[derive(Debug, Clone, Default)]
pub struct SharedBufferSink {
    buf: std::sync::Arc<parking_lot::Mutex<String>>,
}

impl SharedBufferSink {
    pub fn new() -> Self {
        SharedBufferSink::default()
    }

    pub fn contents(&self) -> String {
        self.buf.lock().clone()
    }
}

impl OutputSink for SharedBufferSink {
    fn write(&mut self, message: &str) {
        self.buf.lock().push_str(message);
    }
}

/// Sends a command to a physical tile over the radio transport.
///
/// Only implemented by embedded builds; the `send_bool` built-in is a
/// runtime error without one (see [`crate::error::RuntimeError::not_embedded`]).
pub trait RadioFormatter: Send {
    fn send_bool(&mut self, tile_index: i32, value: bool);
}

/// A `RadioFormatter` that records calls instead of touching hardware,
/// useful for exercising tile-facing scripts without real hardware.
#[derive(Debug, Default)]
pub struct LoggingRadio {
    pub calls: Vec<(i32, bool)>,
}

impl RadioFormatter for LoggingRadio {
    fn send_bool(&mut self, tile_index: i32, value: bool) {
        tracing::debug!(tile_index, value, "send_bool");
        self.calls.push((tile_index, value));
    }
}
