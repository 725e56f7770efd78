//! Shared types used by the microc lexer, parser, and interpreter: source
//! spans, the two error kinds, a fluent diagnostic builder, the shared
//! stop-latch error handler, and the output/radio collaborator traits.

pub mod diagnostic;
pub mod error;
pub mod handler;
pub mod sink;
pub mod span;

pub use diagnostic::{Diagnostic, DiagnosticBuilder, Level};
pub use error::{ParseResult, RunResult, RuntimeError, SyntaxError};
pub use handler::Handler;
pub use sink::{BufferSink, LoggingRadio, OutputSink, RadioFormatter, SharedBufferSink, StdoutSink};
pub use span::Span;
