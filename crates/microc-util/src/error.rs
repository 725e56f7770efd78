//! Shared error kinds for the parser and interpreter.
//!
//! Both kinds report through the same [`crate::handler::Handler`] latch; there is
//! no local recovery once one is raised (see the error-handling design notes).

use thiserror::Error;

use crate::span::Span;

/// A syntax error raised while parsing tokens into an AST.
#[derive(Debug, Error, Clone)]
#[error("syntax error at {span}: {message}")]
pub struct SyntaxError {
    pub span: Span,
    pub message: String,
}

impl SyntaxError {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        SyntaxError { span, message: message.into() }
    }
}

/// A runtime error raised while interpreting an AST.
#[derive(Debug, Error, Clone)]
#[error("runtime error: {message}")]
pub struct RuntimeError {
    pub message: String,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        RuntimeError { message: message.into() }
    }

    pub fn undefined_variable(name: &str) -> Self {
        Self::new(format!("undefined variable '{name}'"))
    }

    pub fn undefined_function(name: &str) -> Self {
        Self::new(format!("undefined function '{name}'"))
    }

    pub fn redeclared(name: &str) -> Self {
        Self::new(format!("'{name}' is already declared in this scope"))
    }

    pub fn division_by_zero() -> Self {
        Self::new("division by zero")
    }

    pub fn wrong_arity(name: &str, expected: usize, got: usize) -> Self {
        Self::new(format!("'{name}' expects {expected} argument(s), got {got}"))
    }

    pub fn domain_error(name: &str, arg: f64) -> Self {
        Self::new(format!("'{name}' is undefined for argument {arg}"))
    }

    pub fn not_a_value(name: &str) -> Self {
        Self::new(format!("'{name}' is a function, not a value"))
    }

    pub fn not_embedded(name: &str) -> Self {
        Self::new(format!("'{name}' is only available on embedded builds"))
    }

    pub fn recursion_limit(depth: usize) -> Self {
        Self::new(format!("maximum recursion depth ({depth}) exceeded"))
    }
}

pub type ParseResult<T> = std::result::Result<T, SyntaxError>;
pub type RunResult<T> = std::result::Result<T, RuntimeError>;
