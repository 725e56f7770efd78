//! Runtime values and statement-level control-flow signals.

use std::fmt;

/// A runtime value. Functions are not first-class: they live only in a
/// frame's function table and never flow through `Value`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f64),
}

impl Value {
    pub fn as_f64(self) -> f64 {
        match self {
            Value::Int(i) => i as f64,
            Value::Float(f) => f,
        }
    }

    pub fn type_name(self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
        }
    }

    /// Any nonzero numeric value is truthy.
    pub fn is_truthy(self) -> bool {
        self.as_f64() != 0.0
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
        }
    }
}

/// What a statement did, propagated up through nested blocks instead of
/// raised as an exception.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlFlow {
    None,
    Break,
    Continue,
    Return(Option<Value>),
}

impl ControlFlow {
    pub fn is_exiting(&self) -> bool {
        !matches!(self, ControlFlow::None)
    }
}
