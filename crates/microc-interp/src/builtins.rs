//! Built-in function table.
//!
//! Consulted before any user-declared function, by name, unconditionally
//! -- a built-in cannot be shadowed by scope, only its *name* can be
//! reserved so redeclaring it is a declared-twice error (see
//! [`crate::Interpreter::install_builtin_placeholders`]).

use microc_par::Expr;
use microc_util::RuntimeError;
use rand::Rng;

use crate::value::Value;
use crate::{Interpreter, RunResult};

pub const BUILTIN_NAMES: &[&str] = &[
    "print",
    "wait",
    "rand",
    "runtime",
    "float_to_int",
    "int_to_float",
    "pow",
    "pi",
    "exp",
    "sin",
    "cos",
    "tan",
    "atan",
    "asin",
    "acos",
    "atan2",
    "sqrt",
    "abs",
    "floor",
    "ceil",
    "log",
    "log10",
    "log2",
    "min",
    "max",
    "round",
    "send_bool",
];

/// Dispatches a call to a built-in by name. Returns `None` if `name` is
/// not a built-in, so the caller falls through to user-function lookup.
pub(crate) fn dispatch(
    interp: &mut Interpreter,
    name: &str,
    args: &[Expr],
    frame: usize,
) -> Option<RunResult<Value>> {
    if !BUILTIN_NAMES.contains(&name) {
        return None;
    }
    if interp.handler.should_stop() {
        // Already latched (an earlier error was already reported, or the
        // host cancelled externally): skip the side effect and hand back
        // an inert value rather than raising a second diagnostic here --
        // the next statement/loop boundary unwinds the rest of the run.
        return Some(Ok(Value::Int(0)));
    }
    tracing::debug!(name, args = args.len(), "builtin call");

    Some(match name {
        "print" => print(interp, args, frame),
        "wait" => wait(interp, args, frame),
        "rand" => rand_builtin(args),
        "runtime" => runtime(interp, args),
        "float_to_int" => float_to_int(interp, args, frame),
        "int_to_float" => int_to_float(interp, args, frame),
        "pow" => pow(interp, args, frame),
        "pi" => pi(args),
        "exp" => one_arg(interp, args, frame, "exp", f64::exp),
        "sin" => one_arg(interp, args, frame, "sin", f64::sin),
        "cos" => one_arg(interp, args, frame, "cos", f64::cos),
        "tan" => one_arg(interp, args, frame, "tan", f64::tan),
        "atan" => one_arg(interp, args, frame, "atan", f64::atan),
        "asin" => bounded_one_arg(interp, args, frame, "asin", f64::asin),
        "acos" => bounded_one_arg(interp, args, frame, "acos", f64::acos),
        "atan2" => two_arg(interp, args, frame, "atan2", f64::atan2),
        "sqrt" => nonneg_one_arg(interp, args, frame, "sqrt", "positive", f64::sqrt),
        "abs" => one_arg(interp, args, frame, "abs", f64::abs),
        "floor" => one_arg(interp, args, frame, "floor", f64::floor),
        "ceil" => one_arg(interp, args, frame, "ceil", f64::ceil),
        "log" => nonneg_one_arg(interp, args, frame, "log", "positive", f64::ln),
        "log10" => nonneg_one_arg(interp, args, frame, "log10", "positive", f64::log10),
        "log2" => nonneg_one_arg(interp, args, frame, "log2", "positive", f64::log2),
        "min" => two_arg(interp, args, frame, "min", f64::min),
        "max" => two_arg(interp, args, frame, "max", f64::max),
        "round" => round(interp, args, frame),
        "send_bool" => send_bool(interp, args, frame),
        _ => return None,
    })
}

fn is_zero_arg_call(args: &[Expr]) -> bool {
    args.len() == 1 && matches!(args[0], Expr::Empty)
}

fn eval(interp: &mut Interpreter, expr: &Expr, frame: usize) -> RunResult<Value> {
    interp.interpret_expression(expr, frame)
}

fn print(interp: &mut Interpreter, args: &[Expr], frame: usize) -> RunResult<Value> {
    if args.len() != 1 {
        return Err(RuntimeError::wrong_arity("print", 1, args.len()));
    }
    let val = eval(interp, &args[0], frame)?;
    interp.handler.print(&val.to_string());
    Ok(Value::Int(0))
}

fn wait(interp: &mut Interpreter, args: &[Expr], frame: usize) -> RunResult<Value> {
    if args.len() != 1 {
        return Err(RuntimeError::wrong_arity("wait", 1, args.len()));
    }
    let val = eval(interp, &args[0], frame)?;
    let Value::Int(millis) = val else {
        return Err(RuntimeError::new("wait() takes an integer argument"));
    };
    std::thread::sleep(std::time::Duration::from_millis(millis.max(0) as u64));
    Ok(Value::Int(0))
}

fn rand_builtin(args: &[Expr]) -> RunResult<Value> {
    if !is_zero_arg_call(args) {
        return Err(RuntimeError::wrong_arity("rand", 0, args.len()));
    }
    Ok(Value::Float(rand::thread_rng().gen::<f64>()))
}

fn runtime(interp: &mut Interpreter, args: &[Expr]) -> RunResult<Value> {
    if !is_zero_arg_call(args) {
        return Err(RuntimeError::wrong_arity("runtime", 0, args.len()));
    }
    Ok(Value::Int(interp.started_at.elapsed().as_millis() as i32))
}

fn float_to_int(interp: &mut Interpreter, args: &[Expr], frame: usize) -> RunResult<Value> {
    if args.len() != 1 {
        return Err(RuntimeError::wrong_arity("float_to_int", 1, args.len()));
    }
    let val = eval(interp, &args[0], frame)?;
    let Value::Float(f) = val else {
        return Err(RuntimeError::new("float_to_int() takes a float argument"));
    };
    Ok(Value::Int(f as i32))
}

fn int_to_float(interp: &mut Interpreter, args: &[Expr], frame: usize) -> RunResult<Value> {
    if args.len() != 1 {
        return Err(RuntimeError::wrong_arity("int_to_float", 1, args.len()));
    }
    let val = eval(interp, &args[0], frame)?;
    let Value::Int(i) = val else {
        return Err(RuntimeError::new("int_to_float() takes an integer argument"));
    };
    Ok(Value::Float(i as f64))
}

fn pi(args: &[Expr]) -> RunResult<Value> {
    if !is_zero_arg_call(args) {
        return Err(RuntimeError::wrong_arity("pi", 0, args.len()));
    }
    Ok(Value::Float(std::f64::consts::PI))
}

fn pow(interp: &mut Interpreter, args: &[Expr], frame: usize) -> RunResult<Value> {
    if args.len() != 2 {
        return Err(RuntimeError::wrong_arity("pow", 2, args.len()));
    }
    let base = eval(interp, &args[0], frame)?.as_f64();
    let exponent = eval(interp, &args[1], frame)?.as_f64();
    Ok(Value::Float(base.powf(exponent)))
}

fn one_arg(
    interp: &mut Interpreter,
    args: &[Expr],
    frame: usize,
    name: &str,
    f: fn(f64) -> f64,
) -> RunResult<Value> {
    if args.len() != 1 {
        return Err(RuntimeError::wrong_arity(name, 1, args.len()));
    }
    let value = eval(interp, &args[0], frame)?.as_f64();
    Ok(Value::Float(f(value)))
}

fn bounded_one_arg(
    interp: &mut Interpreter,
    args: &[Expr],
    frame: usize,
    name: &str,
    f: fn(f64) -> f64,
) -> RunResult<Value> {
    if args.len() != 1 {
        return Err(RuntimeError::wrong_arity(name, 1, args.len()));
    }
    let value = eval(interp, &args[0], frame)?.as_f64();
    if !(-1.0..=1.0).contains(&value) {
        return Err(RuntimeError::domain_error(name, value));
    }
    Ok(Value::Float(f(value)))
}

fn nonneg_one_arg(
    interp: &mut Interpreter,
    args: &[Expr],
    frame: usize,
    name: &str,
    _domain: &str,
    f: fn(f64) -> f64,
) -> RunResult<Value> {
    if args.len() != 1 {
        return Err(RuntimeError::wrong_arity(name, 1, args.len()));
    }
    let value = eval(interp, &args[0], frame)?.as_f64();
    if value < 0.0 {
        return Err(RuntimeError::domain_error(name, value));
    }
    Ok(Value::Float(f(value)))
}

fn two_arg(
    interp: &mut Interpreter,
    args: &[Expr],
    frame: usize,
    name: &str,
    f: fn(f64, f64) -> f64,
) -> RunResult<Value> {
    if args.len() != 2 {
        return Err(RuntimeError::wrong_arity(name, 2, args.len()));
    }
    let a = eval(interp, &args[0], frame)?.as_f64();
    let b = eval(interp, &args[1], frame)?.as_f64();
    Ok(Value::Float(f(a, b)))
}

fn round(interp: &mut Interpreter, args: &[Expr], frame: usize) -> RunResult<Value> {
    if args.len() != 2 {
        return Err(RuntimeError::wrong_arity("round", 2, args.len()));
    }
    let x = eval(interp, &args[0], frame)?.as_f64();
    let digits = eval(interp, &args[1], frame)?.as_f64();
    let factor = 10f64.powf(digits);
    Ok(Value::Float((x * factor).round() / factor))
}

fn send_bool(interp: &mut Interpreter, args: &[Expr], frame: usize) -> RunResult<Value> {
    if args.len() != 2 {
        return Err(RuntimeError::wrong_arity("send_bool", 2, args.len()));
    }
    let tile = eval(interp, &args[0], frame)?;
    let Value::Int(tile_index) = tile else {
        return Err(RuntimeError::new("send_bool()'s first argument must be an integer"));
    };
    let truthy = eval(interp, &args[1], frame)?.is_truthy();

    match interp.radio.as_deref_mut() {
        Some(radio) => {
            radio.send_bool(tile_index, truthy);
            Ok(Value::Int(0))
        }
        None => Err(RuntimeError::not_embedded("send_bool")),
    }
}
