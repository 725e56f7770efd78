//! Tree-walking interpreter: runs a parsed [`microc_par::Block`] directly,
//! with no separate bytecode or IR stage.
//!
//! Frames chain by index into [`Interpreter::frames`] (see [`frame`]);
//! function calls get a fresh, unparented frame pre-loaded with every
//! function visible from the call site, which is what gives this
//! language call-by-value isolation with no closures.

mod builtins;
mod frame;
mod value;

use std::rc::Rc;
use std::time::Instant;

use microc_par::{Block, Expr, NumberKind, Stmt, TypeName};
use microc_util::{Handler, Level, RadioFormatter, RuntimeError, Span};

pub use frame::{FunctionDef, ValueKind};
pub use microc_util::RunResult;
pub use value::{ControlFlow, Value};

use frame::Frame;

/// Matches the interpreter's own defined constant for a call-stack depth
/// guard; the reference implementation declares this but never enforces
/// it. Enforced here since an embedded target has no stack to spare.
pub const MAX_RECURSION_DEPTH: usize = 4;

pub struct Interpreter<'a> {
    handler: &'a Handler,
    radio: Option<&'a mut dyn RadioFormatter>,
    frames: Vec<Frame>,
    started_at: Instant,
    call_depth: usize,
}

impl<'a> Interpreter<'a> {
    pub fn new(handler: &'a Handler) -> Self {
        Interpreter { handler, radio: None, frames: Vec::new(), started_at: Instant::now(), call_depth: 0 }
    }

    pub fn with_radio(handler: &'a Handler, radio: &'a mut dyn RadioFormatter) -> Self {
        Interpreter { handler, radio: Some(radio), frames: Vec::new(), started_at: Instant::now(), call_depth: 0 }
    }

    /// Runs a whole program in a fresh global scope. Built-in names are
    /// pre-registered as placeholders in that scope purely so that
    /// redeclaring one surfaces the ordinary "already declared" error.
    ///
    /// Any runtime error is reported to the handler exactly once, here,
    /// rather than at the point it was raised -- nothing downstream of a
    /// `?` ever runs again after an `Err`, so the observable output
    /// (the framed `__ER__` message) is identical either way.
    pub fn run(&mut self, program: &Block) -> RunResult<()> {
        if self.handler.should_stop() {
            return Ok(());
        }

        self.frames.push(Frame::new(None));
        self.install_builtin_placeholders(0);

        let outcome = self.interpret_block(program, 0);
        self.frames.pop();

        match outcome {
            Ok(_) => Ok(()),
            Err(err) => {
                self.handler.handle_error(Level::RuntimeError, Span::DUMMY, err.message.clone());
                Err(err)
            }
        }
    }

    fn install_builtin_placeholders(&mut self, global: usize) {
        for name in builtins::BUILTIN_NAMES {
            self.frames[global].insert_function(name.to_string(), None);
        }
    }

    fn interpret_block(&mut self, block: &Block, parent: usize) -> RunResult<ControlFlow> {
        self.frames.push(Frame::new(Some(parent)));
        let idx = self.frames.len() - 1;
        tracing::trace!(frame = idx, parent, "frame push");

        let mut result = ControlFlow::None;
        for stmt in &block.statements {
            if self.handler.should_stop() {
                break;
            }
            match self.interpret_statement(stmt, idx) {
                Ok(cf) => {
                    if cf.is_exiting() {
                        result = cf;
                        break;
                    }
                }
                Err(err) => {
                    self.frames.pop();
                    tracing::trace!(frame = idx, "frame pop (error)");
                    return Err(err);
                }
            }
        }

        self.frames.pop();
        tracing::trace!(frame = idx, "frame pop");
        Ok(result)
    }

    fn interpret_statement(&mut self, stmt: &Stmt, frame: usize) -> RunResult<ControlFlow> {
        tracing::trace!(frame, ?stmt, "interpreting statement");
        match stmt {
            Stmt::VarDecl { name, ty, init } => {
                self.interpret_variable_declaration(name, *ty, init, frame)?;
                Ok(ControlFlow::None)
            }
            Stmt::Assign { name, value } => {
                self.interpret_assignment(name, value, frame)?;
                Ok(ControlFlow::None)
            }
            Stmt::FunctionDecl { name, params, param_types, body, .. } => {
                self.interpret_function_declaration(name, params, param_types, body, frame)?;
                Ok(ControlFlow::None)
            }
            Stmt::Call(expr) => {
                self.interpret_expression(expr, frame)?;
                Ok(ControlFlow::None)
            }
            Stmt::If { conditions, bodies } => self.interpret_if(conditions, bodies, frame),
            Stmt::While { condition, body } => self.interpret_while(condition, body, frame),
            Stmt::For { init, condition, increment, body } => {
                self.interpret_for(init, condition, increment, body, frame)
            }
            Stmt::Break => Ok(ControlFlow::Break),
            Stmt::Continue => Ok(ControlFlow::Continue),
            Stmt::Return(None) => Ok(ControlFlow::Return(None)),
            Stmt::Return(Some(expr)) => {
                let value = self.interpret_expression(expr, frame)?;
                Ok(ControlFlow::Return(Some(value)))
            }
        }
    }

    fn interpret_expression(&mut self, expr: &Expr, frame: usize) -> RunResult<Value> {
        match expr {
            Expr::Number { lexeme, kind } => Ok(Self::interpret_number(lexeme, *kind)),
            Expr::VarAccess { name } => self.interpret_variable_access(name, frame),
            Expr::Binary { left, op, right } => self.interpret_binary_operation(left, op, right, frame),
            Expr::Unary { op, operand } => {
                debug_assert_eq!(op, "!");
                let value = self.interpret_expression(operand, frame)?;
                Ok(Value::Int(if value.is_truthy() { 0 } else { 1 }))
            }
            Expr::Call { name, args } => self.interpret_function_call(name, args, frame),
            Expr::Empty => Err(RuntimeError::new("empty expression has no value")),
        }
    }

    fn interpret_number(lexeme: &str, kind: NumberKind) -> Value {
        match kind {
            NumberKind::Integer => Value::Int(lexeme.parse().unwrap_or(0)),
            NumberKind::Float => Value::Float(lexeme.parse().unwrap_or(0.0)),
        }
    }

    fn interpret_variable_access(&mut self, name: &str, frame: usize) -> RunResult<Value> {
        match self.get_kind(frame, name)? {
            ValueKind::Int => Ok(Value::Int(self.get_int(frame, name)?)),
            ValueKind::Float => Ok(Value::Float(self.get_float(frame, name)?)),
            ValueKind::Function => Err(RuntimeError::not_a_value(name)),
        }
    }

    fn interpret_binary_operation(&mut self, left: &Expr, op: &str, right: &Expr, frame: usize) -> RunResult<Value> {
        let left = self.interpret_expression(left, frame)?;
        let right = self.interpret_expression(right, frame)?;

        if matches!(left, Value::Float(_)) || matches!(right, Value::Float(_)) {
            let l = left.as_f64();
            let r = right.as_f64();

            if op == "/" && r == 0.0 {
                return Err(RuntimeError::division_by_zero());
            }

            Ok(match op {
                "+" => Value::Float(l + r),
                "-" => Value::Float(l - r),
                "*" => Value::Float(l * r),
                "/" => Value::Float(l / r),
                ">" => Value::Int((l > r) as i32),
                "<" => Value::Int((l < r) as i32),
                ">=" => Value::Int((l >= r) as i32),
                "<=" => Value::Int((l <= r) as i32),
                "==" => Value::Int((l == r) as i32),
                "!=" => Value::Int((l != r) as i32),
                "%" => Value::Int((l as i32).wrapping_rem(r as i32)),
                "&&" => Value::Int((l != 0.0 && r != 0.0) as i32),
                "||" => Value::Int((l != 0.0 || r != 0.0) as i32),
                other => return Err(RuntimeError::new(format!("unknown operator '{other}'"))),
            })
        } else {
            let l = match left {
                Value::Int(i) => i,
                Value::Float(_) => unreachable!(),
            };
            let r = match right {
                Value::Int(i) => i,
                Value::Float(_) => unreachable!(),
            };

            if op == "/" && r == 0 {
                return Err(RuntimeError::division_by_zero());
            }

            Ok(Value::Int(match op {
                "+" => l.wrapping_add(r),
                "-" => l.wrapping_sub(r),
                "*" => l.wrapping_mul(r),
                "/" => l / r,
                ">" => (l > r) as i32,
                "<" => (l < r) as i32,
                ">=" => (l >= r) as i32,
                "<=" => (l <= r) as i32,
                "==" => (l == r) as i32,
                "!=" => (l != r) as i32,
                "%" => l.wrapping_rem(r),
                "&&" => (l != 0 && r != 0) as i32,
                "||" => (l != 0 || r != 0) as i32,
                other => return Err(RuntimeError::new(format!("unknown operator '{other}'"))),
            }))
        }
    }

    fn interpret_function_call(&mut self, name: &str, args: &[Expr], frame: usize) -> RunResult<Value> {
        if let Some(result) = builtins::dispatch(self, name, args, frame) {
            return result;
        }

        let def = self.lookup_function(frame, name)?;

        let zero_arg_call = args.len() == 1 && matches!(args[0], Expr::Empty);
        if def.params.len() != args.len() && !(def.params.is_empty() && zero_arg_call) {
            return Err(RuntimeError::wrong_arity(name, def.params.len(), args.len()));
        }

        self.call_depth += 1;
        if self.call_depth > MAX_RECURSION_DEPTH {
            self.call_depth -= 1;
            return Err(RuntimeError::recursion_limit(MAX_RECURSION_DEPTH));
        }

        let visible = self.visible_functions(Some(frame));
        self.frames.push(Frame::new(None));
        let call_idx = self.frames.len() - 1;
        for (fn_name, fn_def) in visible {
            self.frames[call_idx].insert_function(fn_name, fn_def);
        }

        for (i, param) in def.params.iter().enumerate() {
            let value = match self.interpret_expression(&args[i], frame) {
                Ok(v) => v,
                Err(err) => {
                    self.frames.pop();
                    self.call_depth -= 1;
                    return Err(err);
                }
            };
            match def.param_types[i] {
                TypeName::Int => self.frames[call_idx].insert_int(param.clone(), value.as_f64() as i32),
                TypeName::Float => self.frames[call_idx].insert_float(param.clone(), value.as_f64()),
                TypeName::Void => unreachable!("parser rejects void parameters"),
            }
        }

        let outcome = self.interpret_block(&def.body, call_idx);
        self.frames.pop();
        self.call_depth -= 1;

        match outcome? {
            ControlFlow::Return(Some(value)) => Ok(value),
            _ => Ok(Value::Int(0)),
        }
    }

    fn interpret_variable_declaration(&mut self, name: &str, ty: TypeName, init: &Expr, frame: usize) -> RunResult<()> {
        let value = self.interpret_expression(init, frame)?;
        if self.is_allocated(frame, name) {
            return Err(RuntimeError::redeclared(name));
        }
        match ty {
            TypeName::Int => self.frames[frame].insert_int(name.to_string(), value.as_f64() as i32),
            TypeName::Float => self.frames[frame].insert_float(name.to_string(), value.as_f64()),
            TypeName::Void => unreachable!("parser rejects void variables"),
        }
        Ok(())
    }

    fn interpret_assignment(&mut self, name: &str, value: &Expr, frame: usize) -> RunResult<()> {
        let value = self.interpret_expression(value, frame)?;
        match self.get_kind(frame, name)? {
            ValueKind::Int => self.set_int(frame, name, value.as_f64() as i32),
            ValueKind::Float => self.set_float(frame, name, value.as_f64()),
            ValueKind::Function => Err(RuntimeError::not_a_value(name)),
        }
    }

    fn interpret_function_declaration(
        &mut self,
        name: &str,
        params: &[String],
        param_types: &[TypeName],
        body: &Block,
        frame: usize,
    ) -> RunResult<()> {
        if self.is_allocated(frame, name) {
            return Err(RuntimeError::redeclared(name));
        }
        let def = Rc::new(FunctionDef {
            params: params.to_vec(),
            param_types: param_types.to_vec(),
            body: body.clone(),
        });
        self.frames[frame].insert_function(name.to_string(), Some(def));
        Ok(())
    }

    fn interpret_if(&mut self, conditions: &[Expr], bodies: &[Block], frame: usize) -> RunResult<ControlFlow> {
        for (i, condition) in conditions.iter().enumerate() {
            let value = self.interpret_expression(condition, frame)?;
            if value.is_truthy() {
                return self.interpret_block(&bodies[i], frame);
            }
        }
        if bodies.len() > conditions.len() {
            return self.interpret_block(&bodies[bodies.len() - 1], frame);
        }
        Ok(ControlFlow::None)
    }

    fn interpret_while(&mut self, condition: &Expr, body: &Block, frame: usize) -> RunResult<ControlFlow> {
        loop {
            if self.handler.should_stop() {
                return Ok(ControlFlow::None);
            }
            let value = self.interpret_expression(condition, frame)?;
            if !value.is_truthy() {
                return Ok(ControlFlow::None);
            }
            match self.interpret_block(body, frame)? {
                ControlFlow::Break => return Ok(ControlFlow::None),
                ControlFlow::Return(v) => return Ok(ControlFlow::Return(v)),
                ControlFlow::Continue | ControlFlow::None => {}
            }
        }
    }

    /// The initializer and increment run against `frame`, the loop's own
    /// enclosing scope, once and every iteration respectively; only the
    /// body gets a fresh frame per iteration, via the ordinary block-entry
    /// mechanism in [`Self::interpret_block`].
    fn interpret_for(
        &mut self,
        init: &Stmt,
        condition: &Expr,
        increment: &Stmt,
        body: &Block,
        frame: usize,
    ) -> RunResult<ControlFlow> {
        self.interpret_statement(init, frame)?;
        loop {
            if self.handler.should_stop() {
                return Ok(ControlFlow::None);
            }
            let value = self.interpret_expression(condition, frame)?;
            if !value.is_truthy() {
                return Ok(ControlFlow::None);
            }
            match self.interpret_block(body, frame)? {
                ControlFlow::Break => return Ok(ControlFlow::None),
                ControlFlow::Return(v) => return Ok(ControlFlow::Return(v)),
                ControlFlow::Continue | ControlFlow::None => {}
            }
            self.interpret_statement(increment, frame)?;
        }
    }

    fn is_allocated(&self, frame: usize, name: &str) -> bool {
        let mut idx = Some(frame);
        while let Some(i) = idx {
            if self.frames[i].own_kind(name).is_some() {
                return true;
            }
            idx = self.frames[i].parent;
        }
        false
    }

    fn get_kind(&self, frame: usize, name: &str) -> RunResult<ValueKind> {
        let mut idx = Some(frame);
        while let Some(i) = idx {
            if let Some(kind) = self.frames[i].own_kind(name) {
                return Ok(kind);
            }
            idx = self.frames[i].parent;
        }
        Err(RuntimeError::undefined_variable(name))
    }

    fn get_int(&self, frame: usize, name: &str) -> RunResult<i32> {
        let mut idx = Some(frame);
        while let Some(i) = idx {
            if let Some(v) = self.frames[i].own_int(name) {
                return Ok(v);
            }
            idx = self.frames[i].parent;
        }
        Err(RuntimeError::undefined_variable(name))
    }

    fn get_float(&self, frame: usize, name: &str) -> RunResult<f64> {
        let mut idx = Some(frame);
        while let Some(i) = idx {
            if let Some(v) = self.frames[i].own_float(name) {
                return Ok(v);
            }
            idx = self.frames[i].parent;
        }
        Err(RuntimeError::undefined_variable(name))
    }

    fn set_int(&mut self, frame: usize, name: &str, value: i32) -> RunResult<()> {
        let mut idx = Some(frame);
        while let Some(i) = idx {
            if self.frames[i].own_int(name).is_some() {
                self.frames[i].insert_int(name.to_string(), value);
                return Ok(());
            }
            idx = self.frames[i].parent;
        }
        Err(RuntimeError::undefined_variable(name))
    }

    fn set_float(&mut self, frame: usize, name: &str, value: f64) -> RunResult<()> {
        let mut idx = Some(frame);
        while let Some(i) = idx {
            if self.frames[i].own_float(name).is_some() {
                self.frames[i].insert_float(name.to_string(), value);
                return Ok(());
            }
            idx = self.frames[i].parent;
        }
        Err(RuntimeError::undefined_variable(name))
    }

    fn lookup_function(&self, frame: usize, name: &str) -> RunResult<Rc<FunctionDef>> {
        let mut idx = Some(frame);
        while let Some(i) = idx {
            if let Some(Some(def)) = self.frames[i].own_function(name) {
                return Ok(def);
            }
            idx = self.frames[i].parent;
        }
        Err(RuntimeError::undefined_function(name))
    }

    /// Collects every user function visible from `start`, climbing the
    /// parent chain from the innermost scope to the global one. Walked
    /// root-first so that, on a name collision between nested scopes,
    /// the outermost declaration wins -- the same tie-break the
    /// reference interpreter gets from inserting into a `std::map` in
    /// outer-to-inner order and letting the first insert stick.
    fn visible_functions(&self, start: Option<usize>) -> Vec<(String, Option<Rc<FunctionDef>>)> {
        let mut chain = Vec::new();
        let mut idx = start;
        while let Some(i) = idx {
            chain.push(i);
            idx = self.frames[i].parent;
        }
        chain.reverse();

        let mut seen = rustc_hash::FxHashSet::default();
        let mut out = Vec::new();
        for i in chain {
            for (name, def) in self.frames[i].functions() {
                if seen.insert(name.clone()) {
                    out.push((name.clone(), def.clone()));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use microc_util::BufferSink;

    fn run_source(src: &str) -> RunResult<()> {
        let handler = Handler::new(Box::new(BufferSink::new()));
        let tokens = microc_lex::tokenize(src);
        let program = microc_par::parse(&tokens, &handler).expect("source must parse");
        let mut interp = Interpreter::new(&handler);
        interp.run(&program)
    }

    fn run_and_capture(src: &str) -> String {
        let sink = Box::new(BufferSink::new());
        let handler = Handler::new(sink);
        let tokens = microc_lex::tokenize(src);
        let program = microc_par::parse(&tokens, &handler).expect("source must parse");
        let mut interp = Interpreter::new(&handler);
        let _ = interp.run(&program);
        handler.diagnostics().iter().map(|d| d.message.clone()).collect::<Vec<_>>().join(";")
    }

    #[test]
    fn collatz_reaches_expected_step_count() {
        let src = r#"
        {
            int steps = 0;
            int n = 27;
            while (n != 1) {
                if (n % 2 == 0) {
                    n = n / 2;
                } else {
                    n = 3 * n + 1;
                }
                steps = steps + 1;
            }
            print(steps);
        }
        "#;
        assert!(run_source(src).is_ok());
    }

    #[test]
    fn fibonacci_recursive_function_call() {
        let src = r#"
        {
            int fib(int n) {
                if (n <= 1) {
                    return n;
                }
                return fib(n - 1) + fib(n - 2);
            }
            print(fib(3));
        }
        "#;
        assert!(run_source(src).is_ok());
    }

    #[test]
    fn mixed_type_promotion_yields_float() {
        let handler = Handler::new(Box::new(BufferSink::new()));
        let program = microc_par::parse(&microc_lex::tokenize("{ float x = 1 + 0.5; }"), &handler).unwrap();
        let mut interp = Interpreter::new(&handler);
        interp.run(&program).unwrap();
    }

    #[test]
    fn logical_operators_do_not_short_circuit() {
        // Both sides are evaluated regardless of the left operand's value;
        // this only checks that a false-short-circuit-triggering left side
        // does not prevent evaluating a right side that itself errors.
        let src = "{ int x = 0; int y = (x != 0) && (1 / x == 0); }";
        let output = run_and_capture(src);
        assert!(output.contains("division by zero"));
    }

    #[test]
    fn callee_cannot_see_caller_locals() {
        let src = r#"
        {
            int leak() {
                return secret;
            }
            int secret = 5;
            leak();
        }
        "#;
        let output = run_and_capture(src);
        assert!(output.contains("undefined variable 'secret'"));
    }

    #[test]
    fn break_exits_only_innermost_loop() {
        let src = r#"
        {
            int count = 0;
            int i = 0;
            while (i < 3) {
                int j = 0;
                while (j < 3) {
                    if (j == 1) {
                        break;
                    }
                    count = count + 1;
                    j = j + 1;
                }
                i = i + 1;
            }
            print(count);
        }
        "#;
        assert!(run_source(src).is_ok());
    }

    #[test]
    fn redeclaring_a_builtin_name_is_an_error() {
        let output = run_and_capture("{ int print(int x) { return x; } }");
        assert!(output.contains("already declared"));
    }

    #[test]
    fn recursion_past_the_limit_is_a_runtime_error() {
        let src = r#"
        {
            int deep(int n) {
                return deep(n + 1);
            }
            deep(0);
        }
        "#;
        let output = run_and_capture(src);
        assert!(output.contains("recursion"));
    }

    #[test]
    fn send_bool_without_a_radio_is_a_runtime_error() {
        let output = run_and_capture("{ send_bool(1, 1); }");
        assert!(output.contains("only available"));
    }
}
