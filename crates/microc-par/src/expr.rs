//! Expression parsing: precedence climbing over a flattened operand/operator
//! list, not classic Pratt parsing. A leading scan at parenthesis depth 0
//! splits the token slice into high-level operands (numbers, variable
//! accesses, calls, and parenthesized sub-expressions, each recursively
//! parsed) and the operators between them; the result is folded from
//! highest to lowest precedence, left-associatively.

use microc_lex::{Token, TokenKind};
use microc_util::{Handler, Level};

use crate::ast::{Expr, NumberKind};

/// Precedence table. Higher binds tighter. Mirrors the reference
/// tokenizer's operator-precedence ordering; `!` sits above everything
/// else since it is the only unary operator in the grammar.
fn precedence(op: &str) -> i32 {
    match op {
        "!" => 10,
        "*" | "/" | "%" => 8,
        "+" | "-" => 6,
        ">" | "<" | "<=" | ">=" => 4,
        "==" | "!=" => 3,
        "&&" => 2,
        "||" => 1,
        _ => -1,
    }
}

pub type ExprResult = Result<Expr, ()>;

/// Entry point. `can_be_empty` is true only for a function call's
/// argument-list slot, where `f()` must parse to a single `Empty` arg.
pub fn parse_expression(handler: &Handler, tokens: &[Token]) -> ExprResult {
    parse_expression_inner(handler, tokens, false)
}

pub fn parse_expression_allow_empty(handler: &Handler, tokens: &[Token]) -> ExprResult {
    parse_expression_inner(handler, tokens, true)
}

fn syntax_error(handler: &Handler, message: impl Into<String>) {
    handler.handle_error(Level::SyntaxError, microc_util::Span::DUMMY, message);
}

fn parse_expression_inner(handler: &Handler, tokens: &[Token], can_be_empty: bool) -> ExprResult {
    if tokens.is_empty() {
        if can_be_empty {
            return Ok(Expr::Empty);
        }
        syntax_error(handler, "empty (sub)expression");
        return Err(());
    }

    if tokens.len() == 1 {
        return parse_atom(handler, &tokens[0]);
    }

    // Leading unary `!`: no left-hand operand precedes it in this slice.
    if tokens[0].kind == TokenKind::Operator && tokens[0].lexeme == "!" {
        let operand = parse_expression_inner(handler, &tokens[1..], false)?;
        return Ok(Expr::Unary { op: "!".to_string(), operand: Box::new(operand) });
    }

    let mut operators: Vec<String> = Vec::new();
    let mut operands: Vec<Expr> = Vec::new();
    let mut paren_depth: i32 = 0;
    let mut pending: Vec<Token> = Vec::new();

    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];

        if token.kind == TokenKind::LParen {
            if paren_depth != 0 {
                pending.push(token.clone());
            }
            paren_depth += 1;
        } else if token.kind == TokenKind::RParen {
            if paren_depth != 0 {
                pending.push(token.clone());
            }
            paren_depth -= 1;
        } else if paren_depth == 0
            && token.kind == TokenKind::Identifier
            && i + 1 < tokens.len()
            && tokens[i + 1].kind == TokenKind::LParen
        {
            let (call, next_i) = parse_call_at(handler, tokens, i)?;
            operands.push(call);
            i = next_i;
            if i < tokens.len() && tokens[i].kind == TokenKind::Operator {
                operators.push(tokens[i].lexeme.clone());
                i += 1;
            }
            continue;
        } else if paren_depth == 0 && token.kind == TokenKind::Operator {
            operators.push(token.lexeme.clone());
            let sub = parse_expression_inner(handler, &pending, false)?;
            operands.push(sub);
            pending.clear();
        } else {
            pending.push(token.clone());
        }

        i += 1;
    }

    if !pending.is_empty() {
        if pending.len() == tokens.len() {
            syntax_error(handler, format!("unexpected token '{}'", pending[0].lexeme));
            return Err(());
        }
        let sub = parse_expression_inner(handler, &pending, false)?;
        operands.push(sub);
    }

    if operands.is_empty() && operators.is_empty() && can_be_empty {
        return Ok(Expr::Empty);
    }

    if operators.len() != operands.len().saturating_sub(1) || operands.is_empty() {
        syntax_error(handler, "unexpected number of operators");
        return Err(());
    }

    reduce(handler, operands, operators)
}

/// Repeatedly folds the operator of highest precedence (first occurrence
/// wins ties, giving left-associativity) into a `Binary` node until one
/// operand remains.
fn reduce(handler: &Handler, mut operands: Vec<Expr>, mut operators: Vec<String>) -> ExprResult {
    while !operators.is_empty() {
        let mut best_idx = 0;
        let mut best_prec = 0;
        for (idx, op) in operators.iter().enumerate() {
            let prec = precedence(op);
            if prec <= 0 {
                syntax_error(handler, format!("unexpected operator '{op}'"));
                return Err(());
            }
            if prec > best_prec {
                best_prec = prec;
                best_idx = idx;
            }
        }

        let op = operators.remove(best_idx);
        let right = operands.remove(best_idx + 1);
        let left = operands.remove(best_idx);
        operands.insert(best_idx, Expr::Binary { left: Box::new(left), op, right: Box::new(right) });
    }

    Ok(operands.into_iter().next().expect("operands non-empty by construction"))
}

fn parse_atom(handler: &Handler, token: &Token) -> ExprResult {
    match token.kind {
        TokenKind::Integer => Ok(Expr::Number { lexeme: token.lexeme.clone(), kind: NumberKind::Integer }),
        TokenKind::Float => Ok(Expr::Number { lexeme: token.lexeme.clone(), kind: NumberKind::Float }),
        TokenKind::Identifier => Ok(Expr::VarAccess { name: token.lexeme.clone() }),
        _ => {
            syntax_error(handler, format!("unexpected token '{}'", token.lexeme));
            Err(())
        }
    }
}

/// Parses a function call whose name token sits at `tokens[start]`,
/// splitting arguments on top-level commas within the call's own
/// parentheses. Returns the call node and the index just past the
/// closing `)`.
fn parse_call_at(handler: &Handler, tokens: &[Token], start: usize) -> Result<(Expr, usize), ()> {
    let name = tokens[start].lexeme.clone();
    let mut i = start + 2; // skip name and '('
    let mut depth = 1;
    let mut current_arg: Vec<Token> = Vec::new();
    let mut args: Vec<Expr> = Vec::new();

    while i < tokens.len() {
        let token = &tokens[i];
        match token.kind {
            TokenKind::LParen => {
                if depth != 0 {
                    current_arg.push(token.clone());
                }
                depth += 1;
            }
            TokenKind::RParen => {
                depth -= 1;
                if depth != 0 {
                    current_arg.push(token.clone());
                }
            }
            TokenKind::Comma if depth == 1 => {
                let arg = parse_expression_inner(handler, &current_arg, false)?;
                args.push(arg);
                current_arg.clear();
            }
            _ => current_arg.push(token.clone()),
        }

        if depth == 0 {
            let arg = parse_expression_inner(handler, &current_arg, true)?;
            args.push(arg);
            return Ok((Expr::Call { name, args }, i + 1));
        }

        i += 1;
    }

    syntax_error(handler, format!("unterminated call to '{name}'"));
    Err(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use microc_lex::tokenize;
    use microc_util::BufferSink;

    fn parse(src: &str) -> ExprResult {
        let handler = Handler::new(Box::new(BufferSink::new()));
        let tokens = tokenize(src);
        parse_expression(&handler, &tokens)
    }

    #[test]
    fn single_number() {
        assert_eq!(parse("5").unwrap().to_string_canonical(), "5");
    }

    #[test]
    fn left_associative_same_precedence() {
        assert_eq!(parse("1 - 2 - 3").unwrap().to_string_canonical(), "((1 - 2) - 3)");
    }

    #[test]
    fn precedence_climbs_correctly() {
        assert_eq!(parse("1 + 2 * 3").unwrap().to_string_canonical(), "(1 + (2 * 3))");
    }

    #[test]
    fn parenthesized_subexpression() {
        assert_eq!(parse("(1 + 2) * 3").unwrap().to_string_canonical(), "((1 + 2) * 3)");
    }

    #[test]
    fn nested_function_calls() {
        let expr = parse("foo(5, 8 - foo(5, 8))").unwrap();
        assert_eq!(expr.to_string_canonical(), "foo(5, (8 - foo(5, 8)))");
    }

    #[test]
    fn zero_arg_call_is_single_empty_argument() {
        let handler = Handler::new(Box::new(BufferSink::new()));
        let tokens = tokenize("f()");
        let expr = parse_expression(&handler, &tokens).unwrap();
        match expr {
            Expr::Call { name, args } => {
                assert_eq!(name, "f");
                assert_eq!(args, vec![Expr::Empty]);
            }
            other => panic!("expected call, got {other:?}"),
        }
    }
}
