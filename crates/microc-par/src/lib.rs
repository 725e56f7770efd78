//! Parses a token stream into a [`Block`] AST.
//!
//! On the first syntax error the parser reports through the shared
//! [`Handler`] and returns `Err(())`; no partial AST is salvaged. No
//! tokens are consumed after the first error is raised.

pub mod ast;
mod expr;

use microc_lex::{Token, TokenKind};
use microc_util::{Handler, Level};

pub use ast::{Block, Expr, NumberKind, Stmt, TypeName};
pub use expr::parse_expression;

type PResult<T> = Result<T, ()>;

pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    handler: &'a Handler,
}

/// Parses a complete program. The token stream must be wholly wrapped in
/// a top-level `{ ... }`; empty input parses to an empty block.
pub fn parse(tokens: &[Token], handler: &Handler) -> PResult<Block> {
    if tokens.is_empty() {
        return Ok(Block { statements: Vec::new() });
    }

    if tokens[0].kind != TokenKind::LBrace || tokens[tokens.len() - 1].kind != TokenKind::RBrace {
        syntax_error(handler, "program must be enclosed in braces");
        return Err(());
    }

    let mut parser = Parser { tokens, pos: 0, handler };
    let program = parser.parse_block()?;

    if parser.pos < parser.tokens.len() {
        syntax_error(handler, "unexpected tokens after the program");
        return Err(());
    }

    Ok(program)
}

fn syntax_error(handler: &Handler, message: impl Into<String>) {
    handler.handle_error(Level::SyntaxError, microc_util::Span::DUMMY, message);
}

impl<'a> Parser<'a> {
    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn error(&self, message: impl Into<String>) {
        let message = message.into();
        match self.current() {
            Some(token) => syntax_error(self.handler, format!("at token {}: '{}': {message}", self.pos + 1, token.lexeme)),
            None => syntax_error(self.handler, format!("unexpected end of input: {message}")),
        }
    }

    fn eat(&mut self, kind: TokenKind) -> PResult<Token> {
        match self.current() {
            Some(token) if token.kind == kind => {
                let token = token.clone();
                self.pos += 1;
                Ok(token)
            }
            Some(token) => {
                self.error(format!("expected {kind:?}, got {:?}", token.kind));
                Err(())
            }
            None => {
                self.error(format!("expected {kind:?}"));
                Err(())
            }
        }
    }

    fn eat_keyword(&mut self, word: &str) -> PResult<()> {
        match self.current() {
            Some(token) if token.is_keyword(word) => {
                self.pos += 1;
                Ok(())
            }
            _ => {
                self.error(format!("expected keyword '{word}'"));
                Err(())
            }
        }
    }

    fn eat_operator(&mut self, op: &str) -> PResult<()> {
        match self.current() {
            Some(token) if token.is_operator(op) => {
                self.pos += 1;
                Ok(())
            }
            _ => {
                self.error(format!("expected operator '{op}'"));
                Err(())
            }
        }
    }

    /// Reads tokens until a matching `end_kind`, returning the slice with
    /// the terminator included; the cursor advances past it.
    ///
    /// For `RParen`/`RBrace` this is a balanced-delimiter scan: it tracks
    /// both brace and paren depth and forbids cross-nesting like `{(})`.
    /// For `Semicolon` (gathering a var-decl initializer, a `for`
    /// condition, or a `return` expression) it is a plain linear scan with
    /// no depth tracking at all, since no well-formed expression contains
    /// a bare semicolon -- any parens inside it are already balanced by
    /// construction.
    fn gather_tokens_until(&mut self, end_kind: TokenKind) -> PResult<Vec<Token>> {
        if end_kind == TokenKind::Semicolon {
            return self.gather_tokens_until_plain(end_kind);
        }
        self.gather_tokens_until_bracket(end_kind)
    }

    fn gather_tokens_until_plain(&mut self, end_kind: TokenKind) -> PResult<Vec<Token>> {
        let mut gathered = Vec::new();
        while let Some(token) = self.tokens.get(self.pos) {
            gathered.push(token.clone());
            self.pos += 1;
            if token.kind == end_kind {
                return Ok(gathered);
            }
        }
        self.error(format!("unexpected end of input, expected {end_kind:?}"));
        Err(())
    }

    fn gather_tokens_until_bracket(&mut self, end_kind: TokenKind) -> PResult<Vec<Token>> {
        debug_assert!(end_kind == TokenKind::RParen || end_kind == TokenKind::RBrace);

        let mut depth = 1;
        // Tracks the most recently opened bracket type, so a close of the
        // wrong kind (e.g. `}` while the innermost open is `(`) is caught
        // even when it isn't the final, depth-zeroing close.
        let mut last_open = if end_kind == TokenKind::RBrace { TokenKind::LBrace } else { TokenKind::LParen };
        let mut gathered = Vec::new();

        while self.pos < self.tokens.len() && depth != 0 {
            let token = &self.tokens[self.pos];
            let kind = token.kind;

            if kind == TokenKind::LBrace || kind == TokenKind::LParen {
                depth += 1;
            } else if kind == TokenKind::RBrace || kind == TokenKind::RParen {
                depth -= 1;
                if depth == 0 && kind != end_kind {
                    self.error(format!("unexpected '{}'", token.lexeme));
                    return Err(());
                }
                if depth < 0 {
                    self.error(format!("unexpected '{}'", token.lexeme));
                    return Err(());
                }
                if depth == 0 {
                    gathered.push(token.clone());
                    self.pos += 1;
                    return Ok(gathered);
                }
            }

            if (kind == TokenKind::RBrace && last_open == TokenKind::LParen)
                || (kind == TokenKind::RParen && last_open == TokenKind::LBrace)
            {
                self.error(format!("unexpected '{}'", token.lexeme));
                return Err(());
            }

            if kind == TokenKind::LBrace || kind == TokenKind::LParen {
                last_open = kind;
            }

            gathered.push(token.clone());
            self.pos += 1;
        }

        self.error(format!("unexpected end of input, expected {end_kind:?}"));
        Err(())
    }

    fn parse_block(&mut self) -> PResult<Block> {
        tracing::trace!("entering block");
        self.eat(TokenKind::LBrace)?;

        let mut statements = Vec::new();
        while let Some(token) = self.current() {
            if token.kind == TokenKind::RBrace {
                break;
            }
            statements.push(self.parse_statement()?);
        }

        self.eat(TokenKind::RBrace)?;
        tracing::trace!(statements = statements.len(), "exiting block");
        Ok(Block { statements })
    }

    fn parse_statement(&mut self) -> PResult<Stmt> {
        let (kind, lexeme) = match self.current() {
            Some(token) => (token.kind, token.lexeme.clone()),
            None => {
                self.error("expected a statement");
                return Err(());
            }
        };
        tracing::trace!(?kind, lexeme = %lexeme, "parsing statement");

        if kind == TokenKind::Keyword {
            match lexeme.as_str() {
                "int" | "float" | "void" => self.parse_decl_statement(),
                "if" => self.parse_if(),
                "while" => self.parse_while(),
                "for" => self.parse_for(),
                "break" => self.parse_break(),
                "continue" => self.parse_continue(),
                "return" => self.parse_return(),
                other => {
                    self.error(format!("unexpected keyword '{other}'"));
                    Err(())
                }
            }
        } else if kind == TokenKind::Identifier {
            if self.tokens.get(self.pos + 1).map(|t| t.kind) == Some(TokenKind::LParen) {
                let call = self.parse_call_statement()?;
                Ok(Stmt::Call(call))
            } else {
                self.parse_assign_statement(TokenKind::Semicolon)
            }
        } else {
            self.error(format!("unexpected token '{lexeme}'"));
            Err(())
        }
    }

    /// Either a variable declaration (`int x = ...;`) or a function
    /// declaration (`int f(...) { ... }`), disambiguated by whether the
    /// identifier is followed by `(`.
    fn parse_decl_statement(&mut self) -> PResult<Stmt> {
        let is_function = self.tokens.get(self.pos + 1).map(|t| t.kind) == Some(TokenKind::Identifier)
            && self.tokens.get(self.pos + 2).map(|t| t.kind) == Some(TokenKind::LParen);
        if is_function {
            self.parse_function_decl()
        } else {
            self.parse_var_decl()
        }
    }

    fn parse_var_decl(&mut self) -> PResult<Stmt> {
        let type_tok = self.eat(TokenKind::Keyword)?;
        let ty = TypeName::from_keyword(&type_tok.lexeme).filter(|t| *t != TypeName::Void).ok_or_else(|| {
            self.error(format!("'{}' is not a valid variable type", type_tok.lexeme));
        })?;
        let name_tok = self.eat(TokenKind::Identifier)?;
        self.eat_operator("=")?;
        let expr_tokens = self.gather_tokens_until(TokenKind::Semicolon)?;
        let init = parse_expression(self.handler, &expr_tokens[..expr_tokens.len() - 1])?;
        Ok(Stmt::VarDecl { name: name_tok.lexeme, ty, init })
    }

    fn parse_assign_statement(&mut self, terminator: TokenKind) -> PResult<Stmt> {
        let name_tok = self.eat(TokenKind::Identifier)?;
        self.eat_operator("=")?;
        let expr_tokens = self.gather_tokens_until(terminator)?;
        let value = parse_expression(self.handler, &expr_tokens[..expr_tokens.len() - 1])?;
        Ok(Stmt::Assign { name: name_tok.lexeme, value })
    }

    fn parse_call_statement(&mut self) -> PResult<Expr> {
        let name_tok = self.eat(TokenKind::Identifier)?;
        self.eat(TokenKind::LParen)?;
        let arg_tokens = self.gather_tokens_until(TokenKind::RParen)?;
        self.eat(TokenKind::Semicolon)?;

        let mut full = vec![name_tok.clone()];
        full.push(Token::new(TokenKind::LParen, "(", microc_util::Span::DUMMY));
        full.extend(arg_tokens);
        parse_expression(self.handler, &full)
    }

    fn parse_if(&mut self) -> PResult<Stmt> {
        self.eat_keyword("if")?;

        let mut conditions = Vec::new();
        let mut bodies = Vec::new();

        self.eat(TokenKind::LParen)?;
        let cond_tokens = self.gather_tokens_until(TokenKind::RParen)?;
        let condition = parse_expression(self.handler, &cond_tokens[..cond_tokens.len() - 1])?;
        conditions.push(condition);
        bodies.push(self.parse_block()?);

        loop {
            let is_else = self.current().map(|t| t.is_keyword("else")).unwrap_or(false);
            if !is_else {
                break;
            }
            let is_else_if = self.tokens.get(self.pos + 1).map(|t| t.is_keyword("if")).unwrap_or(false);
            if is_else_if {
                self.eat_keyword("else")?;
                self.eat_keyword("if")?;
                self.eat(TokenKind::LParen)?;
                let cond_tokens = self.gather_tokens_until(TokenKind::RParen)?;
                let condition = parse_expression(self.handler, &cond_tokens[..cond_tokens.len() - 1])?;
                conditions.push(condition);
                bodies.push(self.parse_block()?);
            } else {
                self.eat_keyword("else")?;
                bodies.push(self.parse_block()?);
                break;
            }
        }

        Ok(Stmt::If { conditions, bodies })
    }

    fn parse_while(&mut self) -> PResult<Stmt> {
        self.eat_keyword("while")?;
        self.eat(TokenKind::LParen)?;
        let cond_tokens = self.gather_tokens_until(TokenKind::RParen)?;
        let condition = parse_expression(self.handler, &cond_tokens[..cond_tokens.len() - 1])?;
        let body = self.parse_block()?;
        Ok(Stmt::While { condition, body })
    }

    fn parse_for(&mut self) -> PResult<Stmt> {
        self.eat_keyword("for")?;
        self.eat(TokenKind::LParen)?;
        let init = self.parse_var_decl()?;
        let cond_tokens = self.gather_tokens_until(TokenKind::Semicolon)?;
        let condition = parse_expression(self.handler, &cond_tokens[..cond_tokens.len() - 1])?;
        let increment = self.parse_assign_statement(TokenKind::RParen)?;
        let body = self.parse_block()?;
        Ok(Stmt::For { init: Box::new(init), condition, increment: Box::new(increment), body })
    }

    fn parse_break(&mut self) -> PResult<Stmt> {
        self.eat_keyword("break")?;
        self.eat(TokenKind::Semicolon)?;
        Ok(Stmt::Break)
    }

    fn parse_continue(&mut self) -> PResult<Stmt> {
        self.eat_keyword("continue")?;
        self.eat(TokenKind::Semicolon)?;
        Ok(Stmt::Continue)
    }

    fn parse_return(&mut self) -> PResult<Stmt> {
        self.eat_keyword("return")?;
        if self.current().map(|t| t.kind) == Some(TokenKind::Semicolon) {
            self.eat(TokenKind::Semicolon)?;
            return Ok(Stmt::Return(None));
        }
        let expr_tokens = self.gather_tokens_until(TokenKind::Semicolon)?;
        let expr = parse_expression(self.handler, &expr_tokens[..expr_tokens.len() - 1])?;
        Ok(Stmt::Return(Some(expr)))
    }

    fn parse_function_decl(&mut self) -> PResult<Stmt> {
        let type_tok = self.eat(TokenKind::Keyword)?;
        let return_type = TypeName::from_keyword(&type_tok.lexeme).ok_or_else(|| {
            self.error(format!("'{}' is not a valid return type", type_tok.lexeme));
        })?;
        let name_tok = self.eat(TokenKind::Identifier)?;
        self.eat(TokenKind::LParen)?;

        let mut params = Vec::new();
        let mut param_types = Vec::new();

        while self.current().map(|t| t.kind) != Some(TokenKind::RParen) {
            let type_tok = self.eat(TokenKind::Keyword)?;
            let ty = TypeName::from_keyword(&type_tok.lexeme).filter(|t| *t != TypeName::Void).ok_or_else(|| {
                self.error(format!("'{}' is not a valid parameter type", type_tok.lexeme));
            })?;
            let name_tok = self.eat(TokenKind::Identifier)?;
            param_types.push(ty);
            params.push(name_tok.lexeme);

            match self.current().map(|t| t.kind) {
                Some(TokenKind::Comma) => {
                    self.eat(TokenKind::Comma)?;
                }
                Some(TokenKind::RParen) => break,
                _ => {
                    self.error("expected ',' or ')' in parameter list");
                    return Err(());
                }
            }
        }

        self.eat(TokenKind::RParen)?;
        let body = self.parse_block()?;

        Ok(Stmt::FunctionDecl { return_type, name: name_tok.lexeme, params, param_types, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use microc_lex::tokenize;
    use microc_util::BufferSink;

    fn parse_src(src: &str) -> PResult<Block> {
        let handler = Handler::new(Box::new(BufferSink::new()));
        let tokens = tokenize(src);
        parse(&tokens, &handler)
    }

    #[test]
    fn empty_source_parses_to_empty_block() {
        let block = parse_src("").unwrap();
        assert!(block.statements.is_empty());
    }

    #[test]
    fn program_must_be_wrapped_in_braces() {
        assert!(parse_src("int x = 1;").is_err());
    }

    #[test]
    fn var_decl_and_assignment() {
        let block = parse_src("{ int x = 1; x = 2; }").unwrap();
        assert_eq!(block.statements.len(), 2);
        assert!(matches!(block.statements[0], Stmt::VarDecl { .. }));
        assert!(matches!(block.statements[1], Stmt::Assign { .. }));
    }

    #[test]
    fn if_else_if_else_chain() {
        let block = parse_src("{ if (1) { } else if (2) { } else { } }").unwrap();
        match &block.statements[0] {
            Stmt::If { conditions, bodies } => {
                assert_eq!(conditions.len(), 2);
                assert_eq!(bodies.len(), 3);
            }
            other => panic!("expected if, got {other:?}"),
        }
    }

    #[test]
    fn for_loop_shape() {
        let block = parse_src("{ for (int i = 0; i < 3; i = i + 1) { } }").unwrap();
        assert!(matches!(block.statements[0], Stmt::For { .. }));
    }

    #[test]
    fn function_declaration_with_params() {
        let block = parse_src("{ int add(int a, int b) { return a + b; } }").unwrap();
        match &block.statements[0] {
            Stmt::FunctionDecl { name, params, param_types, .. } => {
                assert_eq!(name, "add");
                assert_eq!(params, &["a".to_string(), "b".to_string()]);
                assert_eq!(param_types, &[TypeName::Int, TypeName::Int]);
            }
            other => panic!("expected function decl, got {other:?}"),
        }
    }

    #[test]
    fn cross_nested_brackets_are_a_syntax_error() {
        // `{(})` -- a brace opened, a paren opened inside it, then a
        // closing brace before the paren is closed.
        let handler = Handler::new(Box::new(BufferSink::new()));
        let tokens = tokenize("{(})");
        assert!(parse(&tokens, &handler).is_err());
    }

    #[test]
    fn cross_nesting_inside_a_gathered_condition_is_rejected() {
        // while's condition gathers tokens until `)`; a `{` opened inside
        // it must not be closed by a mismatched `}`.
        assert!(parse_src("{ while (1 { ) } }").is_err());
    }

    #[test]
    fn mismatched_trailing_brace_is_a_syntax_error() {
        assert!(parse_src("{ int x = 1; } }").is_err());
    }

    #[test]
    fn zero_arg_call_statement() {
        let block = parse_src("{ f(); }").unwrap();
        match &block.statements[0] {
            Stmt::Call(Expr::Call { name, args }) => {
                assert_eq!(name, "f");
                assert_eq!(args, &vec![Expr::Empty]);
            }
            other => panic!("expected zero-arg call, got {other:?}"),
        }
    }
}
