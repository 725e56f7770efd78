//! AST node definitions.
//!
//! Each node owns its children by value (boxed where recursion requires
//! it); there is no separate arena or manual free, destruction is plain
//! `Drop`.

use microc_lex::TokenKind;

/// The root of a parsed program, and the body of every block-bearing
/// construct (function bodies, loop bodies, `if` arms).
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NumberKind {
    Integer,
    Float,
}

impl From<TokenKind> for NumberKind {
    fn from(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Integer => NumberKind::Integer,
            TokenKind::Float => NumberKind::Float,
            other => panic!("not a number token kind: {other:?}"),
        }
    }
}

/// `int` or `float` as written in a declaration or parameter list.
/// `void` is only legal as a function return type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeName {
    Int,
    Float,
    Void,
}

impl TypeName {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "int" => Some(TypeName::Int),
            "float" => Some(TypeName::Float),
            "void" => Some(TypeName::Void),
            _ => None,
        }
    }
}

/// A value-producing expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number { lexeme: String, kind: NumberKind },
    VarAccess { name: String },
    Binary { left: Box<Expr>, op: String, right: Box<Expr> },
    /// Reserved: see the design notes on the leading-`!` extension.
    Unary { op: String, operand: Box<Expr> },
    Call { name: String, args: Vec<Expr> },
    /// Sentinel for an empty parenthesized expression: a zero-arg call's
    /// sole argument, or a deliberately-empty slot.
    Empty,
}

/// A control-flow-producing statement node.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    VarDecl { name: String, ty: TypeName, init: Expr },
    Assign { name: String, value: Expr },
    FunctionDecl {
        return_type: TypeName,
        name: String,
        params: Vec<String>,
        param_types: Vec<TypeName>,
        body: Block,
    },
    /// A function call used for its side effects; the value is discarded.
    Call(Expr),
    If { conditions: Vec<Expr>, bodies: Vec<Block> },
    While { condition: Expr, body: Block },
    For { init: Box<Stmt>, condition: Expr, increment: Box<Stmt>, body: Block },
    Break,
    Continue,
    Return(Option<Expr>),
}

impl Expr {
    /// Canonical pretty form, used by tests and diagnostics; not
    /// consulted by the interpreter.
    pub fn to_string_canonical(&self) -> String {
        match self {
            Expr::Number { lexeme, .. } => lexeme.clone(),
            Expr::VarAccess { name } => name.clone(),
            Expr::Binary { left, op, right } => {
                format!("({} {} {})", left.to_string_canonical(), op, right.to_string_canonical())
            }
            Expr::Unary { op, operand } => format!("({}{})", op, operand.to_string_canonical()),
            Expr::Call { name, args } => {
                let args = args.iter().map(Expr::to_string_canonical).collect::<Vec<_>>().join(", ");
                format!("{name}({args})")
            }
            Expr::Empty => String::new(),
        }
    }

    /// Renames every occurrence of `old` to `new` within this expression.
    /// Reserved for future optimization/obfuscation passes; must never
    /// panic on any variant.
    pub fn rename_identifier(&mut self, old: &str, new: &str) {
        match self {
            Expr::VarAccess { name } if name == old => *name = new.to_string(),
            Expr::Binary { left, right, .. } => {
                left.rename_identifier(old, new);
                right.rename_identifier(old, new);
            }
            Expr::Unary { operand, .. } => operand.rename_identifier(old, new),
            Expr::Call { args, .. } => {
                for arg in args {
                    arg.rename_identifier(old, new);
                }
            }
            _ => {}
        }
    }
}

impl Block {
    pub fn rename_identifier(&mut self, old: &str, new: &str) {
        for stmt in &mut self.statements {
            stmt.rename_identifier(old, new);
        }
    }
}

impl Stmt {
    pub fn rename_identifier(&mut self, old: &str, new: &str) {
        match self {
            Stmt::VarDecl { name, init, .. } => {
                if name == old {
                    *name = new.to_string();
                }
                init.rename_identifier(old, new);
            }
            Stmt::Assign { name, value } => {
                if name == old {
                    *name = new.to_string();
                }
                value.rename_identifier(old, new);
            }
            Stmt::FunctionDecl { name, params, body, .. } => {
                if name == old {
                    *name = new.to_string();
                }
                for param in params {
                    if param == old {
                        *param = new.to_string();
                    }
                }
                body.rename_identifier(old, new);
            }
            Stmt::Call(expr) => expr.rename_identifier(old, new),
            Stmt::If { conditions, bodies } => {
                for cond in conditions {
                    cond.rename_identifier(old, new);
                }
                for body in bodies {
                    body.rename_identifier(old, new);
                }
            }
            Stmt::While { condition, body } => {
                condition.rename_identifier(old, new);
                body.rename_identifier(old, new);
            }
            Stmt::For { init, condition, increment, body } => {
                init.rename_identifier(old, new);
                condition.rename_identifier(old, new);
                increment.rename_identifier(old, new);
                body.rename_identifier(old, new);
            }
            Stmt::Return(Some(expr)) => expr.rename_identifier(old, new),
            Stmt::Break | Stmt::Continue | Stmt::Return(None) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_expr_canonical_string() {
        let expr = Expr::Binary {
            left: Box::new(Expr::Number { lexeme: "1".into(), kind: NumberKind::Integer }),
            op: "+".into(),
            right: Box::new(Expr::VarAccess { name: "x".into() }),
        };
        assert_eq!(expr.to_string_canonical(), "(1 + x)");
    }

    #[test]
    fn rename_identifier_covers_every_variant_without_panicking() {
        let mut block = Block {
            statements: vec![
                Stmt::VarDecl { name: "x".into(), ty: TypeName::Int, init: Expr::VarAccess { name: "x".into() } },
                Stmt::Break,
                Stmt::Continue,
                Stmt::Return(None),
                Stmt::Return(Some(Expr::Empty)),
            ],
        };
        block.rename_identifier("x", "y");
        assert_eq!(block.statements[0], Stmt::VarDecl {
            name: "y".into(),
            ty: TypeName::Int,
            init: Expr::VarAccess { name: "y".into() },
        });
    }
}
