//! Tokenizes microc source text. See [`tokenize`] for the entry point.

mod lexer;
mod token;

pub use lexer::tokenize;
pub use token::{Token, TokenKind, DOUBLE_CHAR_OPERATORS, KEYWORDS, SINGLE_CHAR_OPERATORS};
