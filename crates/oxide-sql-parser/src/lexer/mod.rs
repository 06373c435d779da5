//! SQL Lexer
//!
//! Converts SQL source text into borrowed tokens and exposes them to the
//! parser through the [`TokenSource`] cursor trait.

mod cursor;
mod span;
mod token;
mod tokenizer;

pub use cursor::{TokenCursor, TokenSource};
pub use span::{Location, Span};
pub use token::{Keyword, Token, TokenKind};
pub use tokenizer::Lexer;
