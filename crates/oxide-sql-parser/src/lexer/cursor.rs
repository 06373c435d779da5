//! Token cursor consumed by the parser.

use super::Token;

/// A positioned stream of tokens.
///
/// The parser only ever talks to its input through this trait, so any
/// tokenizer able to produce [`Token`]s can drive it. Positions are opaque
/// indices that may be saved and restored for backtracking.
pub trait TokenSource<'s> {
    /// Returns the token under the cursor, or `None` at the end of input.
    fn current(&self) -> Option<Token<'s>>;

    /// Returns the token `n` places after the current one.
    fn peek(&self, n: usize) -> Option<Token<'s>>;

    /// Moves past the current token and returns it.
    fn advance(&mut self) -> Option<Token<'s>>;

    /// Returns true once every token has been consumed.
    fn at_end(&self) -> bool {
        self.current().is_none()
    }

    /// Returns the current position.
    fn position(&self) -> usize;

    /// Restores a position previously returned by [`position`](Self::position).
    fn set_position(&mut self, pos: usize);
}

/// A [`TokenSource`] over a materialized token vector.
#[derive(Debug, Clone, Default)]
pub struct TokenCursor<'s> {
    tokens: Vec<Token<'s>>,
    pos: usize,
}

impl<'s> TokenCursor<'s> {
    /// Creates a cursor over `tokens`.
    #[must_use]
    pub const fn new(tokens: Vec<Token<'s>>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Number of tokens, consumed or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if the cursor holds no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl<'s> TokenSource<'s> for TokenCursor<'s> {
    fn current(&self) -> Option<Token<'s>> {
        self.tokens.get(self.pos).copied()
    }

    fn peek(&self, n: usize) -> Option<Token<'s>> {
        self.tokens.get(self.pos + n).copied()
    }

    fn advance(&mut self) -> Option<Token<'s>> {
        let token = self.current()?;
        self.pos += 1;
        Some(token)
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.tokens.len());
    }
}

impl<'s, T: TokenSource<'s> + ?Sized> TokenSource<'s> for &mut T {
    fn current(&self) -> Option<Token<'s>> {
        (**self).current()
    }

    fn peek(&self, n: usize) -> Option<Token<'s>> {
        (**self).peek(n)
    }

    fn advance(&mut self) -> Option<Token<'s>> {
        (**self).advance()
    }

    fn at_end(&self) -> bool {
        (**self).at_end()
    }

    fn position(&self) -> usize {
        (**self).position()
    }

    fn set_position(&mut self, pos: usize) {
        (**self).set_position(pos);
    }
}

impl<'s> From<Vec<Token<'s>>> for TokenCursor<'s> {
    fn from(tokens: Vec<Token<'s>>) -> Self {
        Self::new(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{Lexer, TokenKind};

    #[test]
    fn test_cursor_walks_tokens() {
        let mut cursor = TokenCursor::new(Lexer::new("SELECT 1 ,").tokenize());
        assert_eq!(cursor.len(), 3);
        assert!(cursor.current().unwrap().is_keyword());
        assert_eq!(cursor.peek(1).unwrap().kind, TokenKind::Integer);
        cursor.advance();
        cursor.advance();
        assert_eq!(cursor.advance().unwrap().kind, TokenKind::Comma);
        assert!(cursor.at_end());
        assert!(cursor.advance().is_none());
    }

    #[test]
    fn test_cursor_backtracks() {
        let mut cursor = TokenCursor::new(Lexer::new("a b c").tokenize());
        cursor.advance();
        let saved = cursor.position();
        cursor.advance();
        cursor.advance();
        cursor.set_position(saved);
        assert_eq!(cursor.current().unwrap().text, "b");
        cursor.set_position(99);
        assert!(cursor.at_end());
    }
}
