//! Pratt expression parser for operator precedence.

use crate::ast::{BinaryOp, UnaryOp};
use crate::lexer::{Keyword, TokenKind};

/// Binding power of prefix `NOT`.
pub const NOT_BP: u8 = 5;

/// Right binding power of the IN/LIKE/BETWEEN/IS level; operands of those
/// constructs are parsed at this power so `AND` ends them.
pub const COMPARISON_BP: u8 = 8;

/// Binding power of unary `-`, `+` and `~`.
pub const UNARY_BP: u8 = 19;

/// Binding power of postfix `COLLATE` and `::`.
pub const POSTFIX_BP: u8 = 21;

/// Parsing at this power yields a single primary or prefix expression.
pub const PRIMARY_BP: u8 = POSTFIX_BP + 1;

/// Returns the prefix binding power for a token.
///
/// Returns `None` if the token is not a prefix operator.
#[must_use]
pub const fn prefix_binding_power(kind: TokenKind) -> Option<u8> {
    match kind {
        TokenKind::Minus | TokenKind::Plus | TokenKind::BitNot => Some(UNARY_BP),
        TokenKind::Keyword(Keyword::Not) => Some(NOT_BP),
        _ => None,
    }
}

/// Returns the infix binding power for the current token, given the token
/// after it.
///
/// Returns `(left_bp, right_bp)` where:
/// - Higher binding power = binds tighter
/// - Left associative: left_bp < right_bp
///
/// `NOT` is infix only when it negates IN, LIKE, GLOB or BETWEEN.
#[must_use]
pub const fn infix_binding_power(kind: TokenKind, next: Option<TokenKind>) -> Option<(u8, u8)> {
    match kind {
        // Logical OR (lowest precedence)
        TokenKind::Keyword(Keyword::Or) => Some((1, 2)),

        // Logical AND
        TokenKind::Keyword(Keyword::And) => Some((3, 4)),

        // Equality and the keyword comparisons
        TokenKind::Eq
        | TokenKind::NotEq
        | TokenKind::Keyword(
            Keyword::Is | Keyword::In | Keyword::Between | Keyword::Like | Keyword::Glob,
        ) => Some((7, COMPARISON_BP)),

        TokenKind::Keyword(Keyword::Not) => match next {
            Some(TokenKind::Keyword(
                Keyword::In | Keyword::Between | Keyword::Like | Keyword::Glob,
            )) => Some((7, COMPARISON_BP)),
            _ => None,
        },

        // String concatenation
        TokenKind::Concat => Some((9, 10)),

        // Bitwise operators
        TokenKind::BitOr
        | TokenKind::BitAnd
        | TokenKind::BitXor
        | TokenKind::LeftShift
        | TokenKind::RightShift => Some((11, 12)),

        // Relational operators
        TokenKind::Lt | TokenKind::LtEq | TokenKind::Gt | TokenKind::GtEq => Some((13, 14)),

        // Additive
        TokenKind::Plus | TokenKind::Minus => Some((15, 16)),

        // Multiplicative
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Some((17, 18)),

        _ => None,
    }
}

/// Returns the postfix binding power for a token.
///
/// Returns `None` if the token is not a postfix operator.
#[must_use]
pub const fn postfix_binding_power(kind: TokenKind) -> Option<u8> {
    match kind {
        TokenKind::Keyword(Keyword::Collate) | TokenKind::DoubleColon => Some(POSTFIX_BP),
        _ => None,
    }
}

/// Converts a token to a binary operator.
#[must_use]
pub const fn token_to_binary_op(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Plus => Some(BinaryOp::Add),
        TokenKind::Minus => Some(BinaryOp::Sub),
        TokenKind::Star => Some(BinaryOp::Mul),
        TokenKind::Slash => Some(BinaryOp::Div),
        TokenKind::Percent => Some(BinaryOp::Mod),
        TokenKind::Eq => Some(BinaryOp::Eq),
        TokenKind::NotEq => Some(BinaryOp::NotEq),
        TokenKind::Lt => Some(BinaryOp::Lt),
        TokenKind::LtEq => Some(BinaryOp::LtEq),
        TokenKind::Gt => Some(BinaryOp::Gt),
        TokenKind::GtEq => Some(BinaryOp::GtEq),
        TokenKind::Keyword(Keyword::And) => Some(BinaryOp::And),
        TokenKind::Keyword(Keyword::Or) => Some(BinaryOp::Or),
        TokenKind::Keyword(Keyword::Is) => Some(BinaryOp::Is),
        TokenKind::Keyword(Keyword::Like) => Some(BinaryOp::Like),
        TokenKind::Keyword(Keyword::Glob) => Some(BinaryOp::Glob),
        TokenKind::Concat => Some(BinaryOp::Concat),
        TokenKind::BitAnd => Some(BinaryOp::BitAnd),
        TokenKind::BitOr => Some(BinaryOp::BitOr),
        TokenKind::BitXor => Some(BinaryOp::BitXor),
        TokenKind::LeftShift => Some(BinaryOp::LeftShift),
        TokenKind::RightShift => Some(BinaryOp::RightShift),
        _ => None,
    }
}

/// Converts a token to a unary operator.
#[must_use]
pub const fn token_to_unary_op(kind: TokenKind) -> Option<UnaryOp> {
    match kind {
        TokenKind::Minus => Some(UnaryOp::Neg),
        TokenKind::Plus => Some(UnaryOp::Plus),
        TokenKind::Keyword(Keyword::Not) => Some(UnaryOp::Not),
        TokenKind::BitNot => Some(UnaryOp::BitNot),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn left(kind: TokenKind) -> u8 {
        infix_binding_power(kind, None).unwrap().0
    }

    #[test]
    fn test_precedence_order() {
        let or = left(TokenKind::Keyword(Keyword::Or));
        let and = left(TokenKind::Keyword(Keyword::And));
        let eq = left(TokenKind::Eq);
        let concat = left(TokenKind::Concat);
        let bit = left(TokenKind::BitOr);
        let lt = left(TokenKind::Lt);
        let add = left(TokenKind::Plus);
        let mul = left(TokenKind::Star);

        assert!(or < and);
        assert!(and < NOT_BP && NOT_BP < eq);
        assert!(eq < concat);
        assert!(concat < bit);
        assert!(bit < lt);
        assert!(lt < add);
        assert!(add < mul);
        assert!(mul < UNARY_BP);
        assert!(UNARY_BP < POSTFIX_BP);
    }

    #[test]
    fn test_keyword_comparisons_share_equality_level() {
        let eq = infix_binding_power(TokenKind::Eq, None);
        for kw in [Keyword::In, Keyword::Like, Keyword::Glob, Keyword::Between, Keyword::Is] {
            assert_eq!(infix_binding_power(TokenKind::Keyword(kw), None), eq);
        }
    }

    #[test]
    fn test_not_is_infix_only_before_comparisons() {
        let not = TokenKind::Keyword(Keyword::Not);
        assert!(infix_binding_power(not, Some(TokenKind::Keyword(Keyword::In))).is_some());
        assert!(infix_binding_power(not, Some(TokenKind::Keyword(Keyword::Null))).is_none());
        assert!(infix_binding_power(not, None).is_none());
    }

    #[test]
    fn test_left_associative() {
        for kind in [TokenKind::Plus, TokenKind::Star, TokenKind::Keyword(Keyword::And)] {
            let (l, r) = infix_binding_power(kind, None).unwrap();
            assert!(l < r);
        }
    }

    #[test]
    fn test_operator_mapping() {
        assert_eq!(token_to_binary_op(TokenKind::BitXor), Some(BinaryOp::BitXor));
        assert_eq!(token_to_binary_op(TokenKind::Comma), None);
        assert_eq!(token_to_unary_op(TokenKind::BitNot), Some(UnaryOp::BitNot));
        assert_eq!(prefix_binding_power(TokenKind::Minus), Some(UNARY_BP));
        assert_eq!(
            postfix_binding_power(TokenKind::Keyword(Keyword::Collate)),
            Some(POSTFIX_BP)
        );
    }
}
