//! Binding-power tables for the Pratt expression parser.

use crate::ast::{BinaryOp, UnaryOp};
use crate::lexer::{Keyword, TokenKind};

/// Returns the prefix binding power for a token, or `None` if it cannot
/// start an expression.
#[must_use]
pub fn prefix_binding_power(kind: &TokenKind) -> Option<u8> {
    match kind {
        TokenKind::Minus => Some(15),
        TokenKind::BitNot => Some(15),
        TokenKind::Keyword(Keyword::Not) => Some(3),
        TokenKind::Integer(_)
        | TokenKind::Float(_)
        | TokenKind::String(_)
        | TokenKind::Identifier(_)
        | TokenKind::LeftParen
        | TokenKind::Star => Some(0),
        TokenKind::Keyword(
            Keyword::Null | Keyword::True | Keyword::False | Keyword::Case | Keyword::Cast | Keyword::Coalesce | Keyword::Nullif,
        ) => Some(0),
        _ => None,
    }
}

/// Returns `(left_bp, right_bp)` for an infix operator token, or `None` if
/// the token is not infix. Left-associative operators have `left_bp <
/// right_bp`.
#[must_use]
pub const fn infix_binding_power(kind: &TokenKind) -> Option<(u8, u8)> {
    match kind {
        TokenKind::Keyword(Keyword::Or) => Some((1, 2)),
        TokenKind::Keyword(Keyword::And) => Some((3, 4)),
        TokenKind::Eq
        | TokenKind::NotEq
        | TokenKind::Lt
        | TokenKind::LtEq
        | TokenKind::Gt
        | TokenKind::GtEq => Some((5, 6)),
        TokenKind::Keyword(Keyword::Is | Keyword::In | Keyword::Between | Keyword::Like) => {
            Some((5, 6))
        }
        TokenKind::BitOr => Some((7, 8)),
        TokenKind::BitAnd => Some((9, 10)),
        TokenKind::LeftShift | TokenKind::RightShift => Some((11, 12)),
        TokenKind::Plus | TokenKind::Minus | TokenKind::Concat => Some((13, 14)),
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Some((15, 16)),
        TokenKind::DoubleColon => Some((19, 20)),
        _ => None,
    }
}

/// Converts a token to a binary operator.
#[must_use]
pub const fn token_to_binary_op(kind: &TokenKind) -> Option<BinaryOp> {
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
        TokenKind::Concat => Some(BinaryOp::Concat),
        TokenKind::Keyword(Keyword::Like) => Some(BinaryOp::Like),
        TokenKind::BitAnd => Some(BinaryOp::BitAnd),
        TokenKind::BitOr => Some(BinaryOp::BitOr),
        TokenKind::LeftShift => Some(BinaryOp::LeftShift),
        TokenKind::RightShift => Some(BinaryOp::RightShift),
        _ => None,
    }
}

/// Converts a token to a unary operator.
#[must_use]
pub const fn token_to_unary_op(kind: &TokenKind) -> Option<UnaryOp> {
    match kind {
        TokenKind::Minus => Some(UnaryOp::Neg),
        TokenKind::Keyword(Keyword::Not) => Some(UnaryOp::Not),
        TokenKind::BitNot => Some(UnaryOp::BitNot),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let add = infix_binding_power(&TokenKind::Plus).unwrap();
        let mul = infix_binding_power(&TokenKind::Star).unwrap();
        assert!(mul.0 > add.0);
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let and_bp = infix_binding_power(&TokenKind::Keyword(Keyword::And)).unwrap();
        let or_bp = infix_binding_power(&TokenKind::Keyword(Keyword::Or)).unwrap();
        assert!(and_bp.0 > or_bp.0);
    }

    #[test]
    fn double_colon_cast_binds_tightest() {
        let cast = infix_binding_power(&TokenKind::DoubleColon).unwrap();
        let mul = infix_binding_power(&TokenKind::Star).unwrap();
        assert!(cast.0 > mul.0);
    }

    #[test]
    fn token_to_ops() {
        assert_eq!(token_to_binary_op(&TokenKind::Plus), Some(BinaryOp::Add));
        assert_eq!(token_to_unary_op(&TokenKind::Minus), Some(UnaryOp::Neg));
        assert_eq!(token_to_binary_op(&TokenKind::LeftParen), None);
    }
}
