/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use super::{PieceKind, Square};

/// Upper bound on the number of pseudo-legal moves in any position.
pub const MAX_MOVES: usize = 256;

/// A stack-allocated list of up to [`MAX_MOVES`] moves.
pub type MoveList = arrayvec::ArrayVec<Move, MAX_MOVES>;

/// The four kinds of moves the make/unmake machinery distinguishes.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[repr(u16)]
pub enum MoveKind {
    Normal = 0,
    Promotion = 1,
    EnPassant = 2,
    Castling = 3,
}

/// A move, packed into 16 bits:
///
/// ```text
///     00     00     000000 000000
///     |      |        |      |
///     |      |        |      +- Source square
///     |      |        +- Target square
///     |      +- Kind (normal / promotion / en passant / castling)
///     +- Promotion piece minus Knight
/// ```
///
/// The all-zero value is [`Move::NONE`] and is never produced by the
/// move generator (a1a1 is not a chess move).
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Move(u16);

impl Move {
    const TO_BITS: u16 = 6;
    const KIND_BITS: u16 = 12;
    const PROMO_BITS: u16 = 14;
    const SQUARE_MASK: u16 = 0b11_1111;

    /// The distinguished "no move" value.
    pub const NONE: Self = Self(0);

    /// Creates a non-promotion [`Move`].
    #[inline(always)]
    pub const fn new(from: Square, to: Square, kind: MoveKind) -> Self {
        Self(from.inner() as u16 | (to.inner() as u16) << Self::TO_BITS | (kind as u16) << Self::KIND_BITS)
    }

    /// Creates a promotion [`Move`] to the given piece kind.
    #[inline(always)]
    pub const fn promotion(from: Square, to: Square, promo: PieceKind) -> Self {
        Self(
            from.inner() as u16
                | (to.inner() as u16) << Self::TO_BITS
                | (MoveKind::Promotion as u16) << Self::KIND_BITS
                | (promo as u16 - PieceKind::Knight as u16) << Self::PROMO_BITS,
        )
    }

    /// Returns `true` if this is [`Move::NONE`].
    #[inline(always)]
    pub const fn is_none(&self) -> bool {
        self.0 == 0
    }

    /// Raw bits of this move.
    #[inline(always)]
    pub const fn inner(&self) -> u16 {
        self.0
    }

    /// Rebuilds a move from raw bits, e.g. out of a transposition table slot.
    #[inline(always)]
    pub const fn from_raw(bits: u16) -> Self {
        Self(bits)
    }

    /// Source square.
    #[inline(always)]
    pub const fn from(&self) -> Square {
        Square((self.0 & Self::SQUARE_MASK) as u8)
    }

    /// Target square.
    #[inline(always)]
    pub const fn to(&self) -> Square {
        Square((self.0 >> Self::TO_BITS & Self::SQUARE_MASK) as u8)
    }

    /// Kind of this move.
    #[inline(always)]
    pub const fn kind(&self) -> MoveKind {
        match self.0 >> Self::KIND_BITS & 0b11 {
            0 => MoveKind::Normal,
            1 => MoveKind::Promotion,
            2 => MoveKind::EnPassant,
            _ => MoveKind::Castling,
        }
    }

    /// The piece a promotion move promotes to.
    ///
    /// Only meaningful when [`Move::kind`] is [`MoveKind::Promotion`].
    #[inline(always)]
    pub const fn promoted_kind(&self) -> PieceKind {
        PieceKind::from_index_unchecked((self.0 >> Self::PROMO_BITS & 0b11) as usize + 1)
    }

    #[inline(always)]
    pub const fn is_promotion(&self) -> bool {
        matches!(self.kind(), MoveKind::Promotion)
    }

    #[inline(always)]
    pub const fn is_en_passant(&self) -> bool {
        matches!(self.kind(), MoveKind::EnPassant)
    }

    #[inline(always)]
    pub const fn is_castling(&self) -> bool {
        matches!(self.kind(), MoveKind::Castling)
    }
}

impl fmt::Display for Move {
    /// Long algebraic notation: `e2e4`, `e7e8q`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from(), self.to())?;
        if self.is_promotion() {
            write!(f, "{}", self.promoted_kind().to_uci())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self} ({:?})", self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_packing() {
        let m = Move::new(Square::E2, Square::E4, MoveKind::Normal);
        assert_eq!(m.from(), Square::E2);
        assert_eq!(m.to(), Square::E4);
        assert_eq!(m.kind(), MoveKind::Normal);
        assert_eq!(m.to_string(), "e2e4");
        assert!(!m.is_none());

        let castle = Move::new(Square::E1, Square::G1, MoveKind::Castling);
        assert_eq!(castle.kind(), MoveKind::Castling);
        assert_eq!(castle.to_string(), "e1g1");

        let ep = Move::new(Square::E5, Square::D6, MoveKind::EnPassant);
        assert!(ep.is_en_passant());
    }

    #[test]
    fn test_promotions() {
        for promo in PieceKind::promotions() {
            let m = Move::promotion(Square::E7, Square::E8, promo);
            assert_eq!(m.from(), Square::E7);
            assert_eq!(m.to(), Square::E8);
            assert!(m.is_promotion());
            assert_eq!(m.promoted_kind(), promo);
        }

        let q = Move::promotion(Square::A7, Square::A8, PieceKind::Queen);
        assert_eq!(q.to_string(), "a7a8q");
    }

    #[test]
    fn test_none_move() {
        assert!(Move::NONE.is_none());
        assert_eq!(Move::default(), Move::NONE);
    }
}
