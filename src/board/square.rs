/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use anyhow::{anyhow, bail, Result};

use super::{Bitboard, Color};

/// A square on a chess board, in little-endian rank-file order: `a1 = 0`, `h8 = 63`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Square(pub(crate) u8);

macro_rules! square_consts {
    ($($name:ident = $index:literal),+ $(,)?) => {
        impl Square {
            $(pub const $name: Self = Self($index);)+
        }
    };
}

#[rustfmt::skip]
square_consts! {
    A1 = 0,  B1 = 1,  C1 = 2,  D1 = 3,  E1 = 4,  F1 = 5,  G1 = 6,  H1 = 7,
    A2 = 8,  B2 = 9,  C2 = 10, D2 = 11, E2 = 12, F2 = 13, G2 = 14, H2 = 15,
    A3 = 16, B3 = 17, C3 = 18, D3 = 19, E3 = 20, F3 = 21, G3 = 22, H3 = 23,
    A4 = 24, B4 = 25, C4 = 26, D4 = 27, E4 = 28, F4 = 29, G4 = 30, H4 = 31,
    A5 = 32, B5 = 33, C5 = 34, D5 = 35, E5 = 36, F5 = 37, G5 = 38, H5 = 39,
    A6 = 40, B6 = 41, C6 = 42, D6 = 43, E6 = 44, F6 = 45, G6 = 46, H6 = 47,
    A7 = 48, B7 = 49, C7 = 50, D7 = 51, E7 = 52, F7 = 53, G7 = 54, H7 = 55,
    A8 = 56, B8 = 57, C8 = 58, D8 = 59, E8 = 60, F8 = 61, G8 = 62, H8 = 63,
}

impl Square {
    /// Number of squares on a chess board.
    pub const COUNT: usize = 64;

    /// Creates a new [`Square`] from a file and rank, both in `0..8`.
    #[inline(always)]
    pub const fn new(file: u8, rank: u8) -> Self {
        Self(rank * 8 + file)
    }

    /// Creates a [`Square`] from an index in `0..64`.
    ///
    /// Only the low 6 bits of `index` are used.
    #[inline(always)]
    pub const fn from_index_unchecked(index: usize) -> Self {
        Self((index & 63) as u8)
    }

    /// Iterator over all 64 squares, `a1` through `h8`.
    #[inline(always)]
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> + ExactSizeIterator {
        (0..Self::COUNT as u8).map(Self)
    }

    /// Inner `u8` of this square.
    #[inline(always)]
    pub const fn inner(&self) -> u8 {
        self.0
    }

    /// Index of this square in `0..64`.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// File of this square, in `0..8` (`0` = the a-file).
    #[inline(always)]
    pub const fn file(&self) -> u8 {
        self.0 % 8
    }

    /// Rank of this square, in `0..8` (`0` = rank 1).
    #[inline(always)]
    pub const fn rank(&self) -> u8 {
        self.0 / 8
    }

    /// A [`Bitboard`] with only this square's bit set.
    #[inline(always)]
    pub const fn bitboard(&self) -> Bitboard {
        Bitboard::from_square(*self)
    }

    /// This square flipped vertically (`a1` <-> `a8`).
    ///
    /// Used to index White-perspective tables for Black pieces.
    #[inline(always)]
    pub const fn flipped_rank(&self) -> Self {
        Self(self.0 ^ 56)
    }

    /// Shifts this square by the given file/rank deltas, if the result stays on the board.
    #[inline(always)]
    pub const fn offset(&self, file_delta: i8, rank_delta: i8) -> Option<Self> {
        let file = self.file() as i8 + file_delta;
        let rank = self.rank() as i8 + rank_delta;
        if file >= 0 && file < 8 && rank >= 0 && rank < 8 {
            Some(Self::new(file as u8, rank as u8))
        } else {
            None
        }
    }

    /// The square one step towards `color`'s opponent.
    ///
    /// Must not be called on the final rank in that direction.
    #[inline(always)]
    pub const fn forward(&self, color: Color) -> Self {
        Self((self.0 as i8 + color.forward()) as u8)
    }

    /// The square one step back towards `color`'s own side.
    ///
    /// Must not be called on the first rank in that direction.
    #[inline(always)]
    pub const fn backward(&self, color: Color) -> Self {
        Self((self.0 as i8 - color.forward()) as u8)
    }

    /// Parses a [`Square`] from UCI notation like `e4`.
    pub fn from_uci(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        let file = chars.next().ok_or_else(|| anyhow!("empty square string"))?;
        let rank = chars
            .next()
            .ok_or_else(|| anyhow!("square {s:?} missing rank"))?;

        if !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) {
            bail!("invalid square {s:?}");
        }

        Ok(Self::new(file as u8 - b'a', rank as u8 - b'1'))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            (b'a' + self.file()) as char,
            (b'1' + self.rank()) as char
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_parts() {
        assert_eq!(Square::A1.index(), 0);
        assert_eq!(Square::H8.index(), 63);
        assert_eq!(Square::E4.file(), 4);
        assert_eq!(Square::E4.rank(), 3);
        assert_eq!(Square::new(4, 3), Square::E4);
    }

    #[test]
    fn test_square_uci() {
        assert_eq!(Square::from_uci("e4").unwrap(), Square::E4);
        assert_eq!(Square::from_uci("a1").unwrap(), Square::A1);
        assert_eq!(Square::E4.to_string(), "e4");
        assert!(Square::from_uci("i9").is_err());
        assert!(Square::from_uci("").is_err());
    }

    #[test]
    fn test_square_offset() {
        assert_eq!(Square::E4.offset(1, 1), Some(Square::F5));
        assert_eq!(Square::A1.offset(-1, 0), None);
        assert_eq!(Square::H8.offset(0, 1), None);
        assert_eq!(Square::D7.flipped_rank(), Square::D2);
    }
}
