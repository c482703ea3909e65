/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use super::{CastlingRights, Color, Piece, Position, Square};

/// Zobrist keys for every hashable feature of a [`Position`].
///
/// Generated once, at compile time, so keys are identical across builds.
static ZOBRIST_TABLE: ZobristTable = ZobristTable::new();

/// A 64-bit XOR-hash identity of a position.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[repr(transparent)]
pub struct ZobristKey(u64);

impl ZobristKey {
    /// Computes the key of `position` from scratch, XOR-folding over every
    /// occupied square, the castling rights, the en passant square, and the
    /// side to move.
    ///
    /// The incrementally-maintained key on the position's state frame must
    /// always equal this.
    pub fn new(position: &Position) -> Self {
        let mut key = Self::default();

        for square in Square::iter() {
            if let Some(piece) = position.piece_at(square) {
                key.hash_piece(piece, square);
            }
        }

        if let Some(ep) = position.ep_square() {
            key.hash_ep_square(ep);
        }

        key.hash_castling_rights(position.castling_rights());
        key.hash_side_to_move(position.side_to_move());

        key
    }

    /// Raw bits of this key.
    #[inline(always)]
    pub const fn inner(&self) -> u64 {
        self.0
    }

    /// Rebuilds a key from raw bits, e.g. out of a transposition table slot.
    #[inline(always)]
    pub const fn from_raw(bits: u64) -> Self {
        Self(bits)
    }

    /// Adds/removes the key for `piece` on `square`.
    #[inline(always)]
    pub fn hash_piece(&mut self, piece: Piece, square: Square) {
        self.0 ^= ZOBRIST_TABLE.pieces[piece.index()][square.index()];
    }

    /// Adds/removes the key for an en passant target square.
    ///
    /// Squares where en passant cannot occur (everything off ranks 3 and 6)
    /// have a zero key, so hashing them is a no-op.
    #[inline(always)]
    pub fn hash_ep_square(&mut self, square: Square) {
        self.0 ^= ZOBRIST_TABLE.ep[square.index()];
    }

    /// Adds/removes the key for a full set of castling rights.
    #[inline(always)]
    pub fn hash_castling_rights(&mut self, rights: CastlingRights) {
        self.0 ^= ZOBRIST_TABLE.castling[rights.index()];
    }

    /// Toggles the side-to-move key.
    ///
    /// Only Black carries a key; hashing White is a no-op, so toggling the
    /// Black key once per move keeps the side bit correct.
    #[inline(always)]
    pub fn hash_side(&mut self) {
        self.0 ^= ZOBRIST_TABLE.side;
    }

    /// Adds/removes the side-to-move key if `color` is Black.
    #[inline(always)]
    pub fn hash_side_to_move(&mut self, color: Color) {
        if color.is_black() {
            self.hash_side();
        }
    }
}

impl fmt::Display for ZobristKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

struct ZobristTable {
    /// One key per (piece, square).
    pieces: [[u64; Square::COUNT]; Piece::COUNT],

    /// One key per en passant square; zero off ranks 3 and 6.
    ep: [u64; Square::COUNT],

    /// One key per castling-rights combination.
    castling: [u64; 16],

    /// The key hashed in when Black is to move.
    side: u64,
}

impl ZobristTable {
    /// Generates all keys from a fixed-seed xoshiro256** PRNG.
    const fn new() -> Self {
        let mut pieces = [[0; Square::COUNT]; Piece::COUNT];
        let mut ep = [0; Square::COUNT];
        let mut castling = [0; 16];

        let mut state = XOSHIRO_SEEDS;

        let mut p = 0;
        while p < Piece::COUNT {
            let mut s = 0;
            while s < Square::COUNT {
                (pieces[p][s], state) = xoshiro_next(state);
                s += 1;
            }
            p += 1;
        }

        let mut s = 0;
        while s < Square::COUNT {
            let rank = s / 8;
            if rank == 2 || rank == 5 {
                (ep[s], state) = xoshiro_next(state);
            }
            s += 1;
        }

        let mut c = 0;
        while c < 16 {
            (castling[c], state) = xoshiro_next(state);
            c += 1;
        }

        let (side, _) = xoshiro_next(state);

        Self {
            pieces,
            ep,
            castling,
            side,
        }
    }
}

/// Seeds for the key-generating PRNG.
const XOSHIRO_SEEDS: [u64; 4] = [
    0x5e1f_1d73_2b8a_9c41,
    0x06ba_2953_b9d8_97cd,
    0x8015_b5e5_9cc2_75e9,
    0xf8f4_27fc_5404_1de5,
];

/// One step of xoshiro256**.
///
/// Ported from <https://prng.di.unimi.it/xoshiro256starstar.c>.
const fn xoshiro_next(mut s: [u64; 4]) -> (u64, [u64; 4]) {
    let result = s[1].wrapping_mul(5).rotate_left(7).wrapping_mul(9);

    let t = s[1] << 17;

    s[2] ^= s[0];
    s[3] ^= s[1];
    s[1] ^= s[2];
    s[0] ^= s[3];

    s[2] ^= t;

    s[3] = s[3].rotate_left(45);
    (result, s)
}
