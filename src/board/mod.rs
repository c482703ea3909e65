/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Precomputed attack tables, including the magic bitboard machinery.
mod attacks;

/// A 64-bit set of squares.
mod bitboard;

/// Pseudo-legal move generation.
mod movegen;

/// Compact move representation.
mod moves;

/// Leaf-node counting for move generator verification.
mod perft;

/// Colors, piece kinds, and colored pieces.
mod piece;

/// The position itself: board state, make/unmake, legality, draw rules.
mod position;

/// Squares in little-endian rank-file order.
mod square;

/// Position hashing.
mod zobrist;

pub use attacks::*;
pub use bitboard::*;
pub use movegen::*;
pub use moves::*;
pub use perft::*;
pub use piece::*;
pub use position::*;
pub use square::*;
pub use zobrist::*;
