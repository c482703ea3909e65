/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::{
    bishop_attacks, knight_attacks, queen_attacks, rook_attacks, Color, PieceKind, Position,
    Score, Square,
};

/// Bonus for having the move.
const TEMPO: i32 = 20;

/// Game phase is the sum of piece weights (N/B = 1, R = 2, Q = 4), capped here.
const MAX_PHASE: i32 = 24;

/// Middle-game material values, indexed by [`PieceKind`].
const MATERIAL_MG: [i32; PieceKind::COUNT] = [100, 320, 330, 500, 900, 0];

/// End-game material values, indexed by [`PieceKind`].
const MATERIAL_EG: [i32; PieceKind::COUNT] = [120, 300, 320, 550, 950, 0];

/// Mobility bonus per reachable square, (middle-game, end-game).
const MOBILITY: [(i32, i32); PieceKind::COUNT] =
    [(0, 0), (4, 4), (3, 3), (2, 4), (1, 2), (0, 0)];

/// Statically evaluates `pos` from the side-to-move's perspective.
///
/// Tapered evaluation: material, piece-square bonuses, and mobility are
/// scored separately for the middle game and the end game, then blended by
/// the phase of the game.
pub fn evaluate(pos: &Position) -> Score {
    let us = pos.side_to_move();

    let (our_mg, our_eg, our_phase) = eval_side(pos, us);
    let (their_mg, their_eg, their_phase) = eval_side(pos, !us);

    let mg = our_mg - their_mg;
    let eg = our_eg - their_eg;

    let mg_phase = (our_phase + their_phase).min(MAX_PHASE);
    let eg_phase = MAX_PHASE - mg_phase;

    let blended = (mg * mg_phase + eg * eg_phase) / MAX_PHASE;
    Score::new((blended + TEMPO) as i16)
}

/// Accumulates (middle-game, end-game, phase) for one side.
fn eval_side(pos: &Position, color: Color) -> (i32, i32, i32) {
    let occupied = pos.occupied();
    let own = pos.color(color);

    let mut mg = 0;
    let mut eg = 0;
    let mut phase = 0;

    for kind in PieceKind::all() {
        let kind_index = kind.index();

        for square in pos.pieces(color, kind) {
            // Piece-square tables are laid out from White's perspective
            let table_square = if color.is_white() {
                square
            } else {
                square.flipped_rank()
            };
            let psqt = PSQT[kind_index][table_square.index()];

            mg += MATERIAL_MG[kind_index] + psqt;
            eg += MATERIAL_EG[kind_index] + psqt;

            phase += match kind {
                PieceKind::Knight | PieceKind::Bishop => 1,
                PieceKind::Rook => 2,
                PieceKind::Queen => 4,
                _ => 0,
            };

            let attacks = match kind {
                PieceKind::Knight => knight_attacks(square),
                PieceKind::Bishop => bishop_attacks(square, occupied),
                PieceKind::Rook => rook_attacks(square, occupied),
                PieceKind::Queen => queen_attacks(square, occupied),
                _ => continue,
            };

            let mobility = (attacks & !own).population() as i32;
            let (mob_mg, mob_eg) = MOBILITY[kind_index];
            mg += mobility * mob_mg;
            eg += mobility * mob_eg;
        }
    }

    (mg, eg, phase)
}

/// Piece-square bonuses, indexed `[kind][square]`, from White's perspective
/// with `a1` first.
#[rustfmt::skip]
const PSQT: [[i32; Square::COUNT]; PieceKind::COUNT] = [
    // Pawn
    [
          0,  0,  0,  0,  0,  0,  0,  0,
          5, 10, 10,-20,-20, 10, 10,  5,
          5, -5,-10,  0,  0,-10, -5,  5,
          0,  0,  0, 20, 20,  0,  0,  0,
          5,  5, 10, 25, 25, 10,  5,  5,
         10, 10, 20, 30, 30, 20, 10, 10,
         50, 50, 50, 50, 50, 50, 50, 50,
          0,  0,  0,  0,  0,  0,  0,  0,
    ],
    // Knight
    [
        -50,-40,-30,-30,-30,-30,-40,-50,
        -40,-20,  0,  5,  5,  0,-20,-40,
        -30,  5, 10, 15, 15, 10,  5,-30,
        -30,  0, 15, 20, 20, 15,  0,-30,
        -30,  5, 15, 20, 20, 15,  5,-30,
        -30,  0, 10, 15, 15, 10,  0,-30,
        -40,-20,  0,  0,  0,  0,-20,-40,
        -50,-40,-30,-30,-30,-30,-40,-50,
    ],
    // Bishop
    [
        -20,-10,-10,-10,-10,-10,-10,-20,
        -10,  5,  0,  0,  0,  0,  5,-10,
        -10, 10, 10, 10, 10, 10, 10,-10,
        -10,  0, 10, 10, 10, 10,  0,-10,
        -10,  5,  5, 10, 10,  5,  5,-10,
        -10,  0,  5, 10, 10,  5,  0,-10,
        -10,  0,  0,  0,  0,  0,  0,-10,
        -20,-10,-10,-10,-10,-10,-10,-20,
    ],
    // Rook
    [
          0,  0,  0,  5,  5,  0,  0,  0,
         -5,  0,  0,  0,  0,  0,  0, -5,
         -5,  0,  0,  0,  0,  0,  0, -5,
         -5,  0,  0,  0,  0,  0,  0, -5,
         -5,  0,  0,  0,  0,  0,  0, -5,
         -5,  0,  0,  0,  0,  0,  0, -5,
          5, 10, 10, 10, 10, 10, 10,  5,
          0,  0,  0,  0,  0,  0,  0,  0,
    ],
    // Queen
    [
        -20,-10,-10, -5, -5,-10,-10,-20,
        -10,  0,  5,  0,  0,  0,  0,-10,
        -10,  5,  5,  5,  5,  5,  0,-10,
          0,  0,  5,  5,  5,  5,  0, -5,
         -5,  0,  5,  5,  5,  5,  0, -5,
        -10,  0,  5,  5,  5,  5,  0,-10,
        -10,  0,  0,  0,  0,  0,  0,-10,
        -20,-10,-10, -5, -5,-10,-10,-20,
    ],
    // King
    [
         20, 30, 10,  0,  0, 10, 30, 20,
         20, 20,  0,  0,  0,  0, 20, 20,
        -10,-20,-20,-20,-20,-20,-20,-10,
        -20,-30,-30,-40,-40,-30,-30,-20,
        -30,-40,-40,-50,-50,-40,-40,-30,
        -30,-40,-40,-50,-50,-40,-40,-30,
        -30,-40,-40,-50,-50,-40,-40,-30,
        -30,-40,-40,-50,-50,-40,-40,-30,
    ],
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FEN_STARTPOS;

    #[test]
    fn test_startpos_is_balanced() {
        // Only the tempo bonus separates the sides
        let pos = Position::from_fen(FEN_STARTPOS).unwrap();
        assert_eq!(evaluate(&pos), Score::new(TEMPO as i16));
    }

    #[test]
    fn test_eval_is_symmetric() {
        // Mirrored positions must evaluate identically for the mover
        let white = Position::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        let black = Position::from_fen("4k3/4p3/8/8/8/8/8/4K3 b - - 0 1").unwrap();
        assert_eq!(evaluate(&white), evaluate(&black));
    }

    #[test]
    fn test_material_advantage_shows() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/3QK3 w - - 0 1").unwrap();
        assert!(evaluate(&pos) > Score::new(700));

        // And the defender sees the deficit
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/3QK3 b - - 0 1").unwrap();
        assert!(evaluate(&pos) < Score::new(-700));
    }

    #[test]
    fn test_centralized_knight_beats_rim_knight() {
        let center = Position::from_fen("4k3/8/8/4N3/8/8/8/4K3 w - - 0 1").unwrap();
        let rim = Position::from_fen("4k3/8/8/8/8/8/8/N3K3 w - - 0 1").unwrap();
        assert!(evaluate(&center) > evaluate(&rim));
    }
}
