/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, queen_attacks, rook_attacks,
    Bitboard, Color, Move, MoveKind, MoveList, PieceKind, Position, Square,
};

/// Which class of moves to generate.
///
/// `Captures` and `Quiets` partition `All`: promotions by push and en passant
/// count as captures (the forcing moves quiescence search wants), castling as
/// quiet.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GenType {
    All,
    Captures,
    Quiets,
}

/// Appends every pseudo-legal move of the requested class to `moves`.
///
/// Pseudo-legal: a move may still leave the mover's king attacked. Castling
/// is the exception; its path and check conditions are verified here, so an
/// emitted castling move is fully legal.
pub fn generate(pos: &Position, gen: GenType, moves: &mut MoveList) {
    let us = pos.side_to_move();
    let them = !us;
    let occupied = pos.occupied();
    let enemies = pos.color(them);

    let targets = match gen {
        GenType::All => !pos.color(us),
        GenType::Captures => enemies,
        GenType::Quiets => !occupied,
    };

    generate_pawn_moves(pos, gen, moves);

    for from in pos.pieces(us, PieceKind::Knight) {
        push_all(moves, from, knight_attacks(from) & targets);
    }
    for from in pos.pieces(us, PieceKind::Bishop) {
        push_all(moves, from, bishop_attacks(from, occupied) & targets);
    }
    for from in pos.pieces(us, PieceKind::Rook) {
        push_all(moves, from, rook_attacks(from, occupied) & targets);
    }
    for from in pos.pieces(us, PieceKind::Queen) {
        push_all(moves, from, queen_attacks(from, occupied) & targets);
    }

    let king = pos.king_square(us);
    push_all(moves, king, king_attacks(king) & targets);

    if gen != GenType::Captures {
        let castles = match us {
            Color::White => [Square::G1, Square::C1],
            Color::Black => [Square::G8, Square::C8],
        };
        for to in castles {
            if pos.is_legal_castling(to) {
                moves.push(Move::new(king, to, MoveKind::Castling));
            }
        }
    }
}

#[inline(always)]
fn push_all(moves: &mut MoveList, from: Square, attacks: Bitboard) {
    for to in attacks {
        moves.push(Move::new(from, to, MoveKind::Normal));
    }
}

#[inline(always)]
fn push_promotions(moves: &mut MoveList, from: Square, to: Square) {
    for promo in PieceKind::promotions() {
        moves.push(Move::promotion(from, to, promo));
    }
}

fn generate_pawn_moves(pos: &Position, gen: GenType, moves: &mut MoveList) {
    let us = pos.side_to_move();
    let enemies = pos.color(!us);
    let promotion_rank = Bitboard::promotion_rank(us);
    let pawn_rank = Bitboard::pawn_rank(us);

    for from in pos.pieces(us, PieceKind::Pawn) {
        let promoting = promotion_rank.contains(from);

        // Pushes. A promotion by push is a forcing move and goes with the
        // captures; plain pushes are quiet.
        let single = from.forward(us);
        if pos.piece_at(single).is_none() {
            if promoting {
                if gen != GenType::Quiets {
                    push_promotions(moves, from, single);
                }
            } else if gen != GenType::Captures {
                moves.push(Move::new(from, single, MoveKind::Normal));

                if pawn_rank.contains(from) {
                    let double = single.forward(us);
                    if pos.piece_at(double).is_none() {
                        moves.push(Move::new(from, double, MoveKind::Normal));
                    }
                }
            }
        }

        if gen == GenType::Quiets {
            continue;
        }

        let attacks = pawn_attacks(from, us);
        for to in attacks & enemies {
            if promoting {
                push_promotions(moves, from, to);
            } else {
                moves.push(Move::new(from, to, MoveKind::Normal));
            }
        }

        if let Some(ep) = pos.ep_square() {
            if attacks.contains(ep) {
                moves.push(Move::new(from, ep, MoveKind::EnPassant));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FEN_STARTPOS;

    fn moves_of(fen: &str, gen: GenType) -> Vec<String> {
        let pos = Position::from_fen(fen).unwrap();
        let mut moves = MoveList::new();
        generate(&pos, gen, &mut moves);
        moves.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn test_startpos_move_count() {
        assert_eq!(moves_of(FEN_STARTPOS, GenType::All).len(), 20);
        assert_eq!(moves_of(FEN_STARTPOS, GenType::Captures).len(), 0);
        assert_eq!(moves_of(FEN_STARTPOS, GenType::Quiets).len(), 20);
    }

    #[test]
    fn test_captures_and_quiets_partition_all() {
        for fen in [
            FEN_STARTPOS,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 1",
            "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2",
        ] {
            let mut all = moves_of(fen, GenType::All);
            let mut split = moves_of(fen, GenType::Captures);
            split.extend(moves_of(fen, GenType::Quiets));

            all.sort();
            split.sort();
            assert_eq!(all, split, "partition broken on {fen}");
        }
    }

    #[test]
    fn test_en_passant_is_a_capture() {
        let fen = "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2";
        let captures = moves_of(fen, GenType::Captures);
        assert!(captures.contains(&String::from("e5d6")));
        assert!(!moves_of(fen, GenType::Quiets).contains(&String::from("e5d6")));
    }

    #[test]
    fn test_promotions_expand_to_four() {
        let fen = "4k3/P7/8/8/8/8/8/4K3 w - - 0 1";
        let all = moves_of(fen, GenType::All);
        for target in ["a7a8q", "a7a8r", "a7a8b", "a7a8n"] {
            assert!(all.contains(&String::from(target)), "missing {target}");
        }

        // Push-promotions are forcing and belong to the capture class
        let captures = moves_of(fen, GenType::Captures);
        assert!(captures.contains(&String::from("a7a8q")));
    }

    #[test]
    fn test_castling_generation() {
        // Both castles available
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        let all = moves_of(fen, GenType::All);
        assert!(all.contains(&String::from("e1g1")));
        assert!(all.contains(&String::from("e1c1")));

        // A rook on the king's path blocks the king-side castle
        let fen = "r3k2r/8/8/8/8/8/8/R3KR2 w KQkq - 0 1";
        let all = moves_of(fen, GenType::All);
        assert!(!all.contains(&String::from("e1g1")));
        assert!(all.contains(&String::from("e1c1")));

        // An attacked transit square forbids castling that way
        let fen = "r3k2r/8/8/8/8/5q2/8/R3K2R w KQkq - 0 1";
        let all = moves_of(fen, GenType::All);
        assert!(!all.contains(&String::from("e1g1")));

        // Castling while in check is never generated
        let fen = "r3k2r/8/8/8/8/4q3/8/R3K2R w KQkq - 0 1";
        let all = moves_of(fen, GenType::All);
        assert!(!all.contains(&String::from("e1g1")));
        assert!(!all.contains(&String::from("e1c1")));

        // The queen-side b1 square may be attacked; only c1 and d1 matter
        let fen = "r3k2r/8/8/8/8/n7/8/R3K2R w KQkq - 0 1";
        let all = moves_of(fen, GenType::All);
        assert!(all.contains(&String::from("e1c1")));
    }

    #[test]
    fn test_double_push_requires_both_squares_empty() {
        let fen = "4k3/8/8/8/8/4n3/4P3/4K3 w - - 0 1";
        let all = moves_of(fen, GenType::All);
        assert!(!all.contains(&String::from("e2e3")));
        assert!(!all.contains(&String::from("e2e4")));

        let fen = "4k3/8/8/8/4n3/8/4P3/4K3 w - - 0 1";
        let all = moves_of(fen, GenType::All);
        assert!(all.contains(&String::from("e2e3")));
        assert!(!all.contains(&String::from("e2e4")));
    }
}
