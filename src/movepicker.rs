/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use arrayvec::ArrayVec;

use crate::{
    generate, GenType, HistoryTable, Move, MoveList, PieceKind, Position, MAX_MOVES,
};

/// Ordering offset that puts captures above every quiet move.
const CAPTURE_OFFSET: i32 = 100_000;

/// Ordering offset that puts queen promotions among the best captures.
const QUEEN_PROMO_OFFSET: i32 = 1_000_000;

/// Marker for moves already yielded by an earlier stage.
const CONSUMED: i32 = i32::MIN;

/// The phases a [`MovePicker`] walks through.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Stage {
    TTMove,
    GenCaptures,
    Captures,
    Killers,
    GenQuiets,
    Quiets,
    Done,
}

/// Yields the pseudo-legal moves of a position one at a time, best-first:
/// the hash move, then captures by MVV-LVA (with queen promotions mixed into
/// the good captures), then the killer moves of this ply, then the remaining
/// quiets by history score.
///
/// Phases are constructed lazily as an explicit state machine: a later phase
/// generates nothing until every earlier phase has run dry, so a beta cutoff
/// on the hash move costs no generation work at all. Each phase skips moves
/// an earlier phase already yielded.
///
/// [`MovePicker::next`] takes the position by reference on every call rather
/// than borrowing it, so the caller may make and unmake moves between calls;
/// it must pass the same position (restored) each time.
pub struct MovePicker {
    tt_move: Move,
    killers: [Move; 2],
    stage: Stage,
    moves: MoveList,
    scores: ArrayVec<i32, MAX_MOVES>,
    killer_index: usize,
}

impl MovePicker {
    pub fn new(tt_move: Move, killers: [Move; 2]) -> Self {
        Self {
            tt_move,
            killers,
            stage: Stage::TTMove,
            moves: MoveList::new(),
            scores: ArrayVec::new(),
            killer_index: 0,
        }
    }

    /// Advances the state machine and returns the next-best move, or `None`
    /// once every phase is exhausted.
    pub fn next(&mut self, pos: &Position, history: &HistoryTable) -> Option<Move> {
        loop {
            match self.stage {
                Stage::TTMove => {
                    self.stage = Stage::GenCaptures;
                    if !self.tt_move.is_none() && pos.is_pseudo_legal(self.tt_move) {
                        return Some(self.tt_move);
                    }
                }

                Stage::GenCaptures => {
                    self.generate_stage(pos, history, GenType::Captures);
                    self.stage = Stage::Captures;
                }

                Stage::Captures => match self.pick_best() {
                    Some(m) => return Some(m),
                    None => self.stage = Stage::Killers,
                },

                Stage::Killers => {
                    while self.killer_index < 2 {
                        let killer = self.killers[self.killer_index];
                        self.killer_index += 1;

                        // A killer must still be playable here, must be quiet,
                        // and must not repeat the hash move or the other killer
                        if !killer.is_none()
                            && killer != self.tt_move
                            && (self.killer_index == 1 || killer != self.killers[0])
                            && !pos.is_capture(killer)
                            && pos.is_pseudo_legal(killer)
                        {
                            return Some(killer);
                        }
                    }
                    self.stage = Stage::GenQuiets;
                }

                Stage::GenQuiets => {
                    self.generate_stage(pos, history, GenType::Quiets);
                    self.stage = Stage::Quiets;
                }

                Stage::Quiets => match self.pick_best() {
                    Some(m) => return Some(m),
                    None => self.stage = Stage::Done,
                },

                Stage::Done => return None,
            }
        }
    }

    /// MVV-LVA with a large constant offset: most valuable victim first,
    /// least valuable attacker breaking ties.
    fn score_capture(pos: &Position, m: Move) -> i32 {
        let mut score = CAPTURE_OFFSET;

        if m.is_promotion() && m.promoted_kind() == PieceKind::Queen {
            score += QUEEN_PROMO_OFFSET;
        }

        let victim = if m.is_en_passant() {
            PieceKind::Pawn.value()
        } else {
            pos.piece_at(m.to()).map_or(0, |p| p.kind().value())
        };
        // A move cannot be picked from an empty square
        let attacker = pos.piece_at(m.from()).unwrap().kind().value();

        score + victim * 10 - attacker
    }

    /// Fills the move buffer with the requested class and scores it,
    /// marking anything an earlier stage already produced as consumed.
    fn generate_stage(&mut self, pos: &Position, history: &HistoryTable, gen: GenType) {
        self.moves.clear();
        self.scores.clear();
        generate(pos, gen, &mut self.moves);

        for i in 0..self.moves.len() {
            let m = self.moves[i];
            let score = if m == self.tt_move || (gen == GenType::Quiets && self.is_killer(m)) {
                CONSUMED
            } else if gen == GenType::Captures {
                Self::score_capture(pos, m)
            } else {
                history.get(pos.side_to_move(), m)
            };
            self.scores.push(score);
        }
    }

    #[inline(always)]
    fn is_killer(&self, m: Move) -> bool {
        m == self.killers[0] || m == self.killers[1]
    }

    /// Selection sort step: yields the highest-scored unconsumed move.
    fn pick_best(&mut self) -> Option<Move> {
        let mut best = None;
        let mut best_score = CONSUMED;

        for (i, &score) in self.scores.iter().enumerate() {
            if score > best_score {
                best_score = score;
                best = Some(i);
            }
        }

        let index = best?;
        self.scores[index] = CONSUMED;
        Some(self.moves[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, MoveKind, Square};

    fn picker_moves(pos: &Position, tt_move: Move, killers: [Move; 2]) -> Vec<Move> {
        picker_moves_with_history(pos, &HistoryTable::new(), tt_move, killers)
    }

    fn picker_moves_with_history(
        pos: &Position,
        history: &HistoryTable,
        tt_move: Move,
        killers: [Move; 2],
    ) -> Vec<Move> {
        let mut picker = MovePicker::new(tt_move, killers);
        let mut moves = Vec::new();
        while let Some(m) = picker.next(pos, history) {
            moves.push(m);
        }
        moves
    }

    #[test]
    fn test_tt_move_comes_first() {
        let pos = Position::default();
        let tt_move = Move::new(Square::G1, Square::F3, MoveKind::Normal);

        let moves = picker_moves(&pos, tt_move, [Move::NONE; 2]);
        assert_eq!(moves[0], tt_move);

        // It must not be yielded again later
        assert_eq!(moves.iter().filter(|&&m| m == tt_move).count(), 1);
        assert_eq!(moves.len(), 20);
    }

    #[test]
    fn test_illegal_tt_move_is_skipped() {
        let pos = Position::default();
        // There is no pawn move from e2 to e5
        let bogus = Move::new(Square::E2, Square::E5, MoveKind::Normal);

        let moves = picker_moves(&pos, bogus, [Move::NONE; 2]);
        assert!(!moves.contains(&bogus));
        assert_eq!(moves.len(), 20);
    }

    #[test]
    fn test_mvv_lva_ordering() {
        // White pawn on e4 can take a queen on d5 or a rook on f5; the
        // knight on c3 can also take d5. Queen first, cheapest attacker first.
        let pos = Position::from_fen("4k3/8/8/3q1r2/4P3/2N5/8/4K3 w - - 0 1").unwrap();

        let moves = picker_moves(&pos, Move::NONE, [Move::NONE; 2]);

        let victim_value = |m: &Move| pos.piece_at(m.to()).map(|p| p.kind().value());
        let captures: Vec<_> = moves.iter().filter(|m| pos.is_capture(**m)).collect();
        assert!(captures.len() >= 3);

        // Victims never get more valuable as the picker advances
        for pair in captures.windows(2) {
            assert!(
                victim_value(pair[0]) >= victim_value(pair[1]),
                "capture order violates MVV: {captures:?}"
            );
        }

        // PxQ outranks NxQ (cheaper attacker)
        let pxq = moves.iter().position(|m| m.to_string() == "e4d5").unwrap();
        let nxq = moves.iter().position(|m| m.to_string() == "c3d5").unwrap();
        assert!(pxq < nxq);

        // And all captures precede all quiets
        let first_quiet = moves.iter().position(|m| !pos.is_capture(*m)).unwrap();
        let last_capture = moves.iter().rposition(|m| pos.is_capture(*m)).unwrap();
        assert!(last_capture < first_quiet);
    }

    #[test]
    fn test_killers_precede_other_quiets() {
        let pos = Position::default();
        let killer = Move::new(Square::B1, Square::C3, MoveKind::Normal);

        let moves = picker_moves(&pos, Move::NONE, [killer, Move::NONE]);

        // No captures exist in the startpos, so the killer leads
        assert_eq!(moves[0], killer);
        assert_eq!(moves.iter().filter(|&&m| m == killer).count(), 1);
    }

    #[test]
    fn test_history_orders_quiets() {
        let pos = Position::default();
        let history = HistoryTable::new();
        let loved = Move::new(Square::D2, Square::D4, MoveKind::Normal);
        history.update(Color::White, loved, 400);

        let moves = picker_moves_with_history(&pos, &history, Move::NONE, [Move::NONE; 2]);
        assert_eq!(moves[0], loved);
    }

    #[test]
    fn test_queen_promotion_ranks_with_good_captures() {
        // White can promote by push or capture a knight with a pawn
        let pos = Position::from_fen("1n2k3/P7/8/5p2/4P3/8/8/4K3 w - - 0 1").unwrap();

        let moves = picker_moves(&pos, Move::NONE, [Move::NONE; 2]);
        // The queen promotion must come before the plain pawn capture
        let promo = moves.iter().position(|m| m.to_string() == "a7a8q").unwrap();
        let capture = moves.iter().position(|m| m.to_string() == "e4f5").unwrap();
        assert!(promo < capture);
    }
}
