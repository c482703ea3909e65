/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::sync::atomic::{AtomicI32, Ordering};

use crate::{Color, Move, Square};

/// Per-(side, from, to) scores for quiet moves that have caused beta cutoffs.
///
/// Shared by every search worker; updates are plain relaxed load/store pairs,
/// so concurrent bonuses may occasionally overwrite each other. A lost update
/// costs a little ordering quality and nothing else.
///
/// Cleared on `ucinewgame`, retained between searches.
pub struct HistoryTable(Box<[[[AtomicI32; Square::COUNT]; Square::COUNT]; Color::COUNT]>);

impl HistoryTable {
    /// Saturation bound of the gravity formula.
    const MAX: i32 = 512;

    /// Creates an empty table.
    pub fn new() -> Self {
        Self(Box::new(std::array::from_fn(|_| {
            std::array::from_fn(|_| std::array::from_fn(|_| AtomicI32::new(0)))
        })))
    }

    /// The current score of a quiet move for `side`.
    #[inline(always)]
    pub fn get(&self, side: Color, m: Move) -> i32 {
        self.0[side.index()][m.from().index()][m.to().index()].load(Ordering::Relaxed)
    }

    /// Applies `bonus` (positive or negative) with the gravity formula
    /// `entry += bonus - entry * |bonus| / 512`, which saturates smoothly
    /// at ±512 instead of clipping.
    #[inline(always)]
    pub fn update(&self, side: Color, m: Move, bonus: i32) {
        let slot = &self.0[side.index()][m.from().index()][m.to().index()];
        let clamped = bonus.clamp(-Self::MAX, Self::MAX);

        let entry = slot.load(Ordering::Relaxed);
        let new = entry + clamped - entry * clamped.abs() / Self::MAX;
        slot.store(new, Ordering::Relaxed);
    }

    /// Forgets everything.
    pub fn clear(&self) {
        for side in &*self.0 {
            for from in side {
                for slot in from {
                    slot.store(0, Ordering::Relaxed);
                }
            }
        }
    }
}

impl Default for HistoryTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MoveKind;

    #[test]
    fn test_bonus_accumulates_and_saturates() {
        let history = HistoryTable::new();
        let m = Move::new(Square::G1, Square::F3, MoveKind::Normal);

        assert_eq!(history.get(Color::White, m), 0);

        history.update(Color::White, m, 16);
        let first = history.get(Color::White, m);
        assert!(first > 0);

        // Repeated bonuses keep growing but never exceed the bound
        for _ in 0..1_000 {
            history.update(Color::White, m, 400);
        }
        let saturated = history.get(Color::White, m);
        assert!(saturated > first);
        assert!(saturated <= 512);

        // The sides are independent
        assert_eq!(history.get(Color::Black, m), 0);
    }

    #[test]
    fn test_penalty_pulls_down() {
        let history = HistoryTable::new();
        let m = Move::new(Square::B1, Square::C3, MoveKind::Normal);

        history.update(Color::White, m, 300);
        let boosted = history.get(Color::White, m);

        history.update(Color::White, m, -300);
        assert!(history.get(Color::White, m) < boosted);
    }

    #[test]
    fn test_clear() {
        let history = HistoryTable::new();
        let m = Move::new(Square::E2, Square::E4, MoveKind::Normal);

        history.update(Color::Black, m, 100);
        assert_ne!(history.get(Color::Black, m), 0);

        history.clear();
        assert_eq!(history.get(Color::Black, m), 0);
    }
}
