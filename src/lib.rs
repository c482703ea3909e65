/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Board representation: bitboards, squares, pieces, moves, attacks,
/// position state, move generation, and perft.
mod board;

/// Parsing of terminal input into engine commands.
mod cli;

/// The UCI event loop.
mod engine;

/// Static evaluation of positions.
mod eval;

/// History heuristic for quiet-move ordering.
mod history;

/// Staged, lazy move ordering for the search.
mod movepicker;

/// Centipawn and mate scores.
mod score;

/// Iterative deepening, alpha-beta, quiescence, and time management.
mod search;

/// The shared, lock-free transposition table.
mod ttable;

/// Tunable parameter registry.
mod tune;

pub use board::*;
pub use cli::*;
pub use engine::*;
pub use eval::*;
pub use history::*;
pub use movepicker::*;
pub use score::*;
pub use search::*;
pub use ttable::*;
pub use tune::*;
