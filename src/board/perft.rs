/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::time::Instant;

use super::{generate, GenType, MoveList, Position};

/// Counts the leaf nodes of the legal move tree to the given depth.
pub fn perft(pos: &mut Position, depth: usize) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut moves = MoveList::new();
    generate(pos, GenType::All, &mut moves);

    let mut nodes = 0;
    for m in moves {
        pos.make_move(m);
        if !pos.opponent_in_check() {
            nodes += perft(pos, depth - 1);
        }
        pos.unmake_move(m);
    }

    nodes
}

/// Perft with a per-root-move breakdown, printed as `<move>: <nodes>` lines
/// followed by totals and throughput.
pub fn splitperft(pos: &mut Position, depth: usize) -> u64 {
    let now = Instant::now();

    let mut moves = MoveList::new();
    generate(pos, GenType::All, &mut moves);

    let mut total = 0;
    for m in moves {
        pos.make_move(m);
        if !pos.opponent_in_check() {
            let nodes = if depth > 0 { perft(pos, depth - 1) } else { 1 };
            println!("{m}: {nodes}");
            total += nodes;
        }
        pos.unmake_move(m);
    }

    let elapsed = now.elapsed();
    let nps = total as f64 / elapsed.as_secs_f64();
    println!();
    println!("{total} nodes in {elapsed:.2?} ({:.0} nps)", nps);

    total
}
