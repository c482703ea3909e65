/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use newt::{perft, Position, FEN_STARTPOS};

fn test_perft_fen_nodes(depth: usize, fen: &str, expected: u64) {
    let mut position = Position::from_fen(fen).unwrap();
    let nodes = perft(&mut position, depth);
    assert_eq!(nodes, expected, "PERFT({depth}) failed on {fen}");
}

fn do_perft(fen: &str, results: &[u64]) {
    let mut position = Position::from_fen(fen).unwrap();
    for (depth, &expected) in results.iter().enumerate() {
        let nodes = perft(&mut position, depth);
        assert_eq!(nodes, expected, "PERFT({depth}) failed on {fen}");
    }
}

mod startpos {
    use super::*;

    #[test]
    fn test_startpos_perft_shallow() {
        do_perft(FEN_STARTPOS, &[1, 20, 400, 8_902, 197_281]);
    }

    #[test]
    fn test_startpos_perft_5() {
        test_perft_fen_nodes(5, FEN_STARTPOS, 4_865_609);
    }
}

mod kiwipete {
    use super::*;

    const FEN_KIWIPETE: &str =
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    #[test]
    fn test_kiwipete_perft_shallow() {
        do_perft(FEN_KIWIPETE, &[1, 48, 2_039, 97_862]);
    }

    #[test]
    fn test_kiwipete_perft_4() {
        test_perft_fen_nodes(4, FEN_KIWIPETE, 4_085_603);
    }
}

mod endgame {
    use super::*;

    /// "Position 3" from the chessprogramming wiki's perft results page.
    const FEN_POSITION_3: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";

    #[test]
    fn test_position_3_perft_shallow() {
        do_perft(FEN_POSITION_3, &[1, 14, 191, 2_812, 43_238]);
    }

    #[test]
    fn test_position_3_perft_5() {
        test_perft_fen_nodes(5, FEN_POSITION_3, 674_624);
    }
}

mod promotions {
    use super::*;

    const FEN_PROMOTIONS: &str = "n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 1";

    #[test]
    fn test_promotion_perft() {
        do_perft(FEN_PROMOTIONS, &[1, 24, 496, 9_483, 182_838]);
    }

    #[test]
    fn test_promotion_perft_5() {
        test_perft_fen_nodes(5, FEN_PROMOTIONS, 3_605_103);
    }
}

/// Positions whose node counts only come out right when en passant
/// legality (pins, blocks, checks) is handled exactly.
mod en_passant {
    use super::*;

    #[test]
    fn test_ep_basics() {
        do_perft("8/8/8/8/1k1PpN1R/8/8/4K3 b - d3 0 1", &[1, 9, 193]);
        do_perft("4k3/8/8/2PpP3/8/8/8/4K3 w - d6 0 1", &[1, 9, 47, 376]);
        do_perft("4k3/8/8/8/2pPp3/8/8/4K3 b - d3 0 1", &[1, 9, 47, 376]);
    }

    #[test]
    fn test_ep_pinned_diagonally() {
        do_perft("4k3/b7/8/2Pp4/8/8/8/6K1 w - d6 0 1", &[1, 5, 45]);
        do_perft("4k3/7b/8/4pP2/8/8/8/1K6 w - e6 0 1", &[1, 5, 45]);
        do_perft("6k1/8/8/8/2pP4/8/B7/3K4 b - d3 0 1", &[1, 5, 45]);
    }

    #[test]
    fn test_ep_pinned_horizontally() {
        do_perft("4k3/8/8/K2pP2r/8/8/8/8 w - d6 0 1", &[1, 6, 94]);
        do_perft("4k3/8/8/r2pP2K/8/8/8/8 w - d6 0 1", &[1, 6, 87]);
    }

    #[test]
    fn test_ep_while_in_check() {
        do_perft("4k3/8/8/4pP2/3K4/8/8/8 w - e6 0 1", &[1, 9, 49]);
        do_perft("8/8/8/4k3/5Pp1/8/8/3K4 b - f3 0 1", &[1, 9, 50]);
    }

    #[test]
    fn test_ep_capture_discovers_check() {
        test_perft_fen_nodes(6, "8/8/1k6/2b5/2pP4/8/5K2/8 b - d3 0 1", 1_440_467);
    }
}

mod castling {
    use super::*;

    #[test]
    fn test_castling_rights_tracking() {
        test_perft_fen_nodes(4, "r3k2r/1b4bq/8/8/8/8/7B/R3K2R w KQkq - 0 1", 1_274_206);
    }

    #[test]
    fn test_castling_prevented() {
        test_perft_fen_nodes(4, "r3k2r/8/3Q4/8/8/5q2/8/R3K2R b KQkq - 0 1", 1_720_476);
    }

    #[test]
    fn test_short_castling_gives_check() {
        test_perft_fen_nodes(6, "5k2/8/8/8/8/8/8/4K2R w K - 0 1", 661_072);
    }

    #[test]
    fn test_long_castling_gives_check() {
        test_perft_fen_nodes(6, "3k4/8/8/8/8/8/8/R3K3 w Q - 0 1", 803_711);
    }
}

mod mates {
    use super::*;

    #[test]
    fn test_promote_out_of_check() {
        test_perft_fen_nodes(6, "2K2r2/4P3/8/8/8/8/8/3k4 w - - 0 1", 3_821_001);
    }

    #[test]
    fn test_self_stalemate() {
        test_perft_fen_nodes(6, "K1k5/8/P7/8/8/8/8/8 w - - 0 1", 2_217);
    }

    #[test]
    fn test_stalemate_and_checkmate() {
        test_perft_fen_nodes(4, "8/8/2k5/5q2/5n2/8/5K2/8 b - - 0 1", 23_527);
    }

    #[test]
    fn test_under_promote_to_give_check() {
        test_perft_fen_nodes(6, "8/P1k5/K7/8/8/8/8/8 w - - 0 1", 92_683);
    }
}

/// FEN strings without halfmove/fullmove counters must still parse.
#[test]
fn test_perft_on_partial_fen() {
    test_perft_fen_nodes(1, "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - -", 14);
}
