/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    marker::PhantomData,
    ops::Neg,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use arrayvec::ArrayVec;
use uci_parser::{UciInfo, UciResponse, UciSearchOptions};

use crate::{
    evaluate, generate, Bound, GenType, HistoryTable, Move, MoveList, MovePicker, PieceKind,
    Position, Score, TTable, Tunables,
};

/// Maximum distance from the root the search will ever reach.
pub const MAX_PLY: i32 = 128;

/// Maximum nominal search depth.
pub const MAX_DEPTH: i32 = 127;

/// Margin added to a victim's value during delta pruning in quiescence.
const DELTA_MARGIN: i32 = 200;

/// How much to log during a search.
///
/// Helper threads in a multi-threaded search run with [`LogNone`] so that
/// only the reporting thread talks to the GUI.
pub trait LogLevel {
    /// Print `info` and `bestmove` lines.
    const INFO: bool;

    /// Also print diagnostic `info string` lines.
    const DEBUG: bool;
}

/// Standard UCI output.
pub struct LogInfo;
impl LogLevel for LogInfo {
    const INFO: bool = true;
    const DEBUG: bool = false;
}

/// UCI output plus diagnostics.
pub struct LogDebug;
impl LogLevel for LogDebug {
    const INFO: bool = true;
    const DEBUG: bool = true;
}

/// Complete silence.
pub struct LogNone;
impl LogLevel for LogNone {
    const INFO: bool = false;
    const DEBUG: bool = false;
}

/// Marker trait for the kind of node being searched.
trait NodeType {
    /// Is this the node at the root of the tree?
    const ROOT: bool;

    /// Is this node searched with a full window?
    const PV: bool;

    /// The type of this node's first child.
    type Next: NodeType;
}

/// The root node itself.
struct RootNode;
impl NodeType for RootNode {
    const ROOT: bool = true;
    const PV: bool = true;
    type Next = PvNode;
}

/// A node on the principal variation.
struct PvNode;
impl NodeType for PvNode {
    const ROOT: bool = false;
    const PV: bool = true;
    type Next = PvNode;
}

/// A node searched with a zero-width window.
struct NonPvNode;
impl NodeType for NonPvNode {
    const ROOT: bool = false;
    const PV: bool = false;
    type Next = NonPvNode;
}

/// The best line of play found by a search.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PrincipalVariation(ArrayVec<Move, { MAX_PLY as usize }>);

impl PrincipalVariation {
    #[inline(always)]
    fn clear(&mut self) {
        self.0.clear();
    }

    /// Replaces the contents of `self` with `mv` followed by `rest`.
    #[inline(always)]
    fn extend(&mut self, mv: Move, rest: &Self) {
        self.clear();
        self.0.push(mv);
        let _ = self.0.try_extend_from_slice(&rest.0);
    }

    /// The move this line starts with, if any.
    #[inline(always)]
    pub fn first(&self) -> Option<Move> {
        self.0.first().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Move> {
        self.0.iter()
    }
}

impl fmt::Display for PrincipalVariation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut moves = self.0.iter();
        if let Some(first) = moves.next() {
            write!(f, "{first}")?;
            for m in moves {
                write!(f, " {m}")?;
            }
        }
        Ok(())
    }
}

/// An alpha-beta window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBounds {
    /// Lower bound: we are guaranteed at least this score.
    pub alpha: Score,

    /// Upper bound: the opponent can hold us to at most this score.
    pub beta: Score,
}

impl SearchBounds {
    #[inline(always)]
    const fn new(alpha: Score, beta: Score) -> Self {
        Self { alpha, beta }
    }

    /// A zero-width window above `alpha`.
    #[inline(always)]
    fn null_alpha(self) -> Self {
        Self::new(self.alpha, self.alpha + 1)
    }

    /// A zero-width window below `beta`.
    #[inline(always)]
    fn null_beta(self) -> Self {
        Self::new(self.beta - 1, self.beta)
    }
}

impl Neg for SearchBounds {
    type Output = Self;

    /// Negating a window swaps and negates both bounds, converting it to the
    /// opponent's perspective.
    #[inline(always)]
    fn neg(self) -> Self::Output {
        Self {
            alpha: -self.beta,
            beta: -self.alpha,
        }
    }
}

impl Default for SearchBounds {
    #[inline(always)]
    fn default() -> Self {
        Self::new(-Score::INF, Score::INF)
    }
}

/// A window centered on the previous iteration's score, widened every time
/// the new score lands outside it.
#[derive(Debug)]
struct AspirationWindow {
    bounds: SearchBounds,
    delta: i16,
}

impl AspirationWindow {
    /// Minimum depth at which to search with a narrowed window.
    const MIN_DEPTH: i32 = 5;

    fn new(score: Score, depth: i32, initial_delta: i16) -> Self {
        // Shallow iterations and mate scores fluctuate too much to aspire
        let bounds = if depth < Self::MIN_DEPTH || score.is_mate() {
            SearchBounds::default()
        } else {
            SearchBounds::new(
                (score - initial_delta).max(-Score::INF),
                (score + initial_delta).min(Score::INF),
            )
        };

        Self {
            bounds,
            delta: initial_delta,
        }
    }

    #[inline(always)]
    fn fails_low(&self, score: Score) -> bool {
        self.bounds.alpha != -Score::INF && score <= self.bounds.alpha
    }

    #[inline(always)]
    fn fails_high(&self, score: Score) -> bool {
        self.bounds.beta != Score::INF && score >= self.bounds.beta
    }

    /// Fail low: pull beta towards the midpoint and drop alpha.
    fn widen_down(&mut self) {
        let midpoint = (self.bounds.alpha.inner() as i32 + self.bounds.beta.inner() as i32) / 2;
        self.bounds.beta = Score::new(midpoint as i16);
        self.bounds.alpha = (self.bounds.alpha - self.delta * 2).max(-Score::INF);
        self.grow();
    }

    /// Fail high: raise beta.
    fn widen_up(&mut self) {
        self.bounds.beta = (self.bounds.beta + self.delta * 2).min(Score::INF);
        self.grow();
    }

    #[inline(always)]
    fn grow(&mut self) {
        self.delta += self.delta / 2;
    }
}

/// What a finished (or cancelled) search produced.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The move to play. [`Move::NONE`] only if the position has no legal moves.
    pub bestmove: Move,

    /// Score of the deepest completed iteration.
    pub score: Score,

    /// Depth of the deepest completed iteration.
    pub depth: i32,

    /// Greatest ply reached, including quiescence.
    pub seldepth: i32,

    /// Nodes searched by this thread.
    pub nodes: u64,

    /// The line the score is based on.
    pub pv: PrincipalVariation,
}

impl Default for SearchResult {
    fn default() -> Self {
        Self {
            bestmove: Move::NONE,
            score: -Score::INF,
            depth: 0,
            seldepth: 0,
            nodes: 0,
            pv: PrincipalVariation::default(),
        }
    }
}

/// Limits for one `go` command, shared by every worker thread.
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    pub max_depth: i32,
    pub max_nodes: u64,
    pub starttime: Instant,

    /// Crossing this between iterations stops the search; there is rarely
    /// time to finish another, deeper iteration.
    pub soft_timeout: Duration,

    /// Crossing this at any point stops the search.
    pub hard_timeout: Duration,
}

impl SearchConfig {
    /// Derives the limits for a search from the `go` options.
    ///
    /// With a movetime, both deadlines are the movetime less the overhead.
    /// On a clock, the soft deadline is a per-move slice of the remaining
    /// time plus the increment; the hard deadline allows five slices but
    /// never more than the clock holds. Depth/node/infinite searches have
    /// no deadline at all and run until told to stop.
    pub fn new(options: UciSearchOptions, position: &Position, overhead: Duration) -> Self {
        let mut config = Self::default();

        if let Some(depth) = options.depth {
            config.max_depth = (depth as i32).min(MAX_DEPTH);
        }

        if let Some(nodes) = options.nodes {
            config.max_nodes = nodes as u64;
        }

        if let Some(movetime) = options.movetime {
            config.hard_timeout = movetime.saturating_sub(overhead);
            config.soft_timeout = config.hard_timeout;
        } else {
            let (time, inc) = if position.side_to_move().is_white() {
                (options.wtime, options.winc)
            } else {
                (options.btime, options.binc)
            };

            if let Some(time) = time {
                let inc = inc.unwrap_or(Duration::ZERO);
                let mtg = options.movestogo.map_or(30, |n| (n as u32).max(1));

                let soft = (time / mtg + inc).saturating_sub(overhead);
                let hard = (soft * 5).min(time.saturating_sub(overhead));

                config.soft_timeout = soft.max(Duration::from_millis(1));
                config.hard_timeout = hard.max(Duration::from_millis(1));
            }
        }

        config
    }
}

impl Default for SearchConfig {
    /// The default config searches forever.
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            max_nodes: u64::MAX,
            starttime: Instant::now(),
            soft_timeout: Duration::MAX,
            hard_timeout: Duration::MAX,
        }
    }
}

/// Snapshot of the tunable registry, taken once per search.
#[derive(Debug, Clone, Copy)]
pub struct SearchParameters {
    lmr_base: f64,
    lmr_divisor: f64,
    rfp_margin: i32,
    rfp_depth: i32,
    aspiration_delta: i16,
}

impl SearchParameters {
    pub fn new(tunables: &Tunables) -> Self {
        Self {
            lmr_base: tunables.get("LMR_Base").unwrap_or(25) as f64 / 100.0,
            lmr_divisor: tunables.get("LMR_Div").unwrap_or(195) as f64 / 100.0,
            rfp_margin: tunables.get("RFP_Margin").unwrap_or(75),
            rfp_depth: tunables.get("RFP_Depth").unwrap_or(7),
            aspiration_delta: tunables.get("AspirationDelta").unwrap_or(20) as i16,
        }
    }
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self::new(&Tunables::new())
    }
}

/// One search worker.
///
/// Workers share only the transposition table, the history table, the stop
/// flag, and the node counter; everything else (position copy, killers,
/// principal variation) is private, in the Lazy-SMP style. Worker 0 is the
/// reporter: it prints UCI output and enforces the time limits.
pub struct Search<Log> {
    /// Worker index; 0 is the reporter.
    id: usize,

    config: SearchConfig,
    params: SearchParameters,

    /// Cleared by anyone (timeout, node cap, `stop`) to end the search.
    is_searching: Arc<AtomicBool>,

    ttable: Arc<TTable>,
    history: Arc<HistoryTable>,

    /// Nodes across all workers, updated in batches of 2048.
    global_nodes: Arc<AtomicU64>,

    /// Nodes searched by this worker.
    nodes: u64,

    /// Watermark of nodes already flushed into `global_nodes`.
    flushed: u64,

    seldepth: i32,

    /// Two quiet cutoff moves per ply.
    killers: [[Move; 2]; MAX_PLY as usize],

    /// Late-move reduction amounts, indexed by depth and move number.
    reductions: [[u8; 64]; 64],

    log: PhantomData<Log>,
}

impl<Log: LogLevel> Search<Log> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: usize,
        config: SearchConfig,
        params: SearchParameters,
        is_searching: Arc<AtomicBool>,
        ttable: Arc<TTable>,
        history: Arc<HistoryTable>,
        global_nodes: Arc<AtomicU64>,
    ) -> Self {
        let mut reductions = [[0u8; 64]; 64];
        for (depth, row) in reductions.iter_mut().enumerate().skip(1) {
            for (moves, r) in row.iter_mut().enumerate().skip(1) {
                let value = ((depth as f64 + 1.0).ln() * (moves as f64 + 1.0).ln()
                    / params.lmr_divisor
                    + params.lmr_base) as u8;
                *r = value;
            }
        }

        Self {
            id,
            config,
            params,
            is_searching,
            ttable,
            history,
            global_nodes,
            nodes: 0,
            flushed: 0,
            seldepth: 0,
            killers: [[Move::NONE; 2]; MAX_PLY as usize],
            reductions,
            log: PhantomData,
        }
    }

    /// Runs the search on (a private copy of) `position`.
    ///
    /// The reporter prints `info` lines per iteration and the final
    /// `bestmove`; helpers return silently. Whoever finishes first clears
    /// the searching flag so every other worker unwinds too.
    pub fn start(mut self, position: &Position) -> SearchResult {
        if Log::DEBUG {
            self.send_string(format!("Searching {:?}", position.to_fen()));
        }

        let mut position = position.clone();
        let result = self.iterative_deepening(&mut position);

        if Log::INFO {
            let bestmove = if result.bestmove.is_none() {
                // No legal moves at the root
                String::from("0000")
            } else {
                result.bestmove.to_string()
            };

            let response: UciResponse<String> = UciResponse::BestMove {
                bestmove: Some(bestmove),
                ponder: None,
            };
            println!("{response}");
        }

        self.flush_nodes();
        self.is_searching.store(false, Ordering::Release);

        result
    }

    /// The iterative deepening driver: searches to depth 1, then 2, and so
    /// on, each iteration inside an aspiration window seeded by the last.
    fn iterative_deepening(&mut self, position: &mut Position) -> SearchResult {
        let mut result = SearchResult {
            // If even depth 1 is cut short, play any legal move
            bestmove: first_legal_move(position),
            ..Default::default()
        };

        let mut depth = 1;
        'deepening: while depth <= self.config.max_depth
            && self.config.starttime.elapsed() < self.config.soft_timeout
            && self.searching()
        {
            let mut window =
                AspirationWindow::new(result.score, depth, self.params.aspiration_delta);
            let mut pv = PrincipalVariation::default();

            let score = loop {
                let score =
                    self.negamax::<RootNode>(position, depth, 0, window.bounds, &mut pv, true);

                // A cancelled iteration may be arbitrarily wrong; keep the
                // result of the last completed one
                if !self.searching() {
                    break 'deepening;
                }

                if window.fails_low(score) {
                    window.widen_down();
                } else if window.fails_high(score) {
                    window.widen_up();
                } else {
                    break score;
                }
            };

            result.score = score;
            result.depth = depth;
            result.seldepth = self.seldepth;
            if let Some(first) = pv.first() {
                result.bestmove = first;
                result.pv = pv;
            } else {
                // The window search can terminate without a PV; fall back to
                // the hash move
                let tt_move = self.ttable.best_move(position.key());
                if !tt_move.is_none() {
                    result.bestmove = tt_move;
                }
            }

            if Log::INFO {
                self.send_iteration_info(&result);
            }

            depth += 1;
        }

        result.nodes = self.nodes;
        result
    }

    /// Negamax alpha-beta in a fail-hard framework, with transposition
    /// cutoffs, selective pruning, and principal variation search.
    fn negamax<Node: NodeType>(
        &mut self,
        position: &mut Position,
        mut depth: i32,
        ply: i32,
        mut bounds: SearchBounds,
        pv: &mut PrincipalVariation,
        do_null: bool,
    ) -> Score {
        self.tick();
        if !self.searching() {
            return Score::DRAW;
        }
        self.nodes += 1;
        self.seldepth = self.seldepth.max(ply);

        let mut local_pv = PrincipalVariation::default();
        pv.clear();

        if !Node::ROOT {
            if position.is_draw() {
                return Score::DRAW;
            }
            if ply >= MAX_PLY {
                return evaluate(position);
            }

            // Mate distance pruning: even a forced mate from here cannot beat
            // a shorter mate already found closer to the root
            let mate = Score::MATE - ply as i16;
            bounds.alpha = bounds.alpha.max(-mate);
            bounds.beta = bounds.beta.min(mate);
            if bounds.alpha >= bounds.beta {
                return bounds.alpha;
            }
        }

        let in_check = position.in_check();
        if in_check {
            depth += 1;
        }
        // Check extensions must not push the depth beyond what fits in a
        // transposition table entry
        depth = depth.min(MAX_DEPTH);

        if depth <= 0 {
            return self.quiescence(position, ply, bounds);
        }

        /********************************************************************
         * Transposition table cutoffs
         ********************************************************************/
        let mut tt_move = Move::NONE;
        if let Some(entry) = self.ttable.probe(position.key(), ply as i16) {
            tt_move = entry.best_move;

            // The stored move is useful for ordering at any depth, the score
            // only when it came from a search at least this deep
            if !Node::PV && entry.depth as i32 >= depth {
                match entry.bound {
                    Bound::Exact => return entry.score,
                    Bound::Upper if entry.score <= bounds.alpha => return bounds.alpha,
                    Bound::Lower if entry.score >= bounds.beta => return bounds.beta,
                    _ => {}
                }
            }
        }

        if !Node::PV && !in_check {
            let static_eval = evaluate(position);

            /****************************************************************
             * Reverse futility pruning: at shallow depth, a static eval far
             * enough above beta is very unlikely to come back down
             ****************************************************************/
            if depth <= self.params.rfp_depth
                && bounds.beta.inner().abs() < Score::MATE_BOUND.inner()
                && static_eval - Score::new((self.params.rfp_margin * depth) as i16) >= bounds.beta
            {
                return static_eval;
            }

            /****************************************************************
             * Null move pruning: if passing the turn still fails high, an
             * actual move will too. Skipped without non-pawn material, where
             * zugzwang would make the conclusion unsound.
             ****************************************************************/
            if do_null
                && depth >= 3
                && static_eval >= bounds.beta
                && position
                    .non_pawn_material(position.side_to_move())
                    .is_nonempty()
            {
                position.make_nullmove();
                let reduction = 3 + depth / 4;
                let score = -self.negamax::<NonPvNode>(
                    position,
                    depth - 1 - reduction,
                    ply + 1,
                    -bounds.null_beta(),
                    &mut local_pv,
                    false,
                );
                position.unmake_nullmove();

                if !self.searching() {
                    return Score::DRAW;
                }
                if score >= bounds.beta {
                    return bounds.beta;
                }
            }

            /****************************************************************
             * Internal iterative deepening: with no hash move to try first,
             * a reduced search is cheaper than ordering blind
             ****************************************************************/
            if depth >= 6 && tt_move.is_none() {
                self.negamax::<Node>(position, depth - 2, ply, bounds, &mut local_pv, do_null);
                tt_move = self.ttable.best_move(position.key());
            }
        }

        /********************************************************************
         * The move loop, in principal variation search form: the first move
         * gets the full window, the rest prove themselves against a
         * zero-width window first, reduced when ordered late
         ********************************************************************/
        let killers = self.killers[ply as usize];
        let mut picker = MovePicker::new(tt_move, killers);

        let mut legal = 0usize;
        let mut best = -Score::INF;
        let mut best_move = Move::NONE;
        let mut bound = Bound::Upper;

        while let Some(m) = picker.next(position, &self.history) {
            let is_quiet = !position.is_capture(m);

            position.make_move(m);
            if position.opponent_in_check() {
                position.unmake_move(m);
                continue;
            }
            legal += 1;

            let gives_check = position.in_check();

            let score = if legal == 1 {
                -self.negamax::<Node::Next>(
                    position,
                    depth - 1,
                    ply + 1,
                    -bounds,
                    &mut local_pv,
                    true,
                )
            } else {
                /********************************************************
                 * Late move reductions
                 ********************************************************/
                let mut reduction = 0;
                if depth >= 3 && is_quiet && !in_check && !gives_check {
                    reduction = self.reductions[depth.min(63) as usize][legal.min(63)] as i32;
                    // Killers have earned a little trust
                    if m == killers[0] || m == killers[1] {
                        reduction -= 1;
                    }
                    reduction = reduction.clamp(0, depth - 2);
                }

                let mut score = -self.negamax::<NonPvNode>(
                    position,
                    depth - 1 - reduction,
                    ply + 1,
                    -bounds.null_alpha(),
                    &mut local_pv,
                    true,
                );

                // A reduced search that raises alpha must be repeated at
                // full depth before it is believed
                if score > bounds.alpha && reduction > 0 {
                    score = -self.negamax::<NonPvNode>(
                        position,
                        depth - 1,
                        ply + 1,
                        -bounds.null_alpha(),
                        &mut local_pv,
                        true,
                    );
                }

                // And a zero-window fail-high inside an open window needs
                // a true full-window re-search
                if score > bounds.alpha && score < bounds.beta {
                    score = -self.negamax::<Node::Next>(
                        position,
                        depth - 1,
                        ply + 1,
                        -bounds,
                        &mut local_pv,
                        true,
                    );
                }

                score
            };

            position.unmake_move(m);

            if !self.searching() {
                return Score::DRAW;
            }

            if score > best {
                best = score;
                best_move = m;

                if score > bounds.alpha {
                    bounds.alpha = score;
                    bound = Bound::Exact;

                    if Node::PV {
                        pv.extend(m, &local_pv);
                    }

                    if bounds.alpha >= bounds.beta {
                        /************************************************
                         * Beta cutoff: remember quiet moves that refute
                         * this line so they are tried earlier next time
                         ************************************************/
                        if is_quiet {
                            let slot = &mut self.killers[ply as usize];
                            if slot[0] != m {
                                slot[1] = slot[0];
                                slot[0] = m;
                            }

                            self.history.update(
                                position.side_to_move(),
                                m,
                                depth * depth,
                            );
                        }

                        self.ttable.store(
                            position.key(),
                            m,
                            bounds.beta,
                            depth as i8,
                            Bound::Lower,
                            ply as i16,
                        );
                        return bounds.beta;
                    }
                }
            }
        }

        // No legal moves: checkmate if in check, stalemate otherwise
        if legal == 0 {
            return if in_check {
                -Score::MATE + ply as i16
            } else {
                Score::DRAW
            };
        }

        self.ttable
            .store(position.key(), best_move, best, depth as i8, bound, ply as i16);

        best
    }

    /// Quiescence search: stand pat, then captures (and promotions) only,
    /// until the position goes quiet.
    fn quiescence(&mut self, position: &mut Position, ply: i32, mut bounds: SearchBounds) -> Score {
        self.tick();
        if !self.searching() {
            return Score::DRAW;
        }
        self.nodes += 1;
        self.seldepth = self.seldepth.max(ply);

        let stand_pat = evaluate(position);
        if ply >= MAX_PLY {
            return stand_pat;
        }

        if stand_pat >= bounds.beta {
            return bounds.beta;
        }
        if stand_pat > bounds.alpha {
            bounds.alpha = stand_pat;
        }

        let mut moves = MoveList::new();
        generate(position, GenType::Captures, &mut moves);

        let mut scores: ArrayVec<i32, { crate::MAX_MOVES }> = moves
            .iter()
            .map(|&m| {
                let victim = if m.is_en_passant() {
                    PieceKind::Pawn.value()
                } else {
                    position.piece_at(m.to()).map_or(0, |p| p.kind().value())
                };
                let attacker = position.piece_at(m.from()).unwrap().kind().value();
                victim * 10 - attacker
            })
            .collect();

        for i in 0..moves.len() {
            // Selection sort: float the best remaining capture to slot i
            for j in i + 1..moves.len() {
                if scores[j] > scores[i] {
                    moves.swap(i, j);
                    scores.swap(i, j);
                }
            }
            let m = moves[i];

            /****************************************************************
             * Delta pruning: if even winning the victim outright cannot lift
             * the score to alpha, don't bother searching the capture
             ****************************************************************/
            let victim = if m.is_en_passant() {
                PieceKind::Pawn.value()
            } else {
                position.piece_at(m.to()).map_or(0, |p| p.kind().value())
            };
            if !m.is_promotion()
                && stand_pat + Score::new((victim + DELTA_MARGIN) as i16) <= bounds.alpha
            {
                continue;
            }

            position.make_move(m);
            if position.opponent_in_check() {
                position.unmake_move(m);
                continue;
            }

            let score = -self.quiescence(position, ply + 1, -bounds);
            position.unmake_move(m);

            if !self.searching() {
                return Score::DRAW;
            }

            if score >= bounds.beta {
                return bounds.beta;
            }
            if score > bounds.alpha {
                bounds.alpha = score;
            }
        }

        bounds.alpha
    }

    /// Returns `true` while the search may continue.
    #[inline(always)]
    fn searching(&self) -> bool {
        self.is_searching.load(Ordering::Acquire)
    }

    /// Periodic bookkeeping: every 2048 nodes, publish this worker's node
    /// count; worker 0 also enforces the hard deadline and the node cap.
    #[inline(always)]
    fn tick(&mut self) {
        if self.nodes & 2047 != 0 {
            return;
        }

        self.flush_nodes();

        if self.id == 0
            && (self.config.starttime.elapsed() >= self.config.hard_timeout
                || self.global_nodes.load(Ordering::Relaxed) >= self.config.max_nodes)
        {
            self.is_searching.store(false, Ordering::Release);
        }
    }

    #[inline(always)]
    fn flush_nodes(&mut self) {
        self.global_nodes
            .fetch_add(self.nodes - self.flushed, Ordering::Relaxed);
        self.flushed = self.nodes;
    }

    /// Prints the `info` line for a completed iteration.
    fn send_iteration_info(&mut self, result: &SearchResult) {
        self.flush_nodes();
        let elapsed = self.config.starttime.elapsed();
        let nodes = self.global_nodes.load(Ordering::Relaxed);
        let nps = (nodes as f32 / elapsed.as_secs_f32()).trunc();

        let info = UciInfo::new()
            .depth(result.depth)
            .seldepth(result.seldepth)
            .score(result.score.into_uci())
            .nodes(nodes)
            .nps(nps)
            .time(elapsed.as_millis())
            .pv(result.pv.iter().map(|m| m.to_string()));

        let response: UciResponse<String> = UciResponse::info(info);
        println!("{response}");
    }

    /// Prints an `info string` diagnostic.
    fn send_string<T: fmt::Display>(&self, message: T) {
        let response: UciResponse<String> = UciResponse::info_string(message.to_string());
        println!("{response}");
    }
}

/// The first legal move of `position`, or [`Move::NONE`] if there are none.
fn first_legal_move(position: &mut Position) -> Move {
    let mut moves = MoveList::new();
    generate(position, GenType::All, &mut moves);

    for m in moves {
        position.make_move(m);
        let legal = !position.opponent_in_check();
        position.unmake_move(m);
        if legal {
            return m;
        }
    }

    Move::NONE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FEN_STARTPOS;

    fn run_search(fen: &str, config: SearchConfig) -> SearchResult {
        let position = Position::from_fen(fen).unwrap();
        let is_searching = Arc::new(AtomicBool::new(true));

        Search::<LogNone>::new(
            0,
            config,
            SearchParameters::default(),
            is_searching,
            Arc::new(TTable::new(16)),
            Arc::new(HistoryTable::new()),
            Arc::new(AtomicU64::new(0)),
        )
        .start(&position)
    }

    fn depth_config(depth: i32) -> SearchConfig {
        SearchConfig {
            max_depth: depth,
            ..Default::default()
        }
    }

    #[test]
    fn test_mate_in_one() {
        let res = run_search("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", depth_config(3));

        assert_eq!(res.bestmove.to_string(), "a1a8");
        assert!(res.score.is_mate(), "expected mate score, got {:?}", res.score);
        assert_eq!(res.score.moves_to_mate(), 1);
    }

    #[test]
    fn test_mated_in_one() {
        // Black's only move walks into Qb7 mate
        let res = run_search("1k6/8/KQ6/2Q5/8/8/8/8 b - - 0 1", depth_config(3));
        assert!(res.score.is_mate());
        assert_eq!(res.score.moves_to_mate(), -1);
        assert_eq!(res.bestmove.to_string(), "b8a8");
    }

    /// Asserts that the bestmove for `fen` does not throw a win away by
    /// stalemating the opponent.
    fn assert_no_stalemate(fen: &str, depth: i32) -> SearchResult {
        let res = run_search(fen, depth_config(depth));

        let mut position = Position::from_fen(fen).unwrap();
        let mut moves = MoveList::new();
        generate(&position, GenType::All, &mut moves);
        let mv = moves
            .into_iter()
            .find(|m| m.to_string() == res.bestmove.to_string())
            .expect("bestmove must be generated");
        position.make_move(mv);

        // If the reply has no legal moves, it had better be mate
        if first_legal_move(&mut position).is_none() {
            assert!(position.in_check(), "{} stalemates after {mv}", fen);
        }

        res
    }

    #[test]
    fn test_stalemate_is_avoided() {
        // With king support, the queen can simply deliver mate; what it must
        // never do is leave the bare king with no move and no check
        let res = assert_no_stalemate("7k/5Q2/6K1/8/8/8/8/8 w - - 0 1", 3);
        assert!(res.score.is_mate());

        // The tempting approach Qc7 here is the classic stalemate blunder;
        // Qc8 mates instead
        let res = assert_no_stalemate("k7/8/1K6/8/8/8/2Q5/8 w - - 0 1", 4);
        assert_ne!(res.bestmove.to_string(), "c2c7");
        assert!(res.score.is_mate());
    }

    #[test]
    fn test_hanging_queen_is_taken() {
        let res = run_search("4k3/8/8/3q4/3R4/8/8/4K3 w - - 0 1", depth_config(4));
        assert_eq!(res.bestmove.to_string(), "d4d5");
    }

    #[test]
    fn test_no_legal_moves_reports_none() {
        // Stalemate position, Black to move
        let res = run_search("k7/8/KQ6/8/8/8/8/8 b - - 0 1", depth_config(3));
        assert!(res.bestmove.is_none());
        assert_eq!(res.score, Score::DRAW);
    }

    #[test]
    fn test_zero_time_still_finds_a_move() {
        let config = SearchConfig {
            soft_timeout: Duration::ZERO,
            hard_timeout: Duration::ZERO,
            ..Default::default()
        };
        let res = run_search(FEN_STARTPOS, config);
        assert!(!res.bestmove.is_none());
    }

    #[test]
    fn test_mate_scores_stay_in_bounds() {
        let res = run_search("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", depth_config(5));
        assert!(res.score.inner().abs() > Score::MATE_BOUND.inner());
        assert!(res.score.plies_to_mate() as i32 <= MAX_PLY);
    }

    #[test]
    fn test_deeper_search_is_consistent_on_forced_mate() {
        for depth in [3, 4, 5] {
            let res = run_search("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", depth_config(depth));
            assert_eq!(res.bestmove.to_string(), "a1a8", "failed at depth {depth}");
        }
    }
}
