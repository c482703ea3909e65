/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    io::{self, BufRead},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        mpsc::{channel, Receiver, Sender},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use threadpool::ThreadPool;
use uci_parser::{UciCommand, UciOption, UciResponse, UciSearchOptions};

use crate::{
    evaluate, generate, parse_line, perft, splitperft, CustomCommand, EngineCommand, GenType,
    HistoryTable, LogDebug, LogInfo, LogLevel, LogNone, Move, MoveList, Position, Search,
    SearchConfig, SearchParameters, SearchResult, TTable, Tunables,
};

/// Upper bound for the `Threads` option.
const MAX_THREADS: usize = 128;

/// The engine: a UCI event loop around a position and a parallel search.
pub struct Engine {
    /// The position the next `go` will search.
    position: Position,

    /// Sends commands into the event loop.
    sender: Sender<EngineCommand>,

    /// The event loop's end of the channel.
    receiver: Receiver<EngineCommand>,

    /// True while a search runs. Cleared by `stop`, the time manager, or the
    /// search finishing on its own; every worker checks it continuously.
    is_searching: Arc<AtomicBool>,

    /// Handle to worker 0, the reporting search thread.
    search_thread: Option<JoinHandle<SearchResult>>,

    /// Pool that runs the Lazy-SMP helper workers.
    helpers: ThreadPool,

    /// Transposition table, shared by all workers.
    ttable: Arc<TTable>,

    /// Quiet-move history, shared by all workers.
    history: Arc<HistoryTable>,

    /// The tunable parameter registry.
    tunables: Tunables,

    /// Worker count for the next `go`.
    threads: usize,

    /// Whether to print extra diagnostics.
    debug: bool,
}

impl Engine {
    pub fn new() -> Self {
        let (sender, receiver) = channel();

        Self {
            position: Position::default(),
            sender,
            receiver,
            is_searching: Arc::default(),
            search_thread: None,
            helpers: ThreadPool::with_name(
                String::from("search helpers"),
                num_cpus::get().saturating_sub(1).max(1),
            ),
            ttable: Arc::new(TTable::default()),
            history: Arc::new(HistoryTable::default()),
            tunables: Tunables::default(),
            threads: 1,
            debug: false,
        }
    }

    /// The engine's name and version.
    pub fn name(&self) -> String {
        format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }

    /// The engine's authors.
    pub fn authors(&self) -> String {
        env!("CARGO_PKG_AUTHORS").replace(':', ", ")
    }

    /// Enqueues a command for the event loop.
    pub fn send_command(&self, command: EngineCommand) {
        // The receiver lives as long as the engine, so this cannot fail
        self.sender
            .send(command)
            .expect("engine command channel closed");
    }

    /// Runs the event loop until `quit`/`exit` or end of input.
    ///
    /// A detached thread reads stdin and feeds the channel; commands are
    /// executed here, in the order received.
    pub fn run(&mut self) {
        let sender = self.sender.clone();
        thread::spawn(move || {
            if let Err(err) = input_handler(sender) {
                eprintln!("input thread stopping: {err:#}");
            }
        });

        while let Ok(cmd) = self.receiver.recv() {
            match cmd {
                EngineCommand::Uci(cmd) => {
                    // The UCI spec says to carry on after unusable input
                    if let Err(err) = self.handle_uci_command(cmd) {
                        eprintln!("{err:#}");
                    }
                }

                EngineCommand::Custom(cmd) => {
                    if self.handle_custom_command(cmd).is_break() {
                        break;
                    }
                }
            }
        }

        self.stop_search();
    }

    fn handle_uci_command(&mut self, uci: UciCommand) -> Result<()> {
        use UciCommand::*;
        match uci {
            Uci => self.uci(),

            Debug(status) => self.debug = status,

            IsReady => println!("{}", UciResponse::<&str>::ReadyOk),

            SetOption { name, value } => self.set_option(&name, value)?,

            Register { name: _, code: _ } => {
                println!("{} requires no registration", self.name())
            }

            UciNewGame => self.new_game(),

            Position { fen, moves } => self.set_position(fen, moves)?,

            Go(options) => self.go(options),

            Stop => {
                self.stop_search();
            }

            Quit => {
                self.stop_search();
                self.send_command(EngineCommand::Custom(CustomCommand::Exit));
            }

            _ => bail!("{} does not support UCI command {uci:?}", self.name()),
        }

        Ok(())
    }

    fn handle_custom_command(&mut self, cmd: CustomCommand) -> std::ops::ControlFlow<()> {
        match cmd {
            CustomCommand::Display => println!("{}", self.position),

            CustomCommand::Eval => println!("{}", evaluate(&self.position)),

            CustomCommand::Fen => println!("{}", self.position.to_fen()),

            CustomCommand::Perft { depth } => {
                let mut pos = self.position.clone();
                println!("{}", perft(&mut pos, depth));
            }

            CustomCommand::Splitperft { depth } => {
                let mut pos = self.position.clone();
                splitperft(&mut pos, depth);
            }

            CustomCommand::Exit => {
                // Let a running search finish and report before quitting;
                // `quit` clears the stop flag first, so it is not delayed
                self.wait_for_search();
                return std::ops::ControlFlow::Break(());
            }
        }

        std::ops::ControlFlow::Continue(())
    }

    /// Blocks until every search worker has returned, without cancelling.
    fn wait_for_search(&mut self) {
        if let Some(handle) = self.search_thread.take() {
            let _ = handle.join();
        }
        self.helpers.join();
    }

    /// Responds to `uci`: identity, the option list, `uciok`.
    fn uci(&self) {
        println!("id name {}", self.name());
        println!("id author {}", self.authors());

        for option in self.options() {
            println!("{}", UciResponse::Option(option));
        }

        println!("{}", UciResponse::<&str>::UciOk);
    }

    /// Every UCI option this engine supports, tunables included.
    fn options(&self) -> Vec<UciOption> {
        let mut options = vec![
            UciOption::button("Clear Hash"),
            UciOption::spin(
                "Hash",
                TTable::DEFAULT_SIZE as i32,
                TTable::MIN_SIZE as i32,
                TTable::MAX_SIZE as i32,
            ),
            UciOption::spin("Threads", 1, 1, MAX_THREADS as i32),
        ];
        options.extend(self.tunables.uci_options());
        options
    }

    /// Routes `setoption` to the built-in options or the tunable registry.
    fn set_option(&mut self, name: &str, value: Option<String>) -> Result<()> {
        match name {
            "Clear Hash" => {
                self.ttable.clear();
                self.history.clear();
            }

            "Hash" => {
                let value = value.context("usage: setoption name Hash value <mb>")?;
                let mb: usize = value
                    .parse()
                    .with_context(|| format!("expected an integer, got {value:?}"))?;

                if self.is_searching() {
                    bail!("cannot resize the hash table during a search");
                }
                // TTable::new clamps to the legal range itself
                self.ttable = Arc::new(TTable::new(mb));
            }

            "Threads" => {
                let value = value.context("usage: setoption name Threads value <n>")?;
                let n: usize = value
                    .parse()
                    .with_context(|| format!("expected an integer, got {value:?}"))?;

                // Takes effect at the next `go`
                self.threads = n.clamp(1, MAX_THREADS);
                self.helpers
                    .set_num_threads(self.threads.saturating_sub(1).max(1));
            }

            _ => {
                let value = value.context("usage: setoption name <name> value <integer>")?;
                let parsed: i32 = value
                    .parse()
                    .with_context(|| format!("expected an integer, got {value:?}"))?;

                // The registry clamps out-of-range values into each
                // parameter's legal interval
                if !self.tunables.set(name, parsed) {
                    bail!("unrecognized option {name:?}");
                }
            }
        }

        if self.debug {
            self.send_string(format!("option {name} updated"));
        }

        Ok(())
    }

    /// Resets everything a new game invalidates: hash tables, history, and
    /// the position itself.
    fn new_game(&mut self) {
        self.stop_search();
        self.ttable.clear();
        self.history.clear();
        self.position = Position::default();
    }

    /// Handles `position [startpos | fen <FEN>] [moves ...]`.
    ///
    /// Moves are applied one by one; a move that does not parse or is not
    /// legal is skipped, and the remaining moves still apply to the position
    /// reached so far.
    fn set_position(&mut self, fen: Option<String>, moves: Vec<String>) -> Result<()> {
        let mut position = match fen {
            Some(fen) => Position::from_fen(&fen)?,
            None => Position::default(),
        };

        for mv_str in moves {
            match find_move(&mut position, &mv_str) {
                Some(m) => position.make_move(m),
                None => self.send_string(format!("skipping unplayable move {mv_str:?}")),
            }
        }

        self.position = position;
        Ok(())
    }

    /// Starts a search on the current position with the limits in `options`.
    ///
    /// Lazy SMP: worker 0 searches and reports on its own thread; workers
    /// 1..N run the same iterative deepening silently on the helper pool.
    /// All of them share the transposition table, the history table, the
    /// node counter, and the stop flag, and nothing else.
    fn go(&mut self, options: UciSearchOptions) {
        if self.is_searching() {
            self.send_string("a search is already running");
            return;
        }

        self.ttable.new_search();
        self.is_searching.store(true, Ordering::Release);

        let overhead =
            Duration::from_millis(self.tunables.get("Move Overhead").unwrap_or(10) as u64);
        let config = SearchConfig::new(options, &self.position, overhead);
        let params = SearchParameters::new(&self.tunables);
        let global_nodes = Arc::new(AtomicU64::new(0));

        for id in 1..self.threads {
            let search = Search::<LogNone>::new(
                id,
                config,
                params,
                Arc::clone(&self.is_searching),
                Arc::clone(&self.ttable),
                Arc::clone(&self.history),
                Arc::clone(&global_nodes),
            );
            let position = self.position.clone();
            self.helpers.execute(move || {
                search.start(&position);
            });
        }

        self.search_thread = Some(if self.debug {
            self.spawn_reporter::<LogDebug>(config, params, global_nodes)
        } else {
            self.spawn_reporter::<LogInfo>(config, params, global_nodes)
        });
    }

    /// Spawns worker 0 on its own thread and returns the handle.
    fn spawn_reporter<Log: LogLevel + Send + 'static>(
        &self,
        config: SearchConfig,
        params: SearchParameters,
        global_nodes: Arc<AtomicU64>,
    ) -> JoinHandle<SearchResult> {
        let search = Search::<Log>::new(
            0,
            config,
            params,
            Arc::clone(&self.is_searching),
            Arc::clone(&self.ttable),
            Arc::clone(&self.history),
            global_nodes,
        );
        let position = self.position.clone();

        thread::spawn(move || search.start(&position))
    }

    /// Signals every worker to stop and waits for them.
    ///
    /// Returns worker 0's result, when there was a search to stop.
    fn stop_search(&mut self) -> Option<SearchResult> {
        self.is_searching.store(false, Ordering::Release);

        let result = self.search_thread.take().and_then(|handle| {
            let id = handle.thread().id();
            handle.join().map_err(|_| {
                self.send_string(format!("failed to join search thread {id:?}"));
            })
            .ok()
        });

        self.helpers.join();
        result
    }

    #[inline(always)]
    fn is_searching(&self) -> bool {
        self.is_searching.load(Ordering::Acquire)
    }

    /// Prints an `info string` message.
    fn send_string<T: std::fmt::Display>(&self, message: T) {
        let response: UciResponse<String> = UciResponse::info_string(message.to_string());
        println!("{response}");
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Finds the legal move of `position` written `mv_str` in long algebraic
/// notation, if there is one.
fn find_move(position: &mut Position, mv_str: &str) -> Option<Move> {
    let wanted = mv_str.to_ascii_lowercase();

    let mut moves = MoveList::new();
    generate(position, GenType::All, &mut moves);

    moves
        .into_iter()
        .find(|m| m.to_string() == wanted && position.is_legal(*m))
}

/// Reads stdin line by line, forwarding parsed commands into the event loop.
///
/// EOF (ctrl-D, or the GUI closing our pipe) quits the engine.
fn input_handler(sender: Sender<EngineCommand>) -> Result<()> {
    let stdin = io::stdin();
    let mut buffer = String::with_capacity(2048);

    loop {
        buffer.clear();
        let bytes = stdin
            .lock()
            .read_line(&mut buffer)
            .context("failed to read from stdin")?;

        if bytes == 0 {
            sender
                .send(EngineCommand::Custom(CustomCommand::Exit))
                .context("failed to send exit on end of input")?;
            return Ok(());
        }

        let line = buffer.trim();
        if line.is_empty() {
            continue;
        }

        match parse_line(line) {
            Ok(cmd) => sender
                .send(cmd)
                .with_context(|| format!("failed to send command {line:?}"))?,

            // Unknown input is reported and otherwise ignored
            Err(err) => eprintln!("{err:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_move_matches_uci_strings() {
        let mut pos = Position::default();
        let m = find_move(&mut pos, "e2e4").unwrap();
        assert_eq!(m.to_string(), "e2e4");

        assert!(find_move(&mut pos, "e2e5").is_none());
        assert!(find_move(&mut pos, "e7e5").is_none());
        assert!(find_move(&mut pos, "nonsense").is_none());
    }

    #[test]
    fn test_find_move_promotions() {
        let mut pos = Position::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let m = find_move(&mut pos, "a7a8q").unwrap();
        assert!(m.is_promotion());

        let m = find_move(&mut pos, "a7a8n").unwrap();
        assert_eq!(m.to_string(), "a7a8n");
    }

    #[test]
    fn test_set_position_skips_unplayable_moves() {
        let mut engine = Engine::new();
        engine
            .set_position(
                None,
                vec![
                    String::from("e2e4"),
                    String::from("zzzz"), // skipped
                    String::from("e7e5"),
                ],
            )
            .unwrap();

        assert_eq!(
            engine.position.to_fen(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2"
        );
    }
}
