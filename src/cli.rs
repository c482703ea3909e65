/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use anyhow::{anyhow, Result};
use clap::Parser;
use uci_parser::{UciCommand, UciParseError};

/// A command for the engine's event loop: either a standard UCI command or
/// one of the engine's own commands.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    Uci(UciCommand),
    Custom(CustomCommand),
}

/// The engine's own commands, for poking at it from a terminal.
#[derive(Debug, Clone, Parser)]
#[command(multicall = true, about, rename_all = "lower")]
pub enum CustomCommand {
    /// Print a visual representation of the current board state.
    #[command(alias = "d")]
    Display,

    /// Print the static evaluation of the current position.
    Eval,

    /// Print the FEN string of the current position.
    Fen,

    /// Count leaf nodes of the move tree to the given depth.
    Perft {
        #[arg(default_value = "1")]
        depth: usize,
    },

    /// Perft with a per-root-move breakdown.
    #[command(alias = "sperft")]
    Splitperft {
        #[arg(default_value = "1")]
        depth: usize,
    },

    /// Quit the engine.
    Exit,
}

/// Parses one input line, trying UCI first and the engine's own commands
/// second, since UCI is the primary use case.
pub fn parse_line(line: &str) -> Result<EngineCommand> {
    match UciCommand::new(line) {
        Ok(cmd) => Ok(EngineCommand::Uci(cmd)),

        // Not a UCI command; try the custom commands
        Err(UciParseError::UnrecognizedCommand { cmd: _ }) => {
            CustomCommand::try_parse_from(line.split_ascii_whitespace())
                .map(EngineCommand::Custom)
                .map_err(|err| anyhow!("{err}"))
        }

        // It was a UCI command, just a malformed one
        Err(uci_err) => Err(anyhow!("{uci_err}")),
    }
}
