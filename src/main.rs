/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use newt::{init_attack_tables, parse_line, CustomCommand, Engine, EngineCommand};

fn main() {
    init_attack_tables();

    let mut engine = Engine::new();

    // A command supplied on the command line is executed and then the engine
    // exits; otherwise the interactive event loop runs.
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        let line = args.join(" ");
        match parse_line(&line) {
            Ok(cmd) => {
                engine.send_command(cmd);
                engine.send_command(EngineCommand::Custom(CustomCommand::Exit));
            }
            Err(err) => {
                eprintln!("{err:#}");
                return;
            }
        }
    }

    engine.run();
}
