// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Usage:
//   generator EDGE1 EDGE2 ...      (each EDGE is "<u> <v>")
//
// Attaches to a running supervisor's ring buffer and keeps publishing the
// conflicting edges of random 3-colorings until the supervisor stops.

use std::process::ExitCode;

use tricolor::{logging, signal, Config, Error, GeneratorContext, GeneratorExit, Graph};

fn run(prog: &str, edges: &[String]) -> tricolor::Result<()> {
    if edges.is_empty() {
        return Err(Error::Usage(format!("usage: {prog} EDGE1 EDGE2 ...")));
    }

    // Parse before touching any shared resource.
    let graph = Graph::parse(edges)?;
    let config = Config::from_env()?;
    print!("{graph}");

    let stop = signal::install().map_err(|source| Error::Create {
        op: "sigaction",
        source,
    })?;
    let mut ctx = GeneratorContext::attach(&config, graph, stop)?;

    match ctx.run()? {
        GeneratorExit::SupervisorDone => println!("supervisor finished, exiting gracefully"),
        GeneratorExit::Interrupted => println!("interrupted, exiting gracefully"),
    }
    Ok(())
}

fn main() -> ExitCode {
    let mut args = std::env::args();
    let prog = args.next().unwrap_or_else(|| "generator".into());
    let edges: Vec<String> = args.collect();

    logging::init();
    match run(&prog, &edges) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[{prog}]: {e}");
            ExitCode::FAILURE
        }
    }
}
