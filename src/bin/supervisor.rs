// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Usage:
//   supervisor
//
// Creates the shared ring buffer, reports every strictly better solution the
// generators find and stops on a conflict-free coloring or SIGINT/SIGTERM.
// Only one supervisor per namespace (TRICOLOR_NAMESPACE) can run at a time.

use std::process::ExitCode;

use tricolor::{logging, signal, Config, ConsoleReporter, Error, Outcome, SupervisorContext};

fn run(prog: &str, extra: &[String]) -> tricolor::Result<()> {
    if !extra.is_empty() {
        return Err(Error::Usage(format!("usage: {prog} (takes no arguments)")));
    }

    let config = Config::from_env()?;
    let stop = signal::install().map_err(|source| Error::Create {
        op: "sigaction",
        source,
    })?;
    let mut ctx = SupervisorContext::create(&config, stop)?;

    let outcome = ctx.run(&mut ConsoleReporter)?;
    if outcome == Outcome::Interrupted {
        match ctx.tracker().best() {
            Some(best) => println!("best solution so far has {} edges: {best}", best.len()),
            None => println!("no solution received"),
        }
    }
    ctx.teardown();
    println!("exit gracefully");
    Ok(())
}

fn main() -> ExitCode {
    let mut args = std::env::args();
    let prog = args.next().unwrap_or_else(|| "supervisor".into());
    let extra: Vec<String> = args.collect();

    logging::init();
    match run(&prog, &extra) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[{prog}]: {e}");
            ExitCode::FAILURE
        }
    }
}
