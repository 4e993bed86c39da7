//! Play command - line-oriented session over stdin
//!
//! Commands: `swap r1 c1 r2 c2`, `hint`, `show`, `restart`, `quit`.
//! Each swap is settled immediately and its events are printed.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use matchgrid_core::{Cell, Engine, EngineConfig, EngineEvent};

const HELP: &str = "commands: swap r1 c1 r2 c2 | hint | show | restart | quit";

/// A parsed input line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    Swap(Cell, Cell),
    Hint,
    Show,
    Restart,
    Quit,
}

pub fn run(config: EngineConfig) -> Result<()> {
    let mut engine = Engine::new(config)?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_session(&mut engine, stdin.lock(), stdout.lock())
}

/// Drive an engine from `input` until `quit` or end of input
fn run_session<R: BufRead, W: Write>(engine: &mut Engine, input: R, mut out: W) -> Result<()> {
    writeln!(out, "{}", HELP)?;
    print_events(&mut out, engine.drain_events())?;
    write!(out, "{}", engine.snapshot().board)?;

    for line in input.lines() {
        let line = line.context("Failed to read input")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let command = match parse_command(line) {
            Ok(command) => command,
            Err(msg) => {
                writeln!(out, "error: {}", msg)?;
                continue;
            }
        };

        match command {
            Command::Swap(a, b) => {
                let outcome = engine.request_swap(a, b);
                tracing::debug!(?outcome, "swap requested");
                engine.settle();
                print_events(&mut out, engine.drain_events())?;
                write!(out, "{}", engine.snapshot().board)?;
            }
            Command::Hint => match engine.hint() {
                Some((a, b)) => writeln!(out, "hint: swap {} {} {} {}", a.row, a.col, b.row, b.col)?,
                None => writeln!(out, "hint: none")?,
            },
            Command::Show => write!(out, "{}", engine.snapshot().board)?,
            Command::Restart => {
                engine.reset();
                print_events(&mut out, engine.drain_events())?;
                write!(out, "{}", engine.snapshot().board)?;
            }
            Command::Quit => break,
        }
    }

    out.flush()?;
    Ok(())
}

fn parse_command(line: &str) -> Result<Command, String> {
    let mut parts = line.split_whitespace();
    let word = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    match (word, args.len()) {
        ("swap", 4) => {
            let n = args
                .iter()
                .map(|s| s.parse::<usize>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| format!("bad coordinate: {}", e))?;
            Ok(Command::Swap(Cell::new(n[0], n[1]), Cell::new(n[2], n[3])))
        }
        ("swap", _) => Err("usage: swap r1 c1 r2 c2".to_string()),
        ("hint", 0) => Ok(Command::Hint),
        ("show", 0) => Ok(Command::Show),
        ("restart", 0) => Ok(Command::Restart),
        ("quit", 0) | ("exit", 0) => Ok(Command::Quit),
        _ => Err(format!("unknown command '{}'; {}", line, HELP)),
    }
}

fn print_events<W: Write>(out: &mut W, events: Vec<EngineEvent>) -> io::Result<()> {
    for event in events {
        match event {
            EngineEvent::SwapAccepted { a, b } => writeln!(out, "swap {} <-> {}", a, b)?,
            EngineEvent::SwapRejected { a, b, reason } => {
                writeln!(out, "rejected {} <-> {}: {:?}", a, b, reason)?
            }
            EngineEvent::CascadeChainStep { step, cells } => {
                writeln!(out, "chain {}: {} cleared", step, cells.len())?
            }
            EngineEvent::Refilled { spawned } => writeln!(out, "refilled {}", spawned.len())?,
            EngineEvent::CascadeSettled { chain } => writeln!(out, "settled after {} steps", chain)?,
            EngineEvent::Reshuffled { forced } => {
                writeln!(out, "reshuffled{}", if forced { " (forced)" } else { "" })?
            }
            EngineEvent::Restarted => writeln!(out, "restarted")?,
        }
    }
    Ok(())
}
