//! Simulate command - autoplay seeded games with hinted swaps
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: play_games(), report_results()
//! - Level 3: play_single_game(), compute_statistics()
//! - Level 4: counting factory, formatting utilities

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use clap::Args;
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use matchgrid_core::{
    Cell, Engine, EngineConfig, EngineEvent, Piece, PieceFactory, PiecePool, Symbol,
    SwapOutcome,
};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct SimulateArgs {
    /// Number of independent games
    #[arg(long, default_value = "100")]
    pub games: usize,

    /// Maximum swaps per game
    #[arg(long, default_value = "50")]
    pub moves: usize,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Statistics for one autoplayed game
#[derive(Clone, Debug)]
struct GameRecord {
    game_number: usize,
    seed: u64,
    swaps: usize,
    chain_steps: u32,
    longest_chain: u32,
    pieces_cleared: u64,
    cleared_by_symbol: FxHashMap<Symbol, u64>,
    reshuffles: usize,
    forced_repairs: usize,
    /// Stopped early because no hint was available
    stalled: bool,
}

/// Aggregated simulation results
#[derive(Clone, Debug)]
struct SimulationResults {
    games: Vec<GameRecord>,
    total_swaps: usize,
    total_chain_steps: u32,
    longest_chain: u32,
    pieces_cleared: u64,
    cleared_by_symbol: FxHashMap<Symbol, u64>,
    reshuffles: usize,
    forced_repairs: usize,
    avg_chain: f32,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run simulate command
///
/// 1. Play every game in parallel, one seed each
/// 2. Aggregate the per-game records
/// 3. Report results
pub fn run(args: SimulateArgs, config: EngineConfig, seed: Option<u64>) -> Result<()> {
    if args.games == 0 {
        bail!("--games must be at least 1");
    }

    let base_seed = seed.or(config.seed).unwrap_or(42);
    tracing::info!(
        "Simulating {} games ({}x{}, {} symbols, up to {} swaps, base seed {})",
        args.games,
        config.rows,
        config.cols,
        config.symbols,
        args.moves,
        base_seed
    );

    let games = play_games(&config, args.games, args.moves, base_seed)?;
    let results = compute_statistics(games);

    report_results(&results, &args);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Play all games in parallel using rayon
fn play_games(
    config: &EngineConfig,
    games: usize,
    moves: usize,
    base_seed: u64,
) -> Result<Vec<GameRecord>> {
    (0..games)
        .into_par_iter()
        .map(|i| {
            let seed = base_seed.wrapping_add(i as u64);
            play_single_game(config, i + 1, seed, moves)
        })
        .collect()
}

/// Report simulation results
fn report_results(results: &SimulationResults, args: &SimulateArgs) {
    if args.json {
        print_json_results(results);
    } else {
        print_text_results(results);
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Autoplay one game, always taking the hinted swap
fn play_single_game(
    config: &EngineConfig,
    game_number: usize,
    seed: u64,
    moves: usize,
) -> Result<GameRecord> {
    let config = config.clone().with_seed(seed);
    let mut engine = Engine::with_factory(config, ClearTally::default())?;

    let mut record = GameRecord {
        game_number,
        seed,
        swaps: 0,
        chain_steps: 0,
        longest_chain: 0,
        pieces_cleared: 0,
        cleared_by_symbol: FxHashMap::default(),
        reshuffles: 0,
        forced_repairs: 0,
        stalled: false,
    };
    tally_events(&mut record, engine.drain_events());

    for _ in 0..moves {
        let Some((a, b)) = engine.hint() else {
            record.stalled = true;
            break;
        };
        if engine.request_swap(a, b) != SwapOutcome::Accepted {
            tracing::warn!(game_number, %a, %b, "hinted swap was not accepted");
            record.stalled = true;
            break;
        }
        engine.settle();
        tally_events(&mut record, engine.drain_events());
    }

    let tally = engine.factory();
    record.pieces_cleared = tally.cleared.values().sum();
    record.cleared_by_symbol = tally.cleared.clone();

    tracing::debug!(
        game_number,
        swaps = record.swaps,
        chain_steps = record.chain_steps,
        "game finished"
    );
    Ok(record)
}

/// Fold engine events into a game record
fn tally_events(record: &mut GameRecord, events: Vec<EngineEvent>) {
    for event in events {
        match event {
            EngineEvent::SwapAccepted { .. } => record.swaps += 1,
            EngineEvent::CascadeChainStep { .. } => record.chain_steps += 1,
            EngineEvent::CascadeSettled { chain } => {
                record.longest_chain = record.longest_chain.max(chain);
            }
            EngineEvent::Reshuffled { forced } => {
                record.reshuffles += 1;
                if forced {
                    record.forced_repairs += 1;
                }
            }
            EngineEvent::SwapRejected { .. }
            | EngineEvent::Refilled { .. }
            | EngineEvent::Restarted => {}
        }
    }
}

/// Compute aggregate statistics from game records
fn compute_statistics(games: Vec<GameRecord>) -> SimulationResults {
    let mut cleared_by_symbol: FxHashMap<Symbol, u64> = FxHashMap::default();
    for game in &games {
        for (&symbol, &count) in &game.cleared_by_symbol {
            *cleared_by_symbol.entry(symbol).or_insert(0) += count;
        }
    }

    let total_swaps: usize = games.iter().map(|g| g.swaps).sum();
    let total_chain_steps: u32 = games.iter().map(|g| g.chain_steps).sum();
    let avg_chain = if total_swaps == 0 {
        0.0
    } else {
        total_chain_steps as f32 / total_swaps as f32
    };

    SimulationResults {
        total_swaps,
        total_chain_steps,
        longest_chain: games.iter().map(|g| g.longest_chain).max().unwrap_or(0),
        pieces_cleared: games.iter().map(|g| g.pieces_cleared).sum(),
        reshuffles: games.iter().map(|g| g.reshuffles).sum(),
        forced_repairs: games.iter().map(|g| g.forced_repairs).sum(),
        cleared_by_symbol,
        avg_chain,
        games,
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Pool that counts every piece handed back to it, by symbol.
///
/// The engine only releases pieces when a match is removed (or on restart,
/// which simulations never do), so releases are exactly the cleared pieces.
#[derive(Default)]
struct ClearTally {
    pool: PiecePool,
    cleared: FxHashMap<Symbol, u64>,
}

impl PieceFactory for ClearTally {
    fn acquire(&mut self, symbol: Symbol, cell: Cell) -> Piece {
        self.pool.acquire(symbol, cell)
    }

    fn release(&mut self, piece: Piece) {
        *self.cleared.entry(piece.symbol).or_insert(0) += 1;
        self.pool.release(piece);
    }
}

/// Symbol counts keyed by letter, in letter order
fn by_letter(counts: &FxHashMap<Symbol, u64>) -> BTreeMap<String, u64> {
    counts
        .iter()
        .map(|(symbol, &count)| (symbol.to_string(), count))
        .collect()
}

/// Print results as JSON
fn print_json_results(results: &SimulationResults) {
    #[derive(serde::Serialize)]
    struct JsonGame {
        game_number: usize,
        seed: u64,
        swaps: usize,
        chain_steps: u32,
        longest_chain: u32,
        pieces_cleared: u64,
        cleared_by_symbol: BTreeMap<String, u64>,
        reshuffles: usize,
        forced_repairs: usize,
        stalled: bool,
    }

    #[derive(serde::Serialize)]
    struct JsonOutput {
        total_games: usize,
        total_swaps: usize,
        total_chain_steps: u32,
        avg_chain: f32,
        longest_chain: u32,
        pieces_cleared: u64,
        cleared_by_symbol: BTreeMap<String, u64>,
        reshuffles: usize,
        forced_repairs: usize,
        games: Vec<JsonGame>,
    }

    let output = JsonOutput {
        total_games: results.games.len(),
        total_swaps: results.total_swaps,
        total_chain_steps: results.total_chain_steps,
        avg_chain: results.avg_chain,
        longest_chain: results.longest_chain,
        pieces_cleared: results.pieces_cleared,
        cleared_by_symbol: by_letter(&results.cleared_by_symbol),
        reshuffles: results.reshuffles,
        forced_repairs: results.forced_repairs,
        games: results
            .games
            .iter()
            .map(|g| JsonGame {
                game_number: g.game_number,
                seed: g.seed,
                swaps: g.swaps,
                chain_steps: g.chain_steps,
                longest_chain: g.longest_chain,
                pieces_cleared: g.pieces_cleared,
                cleared_by_symbol: by_letter(&g.cleared_by_symbol),
                reshuffles: g.reshuffles,
                forced_repairs: g.forced_repairs,
                stalled: g.stalled,
            })
            .collect(),
    };

    if let Ok(json) = serde_json::to_string_pretty(&output) {
        println!("{}", json);
    }
}

/// Print results as text
fn print_text_results(results: &SimulationResults) {
    println!("\n=== Simulation Results ===");
    println!("Games:          {}", results.games.len());
    println!("Swaps:          {}", results.total_swaps);
    println!(
        "Chain steps:    {} ({:.2} per swap)",
        results.total_chain_steps, results.avg_chain
    );
    println!("Longest chain:  {}", results.longest_chain);
    println!("Pieces cleared: {}", results.pieces_cleared);
    for (letter, count) in by_letter(&results.cleared_by_symbol) {
        println!("  {}: {}", letter, count);
    }
    println!(
        "Reshuffles:     {} ({} forced)",
        results.reshuffles, results.forced_repairs
    );

    println!("\nGame details:");
    for game in &results.games {
        println!(
            "  Game {} (seed {}): {} swaps, {} steps, longest chain {}{}",
            game.game_number,
            game.seed,
            game.swaps,
            game.chain_steps,
            game.longest_chain,
            if game.stalled { ", stalled" } else { "" }
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================
