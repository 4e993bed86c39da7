//! Board initialization
//!
//! Cells are filled row-major. A draw is rejected when it would complete a
//! run with the two cells to its left or the two above it; later cells are
//! still empty, so that is every run the new cell could close.

use rand::Rng;

use crate::board::{Board, Cell, SymbolGrid};
use crate::config::EngineConfig;
use crate::matcher::find_matches;
use crate::pool::PieceFactory;
use crate::solver::{has_valid_moves, reshuffle_until_clean, shuffle, ShuffleOutcome};
use crate::symbol::Symbol;

/// A freshly built board and what it took to get there
#[derive(Clone, Debug)]
pub struct Generation {
    pub board: Board,
    /// Set when the board had no move and had to be reshuffled
    pub repair: Option<ShuffleOutcome>,
}

/// Build a full, run-free, solvable board
pub fn generate<F, R>(config: &EngineConfig, factory: &mut F, rng: &mut R) -> Generation
where
    F: PieceFactory + ?Sized,
    R: Rng + ?Sized,
{
    let symbols = config.symbol_set();
    let mut board = Board::new(config.rows, config.cols);

    for cell in board.positions().collect::<Vec<_>>() {
        let excluded = completing_symbols(&board, cell);
        let symbol = symbols
            .random_excluding(rng, &excluded)
            .unwrap_or_else(|| symbols.random(rng));
        board.place(cell, factory.acquire(symbol, cell));
    }

    // The guarded fill leaves no run, so this bounded pass only matters if the
    // fill ever falls back to an unguarded draw.
    let mut cleanup_shuffles = 0;
    while !find_matches(&board).is_empty() && cleanup_shuffles < config.max_initial_shuffles {
        shuffle(&mut board, symbols, rng);
        cleanup_shuffles += 1;
    }
    if cleanup_shuffles > 0 {
        tracing::debug!(cleanup_shuffles, "reshuffled initial runs");
    }

    let repair = if has_valid_moves(&board) {
        None
    } else {
        Some(reshuffle_until_clean(
            &mut board,
            symbols,
            rng,
            config.max_reshuffle_attempts,
        ))
    };

    tracing::info!(
        rows = config.rows,
        cols = config.cols,
        symbols = config.symbols,
        repaired = repair.is_some(),
        "board initialized"
    );

    Generation {
        board,
        repair,
    }
}

/// Symbols that would complete a run ending at `cell` from the left or from above
fn completing_symbols(board: &Board, cell: Cell) -> Vec<Symbol> {
    let mut excluded = Vec::with_capacity(2);

    if cell.col >= 2 {
        let a = board.symbol_at(Cell::new(cell.row, cell.col - 1));
        let b = board.symbol_at(Cell::new(cell.row, cell.col - 2));
        if let (Some(a), Some(b)) = (a, b) {
            if a == b {
                excluded.push(a);
            }
        }
    }
    if cell.row >= 2 {
        let a = board.symbol_at(Cell::new(cell.row - 1, cell.col));
        let b = board.symbol_at(Cell::new(cell.row - 2, cell.col));
        if let (Some(a), Some(b)) = (a, b) {
            if a == b && !excluded.contains(&a) {
                excluded.push(a);
            }
        }
    }

    excluded
}
