//! Solvability guarantee and hint search
//!
//! A board is solvable when at least one adjacent swap would produce a
//! match. `shuffle` permutes the symbols already on the board and falls
//! back to `force_create_valid_moves` when the permutation is dead.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::board::{Board, Cell};
use crate::matcher::{find_matches, would_create_match, MIN_RUN};
use crate::symbol::{Symbol, SymbolSet};

/// How a reshuffle reached a solvable board
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShuffleOutcome {
    /// A plain permutation was enough
    Shuffled,
    /// Symbols were overwritten to plant a move
    Forced,
}

impl ShuffleOutcome {
    pub fn is_forced(self) -> bool {
        self == ShuffleOutcome::Forced
    }
}

/// Can any layout of these dimensions admit a match-producing swap?
pub fn is_playable(rows: usize, cols: usize) -> bool {
    (rows >= 2 && cols >= MIN_RUN)
        || (rows >= MIN_RUN && cols >= 2)
        || (rows == 1 && cols > MIN_RUN)
        || (cols == 1 && rows > MIN_RUN)
}

/// Every horizontal and vertical neighbor pair once, row-major,
/// the right neighbor before the one below
pub fn adjacent_pairs(rows: usize, cols: usize) -> impl Iterator<Item = (Cell, Cell)> {
    (0..rows * cols).flat_map(move |i| {
        let cell = Cell::new(i / cols, i % cols);
        let right = (cell.col + 1 < cols).then(|| (cell, cell.right()));
        let below = (cell.row + 1 < rows).then(|| (cell, cell.below()));
        right.into_iter().chain(below)
    })
}

/// First swap (in scan order) that would produce a match
pub fn find_hint(board: &Board) -> Option<(Cell, Cell)> {
    adjacent_pairs(board.rows(), board.cols()).find(|&(a, b)| would_create_match(board, a, b))
}

pub fn has_valid_moves(board: &Board) -> bool {
    find_hint(board).is_some()
}

/// Fisher-Yates permutation of the placed symbols, written back row-major.
///
/// Forces a move if the permutation leaves the board unsolvable.
pub fn shuffle<R: Rng + ?Sized>(board: &mut Board, symbols: SymbolSet, rng: &mut R) -> ShuffleOutcome {
    let mut layout = board.symbols();
    layout.shuffle(rng);

    let cells: Vec<Cell> = board.pieces().map(|p| p.cell()).collect();
    for (cell, symbol) in cells.into_iter().zip(layout) {
        board.set_symbol(cell, symbol);
    }

    if has_valid_moves(board) {
        ShuffleOutcome::Shuffled
    } else {
        force_create_valid_moves(board, symbols, rng);
        ShuffleOutcome::Forced
    }
}

/// Shuffle until the board is solvable and holds no run, up to `max_attempts`
/// permutations, then rebuild it from a pattern that is both.
pub fn reshuffle_until_clean<R: Rng + ?Sized>(
    board: &mut Board,
    symbols: SymbolSet,
    rng: &mut R,
    max_attempts: usize,
) -> ShuffleOutcome {
    let mut forced = false;
    for attempt in 0..max_attempts {
        forced |= shuffle(board, symbols, rng).is_forced();
        if find_matches(board).is_empty() {
            tracing::debug!(attempt, forced, "reshuffle produced a clean board");
            return if forced { ShuffleOutcome::Forced } else { ShuffleOutcome::Shuffled };
        }
    }

    tracing::warn!(max_attempts, "reshuffle kept producing runs, rebuilding layout");
    rebuild_pattern(board, symbols, rng);
    ShuffleOutcome::Forced
}

/// Plant one guaranteed move.
///
/// Tries a small cluster near the centre first; if no symbol choice works
/// there, rewrites the whole layout. Afterwards `has_valid_moves` holds for
/// every full board with playable dimensions and at least three symbols.
pub fn force_create_valid_moves<R: Rng + ?Sized>(board: &mut Board, symbols: SymbolSet, rng: &mut R) {
    tracing::warn!(
        rows = board.rows(),
        cols = board.cols(),
        "no valid move after shuffle, forcing one"
    );

    if plant_centre_cluster(board, symbols, rng) {
        return;
    }
    rebuild_pattern(board, symbols, rng);
}

/// Cluster cells around the centre: `[left, middle, right, partner]`, where
/// `left`/`right` get T, `middle` gets U and `partner` (beside `middle`) gets T,
/// so swapping `middle` with `partner` lines up three T's.
fn centre_cluster(rows: usize, cols: usize) -> Option<[Cell; 4]> {
    if cols >= MIN_RUN && rows >= 2 {
        let r = rows / 2;
        let c = (cols / 2).min(cols - MIN_RUN);
        let partner_row = if r + 1 < rows { r + 1 } else { r - 1 };
        Some([
            Cell::new(r, c),
            Cell::new(r, c + 1),
            Cell::new(r, c + 2),
            Cell::new(partner_row, c + 1),
        ])
    } else if rows >= MIN_RUN && cols >= 2 {
        let c = cols / 2;
        let r = (rows / 2).min(rows - MIN_RUN);
        let partner_col = if c + 1 < cols { c + 1 } else { c - 1 };
        Some([
            Cell::new(r, c),
            Cell::new(r + 1, c),
            Cell::new(r + 2, c),
            Cell::new(r + 1, partner_col),
        ])
    } else {
        None
    }
}

fn plant_centre_cluster<R: Rng + ?Sized>(board: &mut Board, symbols: SymbolSet, rng: &mut R) -> bool {
    let cluster = match centre_cluster(board.rows(), board.cols()) {
        Some(c) => c,
        None => return false,
    };
    if cluster.iter().any(|&c| board.get(c).is_none()) {
        return false;
    }

    let saved: Vec<Symbol> = cluster.iter().filter_map(|&c| board.get(c).map(|p| p.symbol)).collect();
    let n = symbols.len();
    let offset = rng.gen_range(0..n);

    for ti in 0..n {
        let target = Symbol(((offset + ti) % n) as u8);
        for ui in 1..n {
            let other = Symbol(((target.0 as usize + ui) % n) as u8);
            let [left, middle, right, partner] = cluster;
            board.set_symbol(left, target);
            board.set_symbol(middle, other);
            board.set_symbol(right, target);
            board.set_symbol(partner, target);

            let runs = find_matches(board);
            if !cluster.iter().any(|c| runs.contains(c)) && has_valid_moves(board) {
                tracing::debug!(target = %target, other = %other, "planted move at centre cluster");
                return true;
            }
        }
    }

    for (&cell, &symbol) in cluster.iter().zip(&saved) {
        board.set_symbol(cell, symbol);
    }
    false
}

/// Overwrite every piece with a two-symbol layout that has no run and at least one move.
///
/// Lines use `T T U T U T ...` (swap cells 2 and 3); grids use a checkerboard,
/// where any vertical swap in an interior column lines up three in a row.
fn rebuild_pattern<R: Rng + ?Sized>(board: &mut Board, symbols: SymbolSet, rng: &mut R) {
    let first = symbols.random(rng);
    let second = symbols.random_excluding(rng, &[first]).unwrap_or(first);
    let (rows, cols) = (board.rows(), board.cols());

    tracing::debug!(rows, cols, "rebuilding layout from pattern");

    for cell in board.positions().collect::<Vec<_>>() {
        let symbol = if rows == 1 || cols == 1 {
            let k = cell.row + cell.col;
            match k {
                0 | 1 | 3 => first,
                2 => second,
                _ if k % 2 == 1 => first,
                _ => second,
            }
        } else if (cell.row + cell.col) % 2 == 0 {
            first
        } else {
            second
        };
        board.set_symbol(cell, symbol);
    }
}
