//! Match detection
//!
//! A match is any run of three or more equal symbols along a row or a
//! column. Empty cells break runs and never match. Nothing here mutates
//! the board: hypothetical swaps are evaluated through [`SwappedView`].

use crate::board::{Cell, SymbolGrid};
use crate::symbol::Symbol;

/// Shortest run that counts as a match
pub const MIN_RUN: usize = 3;

/// A grid seen with two cells exchanged
pub struct SwappedView<'a, G: SymbolGrid + ?Sized> {
    grid: &'a G,
    a: Cell,
    b: Cell,
}

impl<'a, G: SymbolGrid + ?Sized> SwappedView<'a, G> {
    pub fn new(grid: &'a G, a: Cell, b: Cell) -> Self {
        Self { grid, a, b }
    }
}

impl<G: SymbolGrid + ?Sized> SymbolGrid for SwappedView<'_, G> {
    fn rows(&self) -> usize {
        self.grid.rows()
    }

    fn cols(&self) -> usize {
        self.grid.cols()
    }

    fn symbol_at(&self, cell: Cell) -> Option<Symbol> {
        if cell == self.a {
            self.grid.symbol_at(self.b)
        } else if cell == self.b {
            self.grid.symbol_at(self.a)
        } else {
            self.grid.symbol_at(cell)
        }
    }
}

/// Every cell that is part of a run of [`MIN_RUN`] or more, row-major, each once
pub fn find_matches<G: SymbolGrid + ?Sized>(grid: &G) -> Vec<Cell> {
    let (rows, cols) = (grid.rows(), grid.cols());
    let mut matched = vec![false; rows * cols];

    for row in 0..rows {
        scan_line(cols, |i| grid.symbol_at(Cell::new(row, i)), |i| {
            matched[row * cols + i] = true;
        });
    }
    for col in 0..cols {
        scan_line(rows, |i| grid.symbol_at(Cell::new(i, col)), |i| {
            matched[i * cols + col] = true;
        });
    }

    matched
        .iter()
        .enumerate()
        .filter(|(_, m)| **m)
        .map(|(i, _)| Cell::new(i / cols, i % cols))
        .collect()
}

/// Slide along one line, reporting each index that belongs to a long enough run.
/// Index `len` acts as the closing boundary so a run ending at the last cell counts.
fn scan_line(
    len: usize,
    symbol_at: impl Fn(usize) -> Option<Symbol>,
    mut mark: impl FnMut(usize),
) {
    let mut run_start = 0;
    let mut run_symbol = None;

    for i in 0..=len {
        let current = if i < len { symbol_at(i) } else { None };
        if current.is_some() && current == run_symbol {
            continue;
        }
        if run_symbol.is_some() && i - run_start >= MIN_RUN {
            (run_start..i).for_each(&mut mark);
        }
        run_start = i;
        run_symbol = current;
    }
}

/// Whether the cell sits inside a horizontal or vertical run of [`MIN_RUN`] or more
pub fn creates_match_at<G: SymbolGrid + ?Sized>(grid: &G, cell: Cell) -> bool {
    let symbol = match grid.symbol_at(cell) {
        Some(s) => s,
        None => return false,
    };
    let same = |c: Cell| grid.symbol_at(c) == Some(symbol);

    let mut horizontal = 1;
    let mut c = cell.col;
    while c > 0 && same(Cell::new(cell.row, c - 1)) {
        horizontal += 1;
        c -= 1;
    }
    let mut c = cell.col + 1;
    while c < grid.cols() && same(Cell::new(cell.row, c)) {
        horizontal += 1;
        c += 1;
    }
    if horizontal >= MIN_RUN {
        return true;
    }

    let mut vertical = 1;
    let mut r = cell.row;
    while r > 0 && same(Cell::new(r - 1, cell.col)) {
        vertical += 1;
        r -= 1;
    }
    let mut r = cell.row + 1;
    while r < grid.rows() && same(Cell::new(r, cell.col)) {
        vertical += 1;
        r += 1;
    }
    vertical >= MIN_RUN
}

/// Would exchanging `a` and `b` put either of them in a run?
///
/// Only the two touched cells are probed; a swap cannot create a run
/// that passes through neither of them. Empty or out-of-bounds cells never match.
pub fn would_create_match<G: SymbolGrid + ?Sized>(grid: &G, a: Cell, b: Cell) -> bool {
    if grid.symbol_at(a).is_none() || grid.symbol_at(b).is_none() {
        return false;
    }
    let view = SwappedView::new(grid, a, b);
    creates_match_at(&view, a) || creates_match_at(&view, b)
}
