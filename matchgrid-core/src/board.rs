//! Grid geometry and piece storage

use crate::symbol::Symbol;
use serde::{Deserialize, Serialize};

/// Reference board height
pub const DEFAULT_ROWS: usize = 8;

/// Reference board width
pub const DEFAULT_COLS: usize = 6;

/// Grid coordinates, row 0 at the top
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Manhattan distance 1 (no diagonals)
    pub fn is_adjacent(&self, other: Cell) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }

    /// Neighbor to the right (not bounds-checked)
    pub fn right(&self) -> Cell {
        Cell::new(self.row, self.col + 1)
    }

    /// Neighbor below
    pub fn below(&self) -> Cell {
        Cell::new(self.row + 1, self.col)
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Stable identity of a piece instance, kept across recycling
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PieceId(pub u32);

/// A piece on the board
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Piece {
    pub id: PieceId,
    pub symbol: Symbol,
    pub row: usize,
    pub col: usize,
    pub matched: bool,
    /// Engine clock when the piece was marked matched
    pub matched_at_ms: Option<u64>,
}

impl Piece {
    pub fn new(id: PieceId, symbol: Symbol, cell: Cell) -> Self {
        Self {
            id,
            symbol,
            row: cell.row,
            col: cell.col,
            matched: false,
            matched_at_ms: None,
        }
    }

    pub fn cell(&self) -> Cell {
        Cell::new(self.row, self.col)
    }

    /// Mark as matched. Returns false if it already was.
    pub fn mark_matched(&mut self, now_ms: u64) -> bool {
        if self.matched {
            return false;
        }
        self.matched = true;
        self.matched_at_ms = Some(now_ms);
        true
    }
}

/// Read access to a grid of symbols.
///
/// Implemented by [`Board`] and by views that present a board with two
/// cells exchanged, so match probes never need to mutate the board.
pub trait SymbolGrid {
    fn rows(&self) -> usize;
    fn cols(&self) -> usize;
    fn symbol_at(&self, cell: Cell) -> Option<Symbol>;

    fn contains(&self, cell: Cell) -> bool {
        cell.row < self.rows() && cell.col < self.cols()
    }
}

/// Rows x cols matrix of optional pieces, stored row-major
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<Option<Piece>>,
}

impl Board {
    /// Create an empty board
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![None; rows * cols],
        }
    }

    /// Build a full board from symbol indices, one slice per row.
    ///
    /// Piece ids are assigned in row-major order. Panics on ragged input.
    pub fn from_rows(rows: &[&[u8]]) -> Self {
        let cols = rows.first().map_or(0, |r| r.len());
        let mut board = Board::new(rows.len(), cols);
        let mut next_id = 0;
        for (r, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), cols, "row {} has {} columns, expected {}", r, row.len(), cols);
            for (c, &symbol) in row.iter().enumerate() {
                let cell = Cell::new(r, c);
                board.place(cell, Piece::new(PieceId(next_id), Symbol(symbol), cell));
                next_id += 1;
            }
        }
        board
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }

    fn index(&self, cell: Cell) -> usize {
        cell.row * self.cols + cell.col
    }

    /// Get piece at cell (None when empty or out of bounds)
    pub fn get(&self, cell: Cell) -> Option<&Piece> {
        if !self.contains(cell) {
            return None;
        }
        self.cells[self.index(cell)].as_ref()
    }

    pub fn get_mut(&mut self, cell: Cell) -> Option<&mut Piece> {
        if !self.contains(cell) {
            return None;
        }
        let idx = self.index(cell);
        self.cells[idx].as_mut()
    }

    /// Put a piece into a cell, updating its coordinates. Returns the previous occupant.
    pub fn place(&mut self, cell: Cell, mut piece: Piece) -> Option<Piece> {
        piece.row = cell.row;
        piece.col = cell.col;
        let idx = self.index(cell);
        self.cells[idx].replace(piece)
    }

    /// Remove and return the piece at a cell
    pub fn take(&mut self, cell: Cell) -> Option<Piece> {
        if !self.contains(cell) {
            return None;
        }
        let idx = self.index(cell);
        self.cells[idx].take()
    }

    /// Exchange the contents of two cells, keeping piece coordinates in step
    pub fn swap(&mut self, a: Cell, b: Cell) {
        let (ia, ib) = (self.index(a), self.index(b));
        self.cells.swap(ia, ib);
        if let Some(piece) = self.cells[ia].as_mut() {
            piece.row = a.row;
            piece.col = a.col;
        }
        if let Some(piece) = self.cells[ib].as_mut() {
            piece.row = b.row;
            piece.col = b.col;
        }
    }

    /// Overwrite the symbol of the piece at `cell` in place
    pub fn set_symbol(&mut self, cell: Cell, symbol: Symbol) -> bool {
        match self.get_mut(cell) {
            Some(piece) => {
                piece.symbol = symbol;
                true
            }
            None => false,
        }
    }

    /// All coordinates in row-major order
    pub fn positions(&self) -> impl Iterator<Item = Cell> {
        let cols = self.cols;
        (0..self.rows * cols).map(move |i| Cell::new(i / cols, i % cols))
    }

    /// Iterate placed pieces in row-major order
    pub fn pieces(&self) -> impl Iterator<Item = &Piece> + '_ {
        self.cells.iter().flatten()
    }

    pub fn empty_cells(&self) -> Vec<Cell> {
        self.positions().filter(|&c| self.get(c).is_none()).collect()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Cells whose piece is marked matched
    pub fn matched_cells(&self) -> Vec<Cell> {
        self.pieces().filter(|p| p.matched).map(Piece::cell).collect()
    }

    /// Symbols of placed pieces in row-major order
    pub fn symbols(&self) -> Vec<Symbol> {
        self.pieces().map(|p| p.symbol).collect()
    }

    /// Symbol layout, one vector per row (tests and snapshots)
    pub fn symbol_rows(&self) -> Vec<Vec<Option<Symbol>>> {
        (0..self.rows)
            .map(|r| (0..self.cols).map(|c| self.symbol_at(Cell::new(r, c))).collect())
            .collect()
    }

    /// Drain every piece off the board
    pub fn clear(&mut self) -> Vec<Piece> {
        self.cells.iter_mut().filter_map(Option::take).collect()
    }

    /// Compact each column toward the bottom, preserving order.
    ///
    /// Returns `(from, to)` for every piece that moved.
    pub fn apply_gravity(&mut self) -> Vec<(Cell, Cell)> {
        let mut moves = Vec::new();
        for col in 0..self.cols {
            let mut write = self.rows;
            for row in (0..self.rows).rev() {
                let from = Cell::new(row, col);
                if self.get(from).is_none() {
                    continue;
                }
                write -= 1;
                if write != row {
                    let to = Cell::new(write, col);
                    if let Some(piece) = self.take(from) {
                        self.place(to, piece);
                        moves.push((from, to));
                    }
                }
            }
        }
        moves
    }
}

impl SymbolGrid for Board {
    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn symbol_at(&self, cell: Cell) -> Option<Symbol> {
        self.get(cell).map(|p| p.symbol)
    }
}
