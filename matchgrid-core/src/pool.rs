//! Piece factory interface and the default recycling pool

use serde::Serialize;

use crate::board::{Cell, Piece, PieceId};
use crate::symbol::Symbol;

/// Source of piece instances.
///
/// The engine asks for "a piece of this symbol at this cell" when it
/// builds or refills the board, and hands every removed piece back.
pub trait PieceFactory {
    fn acquire(&mut self, symbol: Symbol, cell: Cell) -> Piece;
    fn release(&mut self, piece: Piece);
}

/// Pool counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Instances created with a fresh id
    pub minted: u64,
    /// Acquisitions served from released instances
    pub reused: u64,
    pub released: u64,
}

/// Recycles released pieces, keeping their ids
#[derive(Clone, Debug, Default)]
pub struct PiecePool {
    free: Vec<Piece>,
    next_id: u32,
    stats: PoolStats,
}

impl PiecePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Released instances waiting for reuse
    pub fn idle(&self) -> usize {
        self.free.len()
    }
}

impl PieceFactory for PiecePool {
    fn acquire(&mut self, symbol: Symbol, cell: Cell) -> Piece {
        match self.free.pop() {
            Some(recycled) => {
                self.stats.reused += 1;
                Piece::new(recycled.id, symbol, cell)
            }
            None => {
                let id = PieceId(self.next_id);
                self.next_id = self.next_id.wrapping_add(1);
                self.stats.minted += 1;
                Piece::new(id, symbol, cell)
            }
        }
    }

    fn release(&mut self, piece: Piece) {
        self.stats.released += 1;
        self.free.push(piece);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ids_are_distinct() {
        let mut pool = PiecePool::new();
        let a = pool.acquire(Symbol(0), Cell::new(0, 0));
        let b = pool.acquire(Symbol(0), Cell::new(0, 1));
        assert_ne!(a.id, b.id);
        assert_eq!(pool.stats().minted, 2);
    }

    #[test]
    fn test_release_then_acquire_reuses_instance() {
        let mut pool = PiecePool::new();
        let mut piece = pool.acquire(Symbol(1), Cell::new(2, 3));
        let id = piece.id;
        piece.mark_matched(40);
        pool.release(piece);
        assert_eq!(pool.idle(), 1);

        let again = pool.acquire(Symbol(4), Cell::new(0, 5));
        assert_eq!(again.id, id);
        assert_eq!(again.symbol, Symbol(4));
        assert_eq!(again.cell(), Cell::new(0, 5));
        assert!(!again.matched);
        assert_eq!(again.matched_at_ms, None);
        assert_eq!(
            pool.stats(),
            PoolStats {
                minted: 1,
                reused: 1,
                released: 1
            }
        );
    }
}
