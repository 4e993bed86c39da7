//! Read-only views of engine state for renderers and tooling

use std::fmt;

use serde::Serialize;

use crate::board::{Board, Cell, PieceId};
use crate::engine::EngineState;
use crate::symbol::Symbol;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PieceView {
    pub id: PieceId,
    pub symbol: Symbol,
    pub matched: bool,
}

/// Row-major copy of the grid; `None` marks an empty cell
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BoardSnapshot {
    pub rows: usize,
    pub cols: usize,
    pub cells: Vec<Vec<Option<PieceView>>>,
}

impl BoardSnapshot {
    pub fn from_board(board: &Board) -> Self {
        let cells = (0..board.rows())
            .map(|row| {
                (0..board.cols())
                    .map(|col| {
                        board.get(Cell::new(row, col)).map(|p| PieceView {
                            id: p.id,
                            symbol: p.symbol,
                            matched: p.matched,
                        })
                    })
                    .collect()
            })
            .collect();

        Self {
            rows: board.rows(),
            cols: board.cols(),
            cells,
        }
    }
}

/// One character per cell: the symbol letter, lowercase while matched, `.` when empty
impl fmt::Display for BoardSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            let line: String = row
                .iter()
                .map(|cell| match cell {
                    Some(view) if view.matched => view.symbol.letter().to_ascii_lowercase(),
                    Some(view) => view.symbol.letter(),
                    None => '.',
                })
                .collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EngineSnapshot {
    pub clock_ms: u64,
    pub state: EngineState,
    pub board: BoardSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_marks_matched_and_empty() {
        let mut board = Board::from_rows(&[&[0, 1, 2], &[2, 0, 1]]);
        board.get_mut(Cell::new(0, 1)).unwrap().mark_matched(0);
        board.take(Cell::new(1, 2));

        let snapshot = BoardSnapshot::from_board(&board);
        assert_eq!(snapshot.to_string(), "AbC\nCA.\n");
        assert_eq!(snapshot.cells[1][2], None);
        assert!(snapshot.cells[0][1].unwrap().matched);
    }

    #[test]
    fn test_snapshot_serializes() {
        let board = Board::from_rows(&[&[0, 1, 2, 0]]);
        let json = serde_json::to_string(&BoardSnapshot::from_board(&board)).unwrap();
        assert!(json.contains("\"rows\":1"));
        assert!(json.contains("\"cols\":4"));
    }
}
