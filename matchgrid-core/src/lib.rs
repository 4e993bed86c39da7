//! MATCHGRID Core - Match-three grid engine
//!
//! This crate provides the board logic for a tile-swap puzzle:
//! - Grid storage, gravity and piece identity
//! - Run detection (three or more in a row or column)
//! - Swap validation and the timed cascade state machine
//! - Solvability checks, hints and reshuffling
//! - Piece recycling and read-only snapshots
//!
//! Rendering and input are left to the host, which drives the engine with
//! [`Engine::tick`] and reacts to [`EngineEvent`]s.

pub mod symbol;
pub mod board;
pub mod matcher;
pub mod solver;
pub mod generator;
pub mod pool;
pub mod scheduler;
pub mod engine;
pub mod snapshot;
pub mod config;
pub mod error;

// Re-exports for convenient access
pub use symbol::{Symbol, SymbolSet, MIN_SYMBOLS, MAX_SYMBOLS, DEFAULT_SYMBOLS};
pub use board::{Board, Cell, Piece, PieceId, SymbolGrid, DEFAULT_ROWS, DEFAULT_COLS};
pub use matcher::{find_matches, would_create_match, SwappedView, MIN_RUN};
pub use solver::{find_hint, has_valid_moves, is_playable, ShuffleOutcome};
pub use pool::{PieceFactory, PiecePool, PoolStats};
pub use engine::{Engine, EngineEvent, EngineState, RejectReason, SwapOutcome};
pub use snapshot::{BoardSnapshot, EngineSnapshot, PieceView};
pub use config::{EngineConfig, Timings};
pub use error::ConfigError;
