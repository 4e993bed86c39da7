//! Swap and cascade resolver
//!
//! The engine moves through `Idle -> (Reverting | Cascading) -> Idle`.
//! A swap request is checked for legality inside the call; everything
//! after that (revert, removal, refill, re-check) is a scheduled phase
//! that runs when [`Engine::tick`] advances the clock past its due time.
//! Hosts observe progress through [`EngineEvent`]s and [`Engine::snapshot`].

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::board::{Board, Cell};
use crate::config::EngineConfig;
use crate::error::ConfigError;
use crate::generator::generate;
use crate::matcher::find_matches;
use crate::pool::{PieceFactory, PiecePool};
use crate::scheduler::{PendingPhase, PhaseKind, PhaseQueue};
use crate::snapshot::{BoardSnapshot, EngineSnapshot};
use crate::solver::{find_hint, has_valid_moves, reshuffle_until_clean};
use crate::symbol::SymbolSet;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Upper bound on phases `settle` will run before giving up
const SETTLE_PHASE_LIMIT: usize = 10_000;

// ============================================================================
// CORE TYPES
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum EngineState {
    /// Settled; accepts swaps
    Idle,
    /// A no-match swap is on screen and will be undone
    Reverting { a: Cell, b: Cell },
    /// Matches are being cleared; `chain` counts detect passes that found runs
    Cascading { chain: u32 },
}

/// Why a swap request was turned down
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    OutOfBounds,
    NotAdjacent,
    /// A swap or cascade is already in flight
    Busy,
    EmptyCell,
    /// The swap lined nothing up and was reverted
    NoMatch,
}

/// Immediate result of [`Engine::request_swap`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwapOutcome {
    /// The swap made a match; a cascade has started
    Accepted,
    /// The swap made no match; it will be undone after the revert delay
    Reverting,
    /// Nothing happened
    Rejected(RejectReason),
}

/// Notifications for the host, drained in emission order
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum EngineEvent {
    /// Once per legal swap
    SwapAccepted { a: Cell, b: Cell },
    SwapRejected { a: Cell, b: Cell, reason: RejectReason },
    /// Once per detect pass that found runs; `step` is 1-based within the chain
    CascadeChainStep { step: u32, cells: Vec<Cell> },
    /// Cells that received new pieces after removal and gravity
    Refilled { spawned: Vec<Cell> },
    /// The cascade ended with no further match; `chain` is its step count
    CascadeSettled { chain: u32 },
    Reshuffled { forced: bool },
    /// The board was regenerated and pending phases discarded
    Restarted,
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct Engine<F: PieceFactory = PiecePool> {
    config: EngineConfig,
    symbols: SymbolSet,
    board: Board,
    factory: F,
    rng: ChaCha8Rng,
    queue: PhaseQueue,
    state: EngineState,
    clock_ms: u64,
    events: Vec<EngineEvent>,
}

impl Engine<PiecePool> {
    /// Create an engine with the default recycling pool
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        Self::with_factory(config, PiecePool::new())
    }
}

impl<F: PieceFactory> Engine<F> {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    pub fn with_factory(config: EngineConfig, mut factory: F) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = create_rng(config.seed);
        let generation = generate(&config, &mut factory, &mut rng);

        let mut events = Vec::new();
        if let Some(outcome) = generation.repair {
            events.push(EngineEvent::Reshuffled {
                forced: outcome.is_forced(),
            });
        }

        Ok(Self {
            symbols: config.symbol_set(),
            config,
            board: generation.board,
            factory,
            rng,
            queue: PhaseQueue::new(),
            state: EngineState::Idle,
            clock_ms: 0,
            events,
        })
    }

    /// Wrap an existing board (tests, puzzles, replays).
    ///
    /// The board is taken as-is: no run clearing or solvability repair.
    pub fn from_board(config: EngineConfig, board: Board, factory: F) -> Result<Self, ConfigError> {
        let config = EngineConfig {
            rows: board.rows(),
            cols: board.cols(),
            ..config
        };
        config.validate()?;

        Ok(Self {
            symbols: config.symbol_set(),
            rng: create_rng(config.seed),
            config,
            board,
            factory,
            queue: PhaseQueue::new(),
            state: EngineState::Idle,
            clock_ms: 0,
            events: Vec::new(),
        })
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn is_idle(&self) -> bool {
        self.state == EngineState::Idle
    }

    /// Due time of the next scheduled phase
    pub fn next_due_ms(&self) -> Option<u64> {
        self.queue.next_due_ms()
    }

    /// Take every event emitted since the last call
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// One legal swap, scanning row-major. None while a swap or cascade is in flight.
    pub fn hint(&self) -> Option<(Cell, Cell)> {
        if !self.is_idle() {
            return None;
        }
        find_hint(&self.board)
    }

    pub fn is_solvable(&self) -> bool {
        has_valid_moves(&self.board)
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            clock_ms: self.clock_ms,
            state: self.state,
            board: BoardSnapshot::from_board(&self.board),
        }
    }

    // ========================================================================
    // SWAP
    // ========================================================================

    /// Try to exchange two adjacent cells.
    ///
    /// Invalid requests change nothing and emit `SwapRejected` right away.
    /// A swap that lines nothing up stays on the board until the revert
    /// phase undoes it; `SwapRejected { reason: NoMatch }` fires then.
    pub fn request_swap(&mut self, a: Cell, b: Cell) -> SwapOutcome {
        if let Err(reason) = self.check_swap(a, b) {
            tracing::debug!(%a, %b, ?reason, "swap rejected");
            self.events.push(EngineEvent::SwapRejected { a, b, reason });
            return SwapOutcome::Rejected(reason);
        }

        self.board.swap(a, b);
        let matches = find_matches(&self.board);

        if matches.is_empty() {
            tracing::debug!(%a, %b, "swap made no match, reverting");
            self.state = EngineState::Reverting { a, b };
            self.queue.schedule(
                PhaseKind::Revert { a, b },
                self.clock_ms.saturating_add(self.config.timings.revert_ms),
            );
            return SwapOutcome::Reverting;
        }

        tracing::debug!(%a, %b, matched = matches.len(), "swap accepted");
        self.events.push(EngineEvent::SwapAccepted { a, b });
        self.state = EngineState::Cascading { chain: 0 };
        self.begin_chain_step(matches, self.clock_ms);
        SwapOutcome::Accepted
    }

    fn check_swap(&self, a: Cell, b: Cell) -> Result<(), RejectReason> {
        if !self.is_idle() {
            return Err(RejectReason::Busy);
        }
        if !self.board.contains(a) || !self.board.contains(b) {
            return Err(RejectReason::OutOfBounds);
        }
        if !a.is_adjacent(b) {
            return Err(RejectReason::NotAdjacent);
        }
        let settled = |c: Cell| self.board.get(c).is_some_and(|p| !p.matched);
        if !settled(a) || !settled(b) {
            return Err(RejectReason::EmptyCell);
        }
        Ok(())
    }

    // ========================================================================
    // CLOCK
    // ========================================================================

    /// Advance the clock and run every phase that has come due, in due order.
    /// The clock saturates at `u64::MAX`.
    pub fn tick(&mut self, elapsed_ms: u64) {
        self.clock_ms = self.clock_ms.saturating_add(elapsed_ms);
        while let Some(phase) = self.queue.pop_due(self.clock_ms) {
            self.run_phase(phase);
        }
    }

    /// Jump the clock from phase to phase until nothing is pending.
    /// Returns the milliseconds advanced.
    pub fn settle(&mut self) -> u64 {
        let start = self.clock_ms;
        for _ in 0..SETTLE_PHASE_LIMIT {
            match self.queue.next_due_ms() {
                Some(due) => self.tick(due.saturating_sub(self.clock_ms)),
                None => return self.clock_ms - start,
            }
        }
        tracing::warn!(limit = SETTLE_PHASE_LIMIT, "settle stopped at phase limit");
        self.clock_ms - start
    }

    fn run_phase(&mut self, phase: PendingPhase) {
        if !self.queue.is_current(&phase) {
            tracing::debug!(epoch = phase.epoch, "dropping phase from a previous session");
            return;
        }
        tracing::debug!(kind = ?phase.kind, due_ms = phase.due_ms, "running phase");
        match phase.kind {
            PhaseKind::Revert { a, b } => self.apply_revert(a, b),
            PhaseKind::Remove => self.apply_remove(phase.due_ms),
            PhaseKind::Recheck => self.apply_recheck(phase.due_ms),
        }
    }

    // ========================================================================
    // PHASES
    // ========================================================================

    fn apply_revert(&mut self, a: Cell, b: Cell) {
        self.board.swap(a, b);
        self.state = EngineState::Idle;
        self.events.push(EngineEvent::SwapRejected {
            a,
            b,
            reason: RejectReason::NoMatch,
        });
    }

    /// Mark a detect pass's cells and schedule their removal
    fn begin_chain_step(&mut self, cells: Vec<Cell>, at_ms: u64) {
        let step = match self.state {
            EngineState::Cascading { chain } => chain + 1,
            _ => 1,
        };
        self.state = EngineState::Cascading { chain: step };

        for &cell in &cells {
            if let Some(piece) = self.board.get_mut(cell) {
                piece.mark_matched(at_ms);
            }
        }

        self.events.push(EngineEvent::CascadeChainStep { step, cells });
        self.queue
            .schedule(PhaseKind::Remove, at_ms.saturating_add(self.config.timings.remove_ms));
    }

    fn apply_remove(&mut self, at_ms: u64) {
        let matched = self.board.matched_cells();
        for &cell in &matched {
            if let Some(piece) = self.board.take(cell) {
                self.factory.release(piece);
            }
        }

        let fallen = self.board.apply_gravity();

        let spawned = self.board.empty_cells();
        for &cell in &spawned {
            let symbol = self.symbols.random(&mut self.rng);
            let piece = self.factory.acquire(symbol, cell);
            self.board.place(cell, piece);
        }

        tracing::debug!(
            removed = matched.len(),
            fallen = fallen.len(),
            spawned = spawned.len(),
            "removed matches and refilled"
        );
        self.events.push(EngineEvent::Refilled { spawned });
        self.queue
            .schedule(PhaseKind::Recheck, at_ms.saturating_add(self.config.timings.refill_ms));
    }

    fn apply_recheck(&mut self, at_ms: u64) {
        let matches = find_matches(&self.board);
        if !matches.is_empty() {
            self.begin_chain_step(matches, at_ms);
            return;
        }

        let chain = match self.state {
            EngineState::Cascading { chain } => chain,
            _ => 0,
        };

        if !has_valid_moves(&self.board) {
            let outcome = reshuffle_until_clean(
                &mut self.board,
                self.symbols,
                &mut self.rng,
                self.config.max_reshuffle_attempts,
            );
            tracing::info!(forced = outcome.is_forced(), "board had no move, reshuffled");
            self.events.push(EngineEvent::Reshuffled {
                forced: outcome.is_forced(),
            });
        }

        tracing::debug!(chain, "cascade settled");
        self.events.push(EngineEvent::CascadeSettled { chain });
        self.state = EngineState::Idle;
    }

    // ========================================================================
    // RESTART
    // ========================================================================

    /// Discard pending phases and build a new board, optionally reseeding
    pub fn restart(&mut self, seed: Option<u64>) {
        let cancelled = self.queue.cancel_all();
        if let Some(seed) = seed {
            self.rng = ChaCha8Rng::seed_from_u64(seed);
            self.config.seed = Some(seed);
        }

        for piece in self.board.clear() {
            self.factory.release(piece);
        }

        let generation = generate(&self.config, &mut self.factory, &mut self.rng);
        self.board = generation.board;
        self.state = EngineState::Idle;

        tracing::info!(cancelled, epoch = self.queue.epoch(), "engine restarted");
        self.events.push(EngineEvent::Restarted);
        if let Some(outcome) = generation.repair {
            self.events.push(EngineEvent::Reshuffled {
                forced: outcome.is_forced(),
            });
        }
    }

    /// Restart without reseeding
    pub fn reset(&mut self) {
        self.restart(None);
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Create RNG from seed or random
fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
