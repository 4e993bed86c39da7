//! Integration tests for the MATCHGRID engine
//!
//! Tests the full stack: generation, matching, the timed cascade, solvability
//! repair and piece recycling.

use matchgrid_core::{
    board::{Board, Cell},
    engine::{Engine, EngineEvent, EngineState, RejectReason, SwapOutcome},
    matcher::find_matches,
    pool::PiecePool,
    solver::{force_create_valid_moves, has_valid_moves, shuffle, ShuffleOutcome},
    symbol::{Symbol, SymbolSet},
    EngineConfig, Timings,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// ============================================================================
// TEST FIXTURES
// ============================================================================

/// 6x6 board over symbols 1..4 with no runs; rows 2 and 3 hold the
/// near-miss patterns `[1,1,2,3,4,2]` and `[1,2,1,3,4,2]`
fn near_miss_board() -> Board {
    Board::from_rows(&[
        &[3, 4, 1, 2, 3, 4],
        &[4, 3, 4, 1, 2, 1],
        &[1, 1, 2, 3, 4, 2],
        &[1, 2, 1, 3, 4, 2],
        &[2, 4, 3, 4, 1, 3],
        &[3, 1, 4, 2, 3, 1],
    ])
}

fn near_miss_engine() -> Engine {
    let config = EngineConfig::default().with_symbols(5).with_seed(12);
    Engine::from_board(config, near_miss_board(), PiecePool::new()).unwrap()
}

fn row(engine: &Engine, r: usize) -> Vec<u8> {
    (0..engine.board().cols())
        .map(|c| engine.board().get(Cell::new(r, c)).unwrap().symbol.0)
        .collect()
}

/// Take the hinted swap and settle; returns the events it produced
fn play_hint(engine: &mut Engine) -> Vec<EngineEvent> {
    let (a, b) = engine.hint().expect("settled board must have a move");
    assert_eq!(engine.request_swap(a, b), SwapOutcome::Accepted);
    engine.settle();
    engine.drain_events()
}

// ============================================================================
// INITIALIZATION
// ============================================================================

#[test]
fn test_fresh_boards_have_no_runs_and_a_move() {
    let shapes = [(8, 6, 6), (6, 6, 4), (9, 9, 7), (3, 3, 3), (2, 5, 3), (1, 6, 3), (7, 1, 4)];
    for &(rows, cols, symbols) in &shapes {
        for seed in 0..25 {
            let config = EngineConfig::default()
                .with_dimensions(rows, cols)
                .with_symbols(symbols)
                .with_seed(seed);
            let engine = Engine::new(config).unwrap();
            assert!(
                find_matches(engine.board()).is_empty(),
                "{}x{} seed {} starts with a run",
                rows,
                cols,
                seed
            );
            assert!(engine.is_solvable(), "{}x{} seed {} has no move", rows, cols, seed);
            assert!(engine.board().is_full());
        }
    }
}

#[test]
fn test_same_seed_same_board() {
    let a = Engine::new(EngineConfig::default().with_seed(2024)).unwrap();
    let b = Engine::new(EngineConfig::default().with_seed(2024)).unwrap();
    assert_eq!(a.board().symbol_rows(), b.board().symbol_rows());
}

#[test]
fn test_unplayable_dimensions_rejected() {
    assert!(Engine::new(EngineConfig::default().with_dimensions(2, 2)).is_err());
    assert!(Engine::new(EngineConfig::default().with_dimensions(1, 3)).is_err());
    assert!(Engine::new(EngineConfig::default().with_dimensions(0, 6)).is_err());
}

// ============================================================================
// MATCH DETECTION AND GRAVITY
// ============================================================================

#[test]
fn test_run_of_three_then_pair() {
    let board = Board::from_rows(&[&[0, 0, 0, 1, 1]]);
    assert_eq!(
        find_matches(&board),
        vec![Cell::new(0, 0), Cell::new(0, 1), Cell::new(0, 2)]
    );
}

#[test]
fn test_pair_then_run_of_three() {
    let board = Board::from_rows(&[&[0, 0, 1, 0, 0, 0]]);
    assert_eq!(
        find_matches(&board),
        vec![Cell::new(0, 3), Cell::new(0, 4), Cell::new(0, 5)]
    );
}

#[test]
fn test_gravity_keeps_column_order() {
    let mut board = Board::from_rows(&[&[0], &[3], &[1], &[3], &[2]]);
    board.take(Cell::new(1, 0));
    board.take(Cell::new(3, 0));

    board.apply_gravity();

    let column: Vec<Option<Symbol>> = board.symbol_rows().into_iter().map(|r| r[0]).collect();
    assert_eq!(
        column,
        vec![None, None, Some(Symbol(0)), Some(Symbol(1)), Some(Symbol(2))]
    );
}

// ============================================================================
// SWAP AND REVERT
// ============================================================================

#[test]
fn test_near_miss_swap_is_reverted() {
    let mut engine = near_miss_engine();
    let before = engine.board().symbol_rows();

    let outcome = engine.request_swap(Cell::new(2, 1), Cell::new(2, 2));
    assert_eq!(outcome, SwapOutcome::Reverting);
    assert_eq!(row(&engine, 2), vec![1, 2, 1, 3, 4, 2]);

    engine.tick(300);
    assert_eq!(row(&engine, 2), vec![1, 1, 2, 3, 4, 2]);
    assert_eq!(engine.board().symbol_rows(), before);
    assert_eq!(
        engine.drain_events(),
        vec![EngineEvent::SwapRejected {
            a: Cell::new(2, 1),
            b: Cell::new(2, 2),
            reason: RejectReason::NoMatch,
        }]
    );
}

#[test]
fn test_two_in_a_row_is_not_a_match() {
    let mut engine = near_miss_engine();

    let outcome = engine.request_swap(Cell::new(3, 1), Cell::new(3, 2));
    assert_eq!(outcome, SwapOutcome::Reverting);
    assert_eq!(row(&engine, 3), vec![1, 1, 2, 3, 4, 2]);
    assert!(find_matches(engine.board()).is_empty());

    engine.settle();
    assert_eq!(row(&engine, 3), vec![1, 2, 1, 3, 4, 2]);
    assert!(engine.is_idle());
}

#[test]
fn test_revert_lands_exactly_at_delay() {
    let config = EngineConfig::default()
        .with_symbols(5)
        .with_timings(Timings {
            revert_ms: 120,
            ..Timings::default()
        });
    let mut engine = Engine::from_board(config, near_miss_board(), PiecePool::new()).unwrap();

    engine.request_swap(Cell::new(2, 1), Cell::new(2, 2));
    assert_eq!(engine.next_due_ms(), Some(120));
    engine.tick(119);
    assert!(matches!(engine.state(), EngineState::Reverting { .. }));
    engine.tick(1);
    assert!(engine.is_idle());
    assert_eq!(engine.clock_ms(), 120);
}

#[test]
fn test_busy_engine_rejects_swaps() {
    let mut engine = near_miss_engine();
    engine.request_swap(Cell::new(2, 1), Cell::new(2, 2));

    let outcome = engine.request_swap(Cell::new(0, 0), Cell::new(0, 1));
    assert_eq!(outcome, SwapOutcome::Rejected(RejectReason::Busy));
    // the rejected request changed nothing
    assert_eq!(row(&engine, 0), vec![3, 4, 1, 2, 3, 4]);
}

// ============================================================================
// CASCADES
// ============================================================================

#[test]
fn test_cascade_phase_timing() {
    let mut engine = Engine::new(EngineConfig::default().with_seed(31)).unwrap();
    let (a, b) = engine.hint().unwrap();

    assert_eq!(engine.request_swap(a, b), SwapOutcome::Accepted);
    assert_eq!(engine.next_due_ms(), Some(300));
    assert!(!engine.board().matched_cells().is_empty());

    engine.tick(300);
    assert!(engine.board().matched_cells().is_empty());
    assert!(engine.board().is_full());
    assert_eq!(engine.next_due_ms(), Some(600));

    engine.settle();
    assert!(engine.is_idle());
    assert_eq!(engine.next_due_ms(), None);
}

#[test]
fn test_settled_boards_stay_solvable() {
    for seed in 0..10 {
        let config = EngineConfig::default()
            .with_dimensions(6, 6)
            .with_symbols(4)
            .with_seed(seed);
        let mut engine = Engine::new(config).unwrap();
        engine.drain_events();

        for _ in 0..30 {
            let events = play_hint(&mut engine);

            assert!(engine.is_idle());
            assert!(engine.is_solvable(), "seed {} settled without a move", seed);
            assert!(find_matches(engine.board()).is_empty());
            assert!(engine.board().is_full());

            let settled = events
                .iter()
                .position(|e| matches!(e, EngineEvent::CascadeSettled { .. }))
                .expect("every accepted swap settles");
            assert_eq!(settled, events.len() - 1);
            if let Some(reshuffled) = events
                .iter()
                .position(|e| matches!(e, EngineEvent::Reshuffled { .. }))
            {
                assert!(reshuffled < settled);
            }
        }
    }
}

#[test]
fn test_cascades_terminate_with_three_symbols() {
    for seed in 0..20 {
        let config = EngineConfig::default()
            .with_dimensions(5, 5)
            .with_symbols(3)
            .with_timings(Timings::instant())
            .with_seed(seed);
        let mut engine = Engine::new(config).unwrap();
        for _ in 0..10 {
            let (a, b) = engine.hint().unwrap();
            engine.request_swap(a, b);
            engine.settle();
            assert!(engine.is_idle(), "seed {} did not settle", seed);
        }
    }
}

#[test]
fn test_chain_steps_count_up_from_one() {
    let mut engine = Engine::new(EngineConfig::default().with_seed(77)).unwrap();
    engine.drain_events();
    for _ in 0..20 {
        let events = play_hint(&mut engine);
        let steps: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::CascadeChainStep { step, .. } => Some(*step),
                _ => None,
            })
            .collect();
        let expected: Vec<u32> = (1..=steps.len() as u32).collect();
        assert_eq!(steps, expected);
        assert_eq!(
            events.last(),
            Some(&EngineEvent::CascadeSettled {
                chain: steps.len() as u32
            })
        );
    }
}

#[test]
fn test_one_large_tick_matches_many_small_ones() {
    let config = EngineConfig::default().with_seed(404);
    let mut coarse = Engine::new(config.clone()).unwrap();
    let mut fine = Engine::new(config).unwrap();

    for _ in 0..5 {
        let (a, b) = coarse.hint().unwrap();
        assert_eq!(fine.hint(), Some((a, b)));
        coarse.request_swap(a, b);
        fine.request_swap(a, b);

        coarse.tick(60_000);
        for _ in 0..6_000 {
            fine.tick(10);
        }

        assert!(coarse.is_idle() && fine.is_idle());
        assert_eq!(coarse.board().symbol_rows(), fine.board().symbol_rows());
        assert_eq!(coarse.drain_events(), fine.drain_events());
    }
}

// ============================================================================
// RESTART AND POOLING
// ============================================================================

#[test]
fn test_restart_mid_cascade_discards_pending_phases() {
    let mut engine = Engine::new(EngineConfig::default().with_seed(5)).unwrap();
    let (a, b) = engine.hint().unwrap();
    engine.request_swap(a, b);
    engine.tick(100);

    engine.restart(Some(11));
    engine.drain_events();
    let layout = engine.board().symbol_rows();

    engine.tick(10_000);
    assert!(engine.is_idle());
    assert_eq!(engine.board().symbol_rows(), layout);
    assert!(engine.drain_events().is_empty());

    // reseeding reproduces a fresh engine with that seed
    let fresh = Engine::new(EngineConfig::default().with_seed(11)).unwrap();
    assert_eq!(fresh.board().symbol_rows(), layout);
}

#[test]
fn test_pieces_are_recycled() {
    let mut engine = Engine::new(EngineConfig::default().with_seed(9)).unwrap();
    for _ in 0..15 {
        play_hint(&mut engine);
    }

    let stats = engine.factory().stats();
    assert_eq!(stats.minted, 48);
    assert!(stats.released > 0);
    assert_eq!(stats.reused, stats.released);
    assert_eq!(engine.factory().idle(), 0);
}

// ============================================================================
// SOLVABILITY REPAIR
// ============================================================================

#[test]
fn test_forced_repair_on_dead_boards() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    for &(rows, cols) in &[(8, 6), (2, 3), (3, 2), (1, 4), (4, 1), (5, 5)] {
        for symbols in 3..=6u8 {
            let layout: Vec<Vec<u8>> = (0..rows)
                .map(|r| (0..cols).map(|c| ((r + c) % symbols as usize) as u8).collect())
                .collect();
            let slices: Vec<&[u8]> = layout.iter().map(Vec::as_slice).collect();
            let mut board = Board::from_rows(&slices);

            force_create_valid_moves(&mut board, SymbolSet::new(symbols), &mut rng);

            assert!(
                has_valid_moves(&board),
                "{}x{} with {} symbols still dead",
                rows,
                cols,
                symbols
            );
            assert!(board.is_full());
        }
    }
}

#[test]
fn test_plain_shuffle_keeps_symbol_multiset() {
    let mut before = near_miss_board().symbols();
    before.sort();

    for seed in 0..20 {
        let mut board = near_miss_board();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let outcome = shuffle(&mut board, SymbolSet::new(5), &mut rng);

        assert!(has_valid_moves(&board));
        if outcome == ShuffleOutcome::Shuffled {
            let mut after = board.symbols();
            after.sort();
            assert_eq!(before, after, "seed {}", seed);
        }
    }
}

#[test]
fn test_snapshot_renders_letters() {
    let engine = near_miss_engine();
    let text = engine.snapshot().board.to_string();
    assert_eq!(text.lines().nth(2), Some("BBCDEC"));
    assert_eq!(engine.snapshot().state, EngineState::Idle);
}
