//! Pending-phase queue
//!
//! Delayed cascade steps are plain records rather than callbacks. Each
//! record carries the epoch it was scheduled in; `cancel_all` drops every
//! record and advances the epoch, so a record from a superseded session is
//! never run even if a caller kept a copy of it.

use serde::Serialize;

use crate::board::Cell;

/// What a pending phase will do when it comes due
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PhaseKind {
    /// Undo a swap that produced no match
    Revert { a: Cell, b: Cell },
    /// Clear matched pieces, drop the rest and refill
    Remove,
    /// Look for chained matches after a refill
    Recheck,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingPhase {
    pub kind: PhaseKind,
    pub due_ms: u64,
    pub epoch: u64,
    seq: u64,
}

#[derive(Clone, Debug, Default)]
pub struct PhaseQueue {
    pending: Vec<PendingPhase>,
    epoch: u64,
    next_seq: u64,
}

impl PhaseQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn schedule(&mut self, kind: PhaseKind, due_ms: u64) -> PendingPhase {
        let phase = PendingPhase {
            kind,
            due_ms,
            epoch: self.epoch,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.pending.push(phase);
        phase
    }

    /// Whether a record belongs to the current session
    pub fn is_current(&self, phase: &PendingPhase) -> bool {
        phase.epoch == self.epoch
    }

    /// Earliest due time among pending phases
    pub fn next_due_ms(&self) -> Option<u64> {
        self.pending.iter().map(|p| p.due_ms).min()
    }

    /// Remove and return the earliest phase due at or before `now_ms`.
    /// Phases due at the same time come out in scheduling order.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<PendingPhase> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due_ms <= now_ms)
            .min_by_key(|(_, p)| (p.due_ms, p.seq))
            .map(|(i, _)| i)?;
        Some(self.pending.swap_remove(idx))
    }

    /// Drop every pending phase and start a new epoch. Returns how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        self.epoch += 1;
        dropped
    }
}
