//! One-shot timers on a single monotonic simulation clock
//!
//! Timers fire in deadline order; ties fire in the order they were scheduled.
//! A canceled timer is removed outright, so it can never fire late.

use serde::{Deserialize, Serialize};

/// Handle returned by [`Timers::schedule`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(u64);

/// What a timer is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerKind {
    /// End of the all-cards-face-up phase at game start
    InitialReveal,
    /// Resolve the two selected cards
    MatchCheck,
    /// Break an idle combo
    ComboDecay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    id: TimerId,
    due_ms: u64,
    kind: TimerKind,
}

/// Pending one-shot timers plus the simulation clock they run against
#[derive(Debug, Clone, Default)]
pub struct Timers {
    now_ms: u64,
    next_id: u64,
    pending: Vec<Pending>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulation time
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Schedule `kind` to fire `delay_ms` from now
    pub fn schedule(&mut self, delay_ms: u64, kind: TimerKind) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            id,
            due_ms: self.now_ms.saturating_add(delay_ms),
            kind,
        });
        id
    }

    /// Cancel a pending timer. Returns false if it already fired or was canceled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }

    /// Number of live timers of `kind`
    #[cfg(test)]
    pub(crate) fn pending_of(&self, kind: TimerKind) -> usize {
        self.pending.iter().filter(|p| p.kind == kind).count()
    }

    /// Pop the earliest timer due at or before `until_ms`, moving the clock to
    /// its deadline.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(TimerId, TimerKind)> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due_ms <= until_ms)
            .min_by_key(|(_, p)| (p.due_ms, p.id))
            .map(|(i, _)| i)?;

        let fired = self.pending.remove(index);
        self.now_ms = self.now_ms.max(fired.due_ms);
        Some((fired.id, fired.kind))
    }

    /// Move the clock forward. Never moves backwards.
    pub fn advance_to(&mut self, ms: u64) {
        self.now_ms = self.now_ms.max(ms);
    }
}
