// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounded linear undo/redo history of whole-state snapshots.

use std::collections::VecDeque;

use tracing::debug;

/// Undo and redo stacks of snapshots of type `T`.
///
/// The undo stack holds at most `limit` snapshots; the oldest is dropped
/// when a new one would exceed it. Recording a new snapshot clears the redo
/// stack. Undo and redo exchange the caller's current state for a stored
/// one and never record anything themselves, so replaying history cannot
/// corrupt it.
#[derive(Debug, Clone)]
pub struct HistoryManager<T> {
    undo: VecDeque<T>,
    redo: Vec<T>,
    limit: usize,
}

impl<T> HistoryManager<T> {
    /// A history keeping at most `limit` undo steps (at least one).
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Push the state as it was before a mutation.
    pub fn record(&mut self, before: T) {
        self.redo.clear();
        self.undo.push_back(before);
        while self.undo.len() > self.limit {
            self.undo.pop_front();
            debug!(limit = self.limit, "Oldest undo step dropped");
        }
    }

    /// Trade `current` for the most recent snapshot. `None` (and `current`
    /// is dropped) when there is nothing to undo.
    pub fn undo(&mut self, current: T) -> Option<T> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current);
        Some(previous)
    }

    /// Trade `current` for the most recently undone snapshot.
    pub fn redo(&mut self, current: T) -> Option<T> {
        let next = self.redo.pop()?;
        self.undo.push_back(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

impl<T> Default for HistoryManager<T> {
    fn default() -> Self {
        Self::new(50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undo_then_redo_round_trips() {
        let mut history = HistoryManager::new(10);
        history.record(1);
        let state = history.undo(2).unwrap();
        assert_eq!(state, 1);
        assert_eq!(history.redo(state), Some(2));
        assert!(!history.can_redo());
        assert!(history.can_undo());
    }

    #[test]
    fn empty_history_refuses() {
        let mut history: HistoryManager<u32> = HistoryManager::default();
        assert_eq!(history.undo(7), None);
        assert_eq!(history.redo(7), None);
        assert_eq!(history.undo_len(), 0);
        assert_eq!(history.redo_len(), 0);
    }

    #[test]
    fn new_record_clears_redo() {
        let mut history = HistoryManager::new(10);
        history.record("a");
        history.record("b");
        let undone = history.undo("c").unwrap();
        assert_eq!(undone, "b");
        assert!(history.can_redo());
        history.record("b2");
        assert!(!history.can_redo());
    }

    #[test]
    fn oldest_snapshot_is_dropped_at_limit() {
        let mut history = HistoryManager::new(3);
        for state in 0..5 {
            history.record(state);
        }
        assert_eq!(history.undo_len(), 3);

        let mut current = 5;
        let mut seen = Vec::new();
        while let Some(previous) = history.undo(current) {
            seen.push(previous);
            current = previous;
        }
        assert_eq!(seen, vec![4, 3, 2]);
    }
}
