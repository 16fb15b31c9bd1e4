//! Bounded snapshot history for undo/redo.

use std::collections::VecDeque;

/// Default number of undo steps kept
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Undo/redo stacks of whole-state snapshots.
///
/// Callers record the state *before* each mutation. `undo` and `redo` take
/// the current state and hand back the one to restore.
#[derive(Debug, Clone)]
pub struct History<T> {
    past: VecDeque<T>,
    future: Vec<T>,
    capacity: usize,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl<T> History<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            past: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
            future: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Push the pre-mutation snapshot, evicting the oldest when full.
    /// Recording discards the redo stack.
    pub fn record(&mut self, snapshot: T) {
        if self.past.len() == self.capacity {
            self.past.pop_front();
        }
        self.past.push_back(snapshot);
        self.future.clear();
    }

    /// Step back; `current` moves onto the redo stack
    pub fn undo(&mut self, current: T) -> Option<T> {
        let previous = self.past.pop_back()?;
        self.future.push(current);
        Some(previous)
    }

    /// Step forward; `current` moves back onto the undo stack
    pub fn redo(&mut self, current: T) -> Option<T> {
        let next = self.future.pop()?;
        self.past.push_back(current);
        if self.past.len() > self.capacity {
            self.past.pop_front();
        }
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_redo_is_lifo() {
        let mut history = History::default();
        history.record(0);
        history.record(1);

        assert_eq!(history.undo(2), Some(1));
        assert_eq!(history.undo(1), Some(0));
        assert_eq!(history.undo(0), None);
        assert_eq!(history.redo(0), Some(1));
        assert_eq!(history.redo(1), Some(2));
        assert_eq!(history.redo(2), None);
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = History::default();
        history.record("a");
        assert_eq!(history.undo("b"), Some("a"));
        assert!(history.can_redo());
        history.record("a");
        assert!(!history.can_redo());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = History::new(DEFAULT_HISTORY_CAPACITY);
        for i in 0..60 {
            history.record(i);
        }
        assert_eq!(history.past_len(), 50);

        let mut current = 60;
        let mut restored = Vec::new();
        while let Some(previous) = history.undo(current) {
            restored.push(previous);
            current = previous;
        }
        assert_eq!(restored.len(), 50);
        assert_eq!(restored.last(), Some(&10));
    }

    #[test]
    fn test_clear() {
        let mut history = History::new(3);
        history.record(1);
        history.undo(2);
        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }
}
