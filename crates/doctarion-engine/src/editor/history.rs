use std::collections::VecDeque;

use crate::working::WorkingDocument;

/// Undo and redo stacks of document snapshots.
///
/// Snapshots share unchanged nodes with the live document, so keeping one
/// per edit stays cheap.
#[derive(Debug, Clone)]
pub(crate) struct History {
    /// Oldest first
    past: VecDeque<WorkingDocument>,
    future: Vec<WorkingDocument>,
    limit: usize,
}

impl History {
    pub(crate) fn new(limit: usize) -> Self {
        History {
            past: VecDeque::new(),
            future: Vec::new(),
            limit,
        }
    }

    /// Records the state an edit started from. Redo is no longer possible.
    pub(crate) fn record(&mut self, previous: WorkingDocument) {
        self.future.clear();
        self.push_past(previous);
    }

    /// Swaps `current` for the last recorded state.
    pub(crate) fn undo(&mut self, current: &mut WorkingDocument) -> bool {
        let Some(previous) = self.past.pop_back() else {
            return false;
        };
        self.future.push(std::mem::replace(current, previous));
        true
    }

    pub(crate) fn redo(&mut self, current: &mut WorkingDocument) -> bool {
        let Some(next) = self.future.pop() else {
            return false;
        };
        let previous = std::mem::replace(current, next);
        self.push_past(previous);
        true
    }

    pub(crate) fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub(crate) fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    pub(crate) fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
        self.trim();
    }

    fn push_past(&mut self, state: WorkingDocument) {
        self.past.push_back(state);
        self.trim();
    }

    fn trim(&mut self) {
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
    }
}
