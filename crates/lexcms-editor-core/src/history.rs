//! Per-surface undo/redo over markup snapshots.
//!
//! Commands replace the browser's native undo stack, so each surface keeps its
//! own bounded list of `innerHTML` snapshots taken before every mutation.

/// Bounded snapshot history for one surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotHistory {
    undo_stack: Vec<String>,
    redo_stack: Vec<String>,
    max_steps: usize,
}

impl Default for SnapshotHistory {
    fn default() -> Self {
        Self::new(100)
    }
}

impl SnapshotHistory {
    pub fn new(max_steps: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_steps,
        }
    }

    /// Record the state before a mutation.
    pub fn record(&mut self, snapshot: String) {
        // A new edit invalidates anything that was undone.
        self.redo_stack.clear();
        if self.undo_stack.last() == Some(&snapshot) {
            return;
        }
        self.undo_stack.push(snapshot);
        while self.undo_stack.len() > self.max_steps {
            self.undo_stack.remove(0);
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Step back. `current` is the markup being replaced; returns the markup to restore.
    pub fn undo(&mut self, current: String) -> Option<String> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(previous)
    }

    /// Step forward again after an undo.
    pub fn redo(&mut self, current: String) -> Option<String> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        Some(next)
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }
}
