//! Linear undo/redo history of stroke collection snapshots.

use crate::element::DrawingElement;

/// Ordered snapshots of the stroke collection plus the current position.
///
/// The step always points at a valid snapshot. Pushing while positioned
/// before the newest snapshot discards the forward snapshots first, so the
/// history never branches.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    snapshots: Vec<Vec<DrawingElement>>,
    step: usize,
}

impl History {
    /// Create a history holding a single empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::with_initial(Vec::new())
    }

    /// Create a history whose only snapshot is `elements`.
    #[must_use]
    pub fn with_initial(elements: Vec<DrawingElement>) -> Self {
        Self {
            snapshots: vec![elements],
            step: 0,
        }
    }

    /// Record a new snapshot after the current step.
    pub fn push(&mut self, elements: Vec<DrawingElement>) {
        self.snapshots.truncate(self.step + 1);
        self.snapshots.push(elements);
        self.step = self.snapshots.len() - 1;
    }

    /// Step back one snapshot, returning it. `None` at the oldest snapshot.
    pub fn undo(&mut self) -> Option<&[DrawingElement]> {
        if self.step == 0 {
            return None;
        }
        self.step -= 1;
        Some(&self.snapshots[self.step])
    }

    /// Step forward one snapshot, returning it. `None` at the newest snapshot.
    pub fn redo(&mut self) -> Option<&[DrawingElement]> {
        if self.step + 1 >= self.snapshots.len() {
            return None;
        }
        self.step += 1;
        Some(&self.snapshots[self.step])
    }

    /// Drop everything and start over from a single empty snapshot.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// The snapshot at the current step.
    #[must_use]
    pub fn current(&self) -> &[DrawingElement] {
        &self.snapshots[self.step]
    }

    /// Number of stored snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always false: a history holds at least one snapshot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Index of the current snapshot.
    #[must_use]
    pub fn step(&self) -> usize {
        self.step
    }

    /// Whether [`History::undo`] would move.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.step > 0
    }

    /// Whether [`History::redo`] would move.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.step + 1 < self.snapshots.len()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
