use log::debug;
use std::collections::VecDeque;

use crate::error::{EditorError, EditorResult};
use crate::scene::SceneSnapshot;

/// One undoable unit of change: the scene as it was right before the change.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    label: &'static str,
    snapshot: SceneSnapshot,
}

impl HistoryEntry {
    pub fn new(label: &'static str, snapshot: SceneSnapshot) -> Self {
        Self { label, snapshot }
    }

    /// Short description for history listings ("Add Stroke", "Clear", ...)
    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn snapshot(&self) -> &SceneSnapshot {
        &self.snapshot
    }
}

/// Linear undo/redo history of scene snapshots
#[derive(Debug, Default)]
pub struct History {
    /// Entries that can be undone, oldest first
    undo_stack: VecDeque<HistoryEntry>,
    /// Entries that can be redone, most recently undone last
    redo_stack: Vec<HistoryEntry>,
    /// Maximum number of undo entries kept; `None` keeps everything
    limit: Option<usize>,
}

impl History {
    /// Creates a new empty, unbounded history
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a history keeping at most `limit` undo entries (oldest dropped first)
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit: limit.map(|l| l.max(1)),
            ..Self::default()
        }
    }

    /// Record the state captured right before a mutation. Any redo path is discarded.
    pub fn commit(&mut self, entry: HistoryEntry) {
        debug!("History commit: {}", entry.label);
        self.undo_stack.push_back(entry);
        self.redo_stack.clear();
        if let Some(limit) = self.limit {
            while self.undo_stack.len() > limit {
                self.undo_stack.pop_front();
            }
        }
    }

    /// Pop the most recent entry; `current` becomes redoable.
    /// Returns the snapshot the scene must be restored to.
    pub fn undo(&mut self, current: SceneSnapshot) -> EditorResult<SceneSnapshot> {
        let entry = self.undo_stack.pop_back().ok_or(EditorError::NothingToUndo)?;
        debug!("Undo: {}", entry.label);
        self.redo_stack.push(HistoryEntry::new(entry.label, current));
        Ok(entry.snapshot)
    }

    /// Symmetric to [`History::undo`].
    pub fn redo(&mut self, current: SceneSnapshot) -> EditorResult<SceneSnapshot> {
        let entry = self.redo_stack.pop().ok_or(EditorError::NothingToRedo)?;
        debug!("Redo: {}", entry.label);
        self.undo_stack.push_back(HistoryEntry::new(entry.label, current));
        Ok(entry.snapshot)
    }

    /// Returns true if there are entries that can be undone
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns true if there are entries that can be redone
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn undo_entries(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> {
        self.undo_stack.iter()
    }

    pub fn redo_entries(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> {
        self.redo_stack.iter()
    }

    /// Clear the whole history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::factory;
    use crate::scene::{CanvasSize, Scene};
    use egui::{Color32, Pos2};

    fn scene() -> Scene {
        Scene::new(CanvasSize::new(100, 100), Color32::WHITE)
    }

    #[test]
    fn empty_history_reports_nothing_to_do() {
        let mut history = History::new();
        let current = scene().snapshot();
        assert_eq!(history.undo(current.clone()).unwrap_err(), EditorError::NothingToUndo);
        assert_eq!(history.redo(current).unwrap_err(), EditorError::NothingToRedo);
    }

    #[test]
    fn commit_clears_redo() {
        let mut scene = scene();
        let mut history = History::new();

        history.commit(HistoryEntry::new("Add", scene.snapshot()));
        scene.add_object(factory::create_rectangle(Pos2::ZERO, 1.0, 1.0, Color32::RED));
        let restored = history.undo(scene.snapshot()).unwrap();
        scene.restore(restored);
        assert!(history.can_redo());

        history.commit(HistoryEntry::new("Add", scene.snapshot()));
        assert!(!history.can_redo());
        assert_eq!(history.undo_len(), 1);
    }

    #[test]
    fn limit_drops_oldest_entries() {
        let mut scene = scene();
        let mut history = History::with_limit(Some(2));
        for i in 0..4 {
            history.commit(HistoryEntry::new("Add", scene.snapshot()));
            scene.add_object(factory::create_rectangle(Pos2::new(i as f32, 0.0), 1.0, 1.0, Color32::RED));
        }
        assert_eq!(history.undo_len(), 2);

        // The two retained entries still undo correctly
        let snapshot = history.undo(scene.snapshot()).unwrap();
        assert_eq!(snapshot.len(), 3);
        let snapshot = history.undo(snapshot).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert!(!history.can_undo());
    }
}
