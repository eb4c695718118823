//! Structural undo/redo.
//!
//! Structural actions change which buffers exist or what they are called;
//! content edits never show up here. Every action carries enough state to
//! be applied in both directions, and refreshes that state each time it is
//! applied so that undo followed by redo lands on the same buffers.

use crate::buffer::Buffer;
use crate::store::DocumentStore;

/// A buffer removed by a bulk close, with the index it occupied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedEntry {
    pub index: usize,
    pub snapshot: Buffer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralAction {
    /// A buffer was created by open or new-buffer. `snapshot` is what redo
    /// puts back; undo refreshes it from the buffer it removes.
    NewBuffer {
        id: String,
        index: usize,
        snapshot: Buffer,
        previous_active: Option<String>,
    },
    /// A single buffer was closed.
    CloseBuffer {
        snapshot: Buffer,
        was_active: bool,
        index: usize,
    },
    RenameBuffer {
        from_id: String,
        to_id: String,
        from_path: String,
        to_path: String,
        from_language: String,
        to_language: String,
    },
    /// Several buffers closed in one bulk operation, ascending by index.
    CloseBatch {
        closed: Vec<ClosedEntry>,
        previous_active: Option<String>,
        active_after: Option<String>,
    },
}

impl StructuralAction {
    pub fn kind(&self) -> &'static str {
        match self {
            StructuralAction::NewBuffer { .. } => "new",
            StructuralAction::CloseBuffer { .. } => "close",
            StructuralAction::RenameBuffer { .. } => "rename",
            StructuralAction::CloseBatch { .. } => "close-batch",
        }
    }

    /// The id change this action makes, as `(from, to)`, when applied
    /// forward or, with `undone`, in reverse. Only renames change ids.
    pub fn id_change(&self, undone: bool) -> Option<(&str, &str)> {
        match self {
            StructuralAction::RenameBuffer { from_id, to_id, .. } if undone => {
                Some((to_id.as_str(), from_id.as_str()))
            }
            StructuralAction::RenameBuffer { from_id, to_id, .. } => {
                Some((from_id.as_str(), to_id.as_str()))
            }
            _ => None,
        }
    }

    /// Apply the inverse of this action. Returns false when the store has
    /// diverged and the inverse could not apply; the store is then untouched.
    pub(crate) fn revert(&mut self, store: &mut DocumentStore) -> bool {
        match self {
            StructuralAction::NewBuffer {
                id,
                snapshot,
                previous_active,
                ..
            } => match store.remove(id) {
                Some((_, removed)) => {
                    *snapshot = removed;
                    store.restore_active(previous_active.as_deref());
                    true
                }
                None => false,
            },
            StructuralAction::CloseBuffer {
                snapshot,
                was_active,
                index,
            } => {
                if store.contains(&snapshot.id) {
                    return false;
                }
                store.insert(*index, snapshot.clone());
                if *was_active {
                    store.set_active(&snapshot.id);
                }
                true
            }
            StructuralAction::RenameBuffer {
                from_id,
                to_id,
                from_path,
                from_language,
                ..
            } => store.rename(to_id, from_id, from_path, from_language),
            StructuralAction::CloseBatch {
                closed,
                previous_active,
                ..
            } => {
                let mut restored = false;
                for entry in closed.iter() {
                    if store.contains(&entry.snapshot.id) {
                        continue;
                    }
                    store.insert(entry.index, entry.snapshot.clone());
                    restored = true;
                }
                if restored {
                    store.restore_active(previous_active.as_deref());
                }
                restored
            }
        }
    }

    /// Apply this action forward again (redo).
    pub(crate) fn replay(&mut self, store: &mut DocumentStore) -> bool {
        match self {
            StructuralAction::NewBuffer {
                id,
                index,
                snapshot,
                previous_active,
            } => {
                if store.contains(id) {
                    return false;
                }
                *previous_active = store.active_id().map(str::to_string);
                *index = (*index).min(store.len());
                store.insert(*index, snapshot.clone());
                store.set_active(id);
                true
            }
            StructuralAction::CloseBuffer {
                snapshot,
                was_active,
                index,
            } => {
                let id = snapshot.id.clone();
                let active = store.active_id() == Some(id.as_str());
                match store.remove(&id) {
                    Some((at, removed)) => {
                        *snapshot = removed;
                        *was_active = active;
                        *index = at;
                        true
                    }
                    None => false,
                }
            }
            StructuralAction::RenameBuffer {
                from_id,
                to_id,
                to_path,
                to_language,
                ..
            } => store.rename(from_id, to_id, to_path, to_language),
            StructuralAction::CloseBatch {
                closed,
                previous_active,
                active_after,
            } => {
                let ids: Vec<String> = closed.iter().map(|e| e.snapshot.id.clone()).collect();
                let before = store.active_id().map(str::to_string);
                let removed = store.remove_many(&ids);
                if removed.is_empty() {
                    return false;
                }
                *previous_active = before;
                *closed = removed
                    .into_iter()
                    .map(|(index, snapshot)| ClosedEntry { index, snapshot })
                    .collect();
                if let Some(id) = active_after.as_deref() {
                    store.set_active(id);
                }
                true
            }
        }
    }
}

/// Undo and redo stacks.
#[derive(Debug, Clone, Default)]
pub struct History {
    undo: Vec<StructuralAction>,
    redo: Vec<StructuralAction>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a freshly performed action. Invalidates the redo future.
    pub fn record(&mut self, action: StructuralAction) {
        self.undo.push(action);
        self.redo.clear();
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

    pub fn undo_stack(&self) -> &[StructuralAction] {
        &self.undo
    }

    pub fn redo_stack(&self) -> &[StructuralAction] {
        &self.redo
    }

    pub(crate) fn pop_undo(&mut self) -> Option<StructuralAction> {
        self.undo.pop()
    }

    pub(crate) fn pop_redo(&mut self) -> Option<StructuralAction> {
        self.redo.pop()
    }

    pub(crate) fn push_undo(&mut self, action: StructuralAction) {
        self.undo.push(action);
    }

    pub(crate) fn push_redo(&mut self, action: StructuralAction) {
        self.redo.push(action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_of(ids: &[&str]) -> DocumentStore {
        DocumentStore::new(
            ids.iter().map(|id| Buffer::loaded(id, *id)).collect(),
            ids.first().map(|id| id.to_string()),
        )
    }

    fn new_action(id: &str) -> StructuralAction {
        StructuralAction::NewBuffer {
            id: id.to_string(),
            index: 0,
            snapshot: Buffer::empty(id),
            previous_active: None,
        }
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = History::new();
        history.record(new_action("a"));
        let action = history.pop_undo().unwrap();
        history.push_redo(action);
        assert!(history.can_redo());
        history.record(new_action("b"));
        assert!(!history.can_redo());
        assert_eq!(history.undo_len(), 1);
    }

    #[test]
    fn test_new_buffer_revert_captures_edits() {
        let mut store = store_of(&["a"]);
        store.push(Buffer::empty("b"));
        store.set_active("b");
        store.update("b", "typed");
        let mut action = StructuralAction::NewBuffer {
            id: "b".into(),
            index: 1,
            snapshot: Buffer::empty("b"),
            previous_active: Some("a".into()),
        };

        assert!(action.revert(&mut store));
        assert!(!store.contains("b"));
        assert_eq!(store.active_id(), Some("a"));

        assert!(action.replay(&mut store));
        assert_eq!(store.get("b").unwrap().content(), "typed");
        assert_eq!(store.active_id(), Some("b"));
    }

    #[test]
    fn test_close_revert_restores_position_and_focus() {
        let mut store = store_of(&["a", "b", "c"]);
        store.set_active("b");
        let (index, snapshot) = store.remove("b").unwrap();
        let mut action = StructuralAction::CloseBuffer {
            snapshot,
            was_active: true,
            index,
        };

        assert!(action.revert(&mut store));
        let ids: Vec<&str> = store.buffers().iter().map(|b| b.id()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(store.active_id(), Some("b"));
    }

    #[test]
    fn test_close_revert_refuses_when_id_reopened() {
        let mut store = store_of(&["a", "b"]);
        let (index, snapshot) = store.remove("b").unwrap();
        store.push(Buffer::loaded("b", "reopened"));
        let mut action = StructuralAction::CloseBuffer {
            snapshot,
            was_active: false,
            index,
        };
        assert!(!action.revert(&mut store));
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("b").unwrap().content(), "reopened");
    }

    #[test]
    fn test_rename_round_trip() {
        let mut store = store_of(&["a.txt"]);
        store.rename("a.txt", "a.rs", "a.rs", "rust");
        let mut action = StructuralAction::RenameBuffer {
            from_id: "a.txt".into(),
            to_id: "a.rs".into(),
            from_path: "a.txt".into(),
            to_path: "a.rs".into(),
            from_language: "plaintext".into(),
            to_language: "rust".into(),
        };
        assert_eq!(action.id_change(false), Some(("a.txt", "a.rs")));
        assert_eq!(action.id_change(true), Some(("a.rs", "a.txt")));
        assert_eq!(new_action("x").id_change(true), None);
        assert!(action.revert(&mut store));
        assert_eq!(store.get("a.txt").unwrap().language(), "plaintext");
        assert!(action.replay(&mut store));
        assert_eq!(store.active_id(), Some("a.rs"));
    }
}
