use crate::buffer::Buffer;

/// Ordered set of open buffers plus the active selection.
///
/// Invariants: ids are unique, and `active_id` names an existing buffer
/// unless the store is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentStore {
    buffers: Vec<Buffer>,
    active_id: Option<String>,
}

impl DocumentStore {
    /// Build a store, dropping duplicate ids and repairing `active_id`.
    pub fn new(buffers: Vec<Buffer>, active_id: Option<String>) -> Self {
        let mut unique: Vec<Buffer> = Vec::with_capacity(buffers.len());
        for buffer in buffers {
            if unique.iter().any(|b| b.id == buffer.id) {
                tracing::warn!(id = %buffer.id, "Dropping duplicate buffer");
                continue;
            }
            unique.push(buffer);
        }

        let mut store = Self {
            buffers: unique,
            active_id: None,
        };
        store.restore_active(active_id.as_deref());
        store
    }

    pub fn buffers(&self) -> &[Buffer] {
        &self.buffers
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active(&self) -> Option<&Buffer> {
        self.active_id.as_deref().and_then(|id| self.get(id))
    }

    pub fn get(&self, id: &str) -> Option<&Buffer> {
        self.buffers.iter().find(|b| b.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.buffers.iter().position(|b| b.id == id)
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Buffer> {
        self.buffers.iter_mut().find(|b| b.id == id)
    }

    /// Replace a buffer's content. Returns false for an unknown id.
    pub(crate) fn update(&mut self, id: &str, content: &str) -> bool {
        match self.get_mut(id) {
            Some(buffer) => {
                buffer.content = content.to_string();
                true
            }
            None => false,
        }
    }

    pub fn set_active(&mut self, id: &str) -> bool {
        if self.contains(id) {
            self.active_id = Some(id.to_string());
            true
        } else {
            false
        }
    }

    /// Activate `id` if it exists, otherwise fall back to the first buffer.
    pub(crate) fn restore_active(&mut self, id: Option<&str>) {
        match id {
            Some(id) if self.contains(id) => self.active_id = Some(id.to_string()),
            _ => self.active_id = self.buffers.first().map(|b| b.id.clone()),
        }
    }

    /// Insert at `index` (clamped to the end). The caller guarantees the id
    /// is not already present.
    pub(crate) fn insert(&mut self, index: usize, buffer: Buffer) {
        let index = index.min(self.buffers.len());
        if self.active_id.is_none() {
            self.active_id = Some(buffer.id.clone());
        }
        self.buffers.insert(index, buffer);
    }

    pub(crate) fn push(&mut self, buffer: Buffer) -> usize {
        let index = self.buffers.len();
        self.insert(index, buffer);
        index
    }

    /// Remove a buffer, returning its former index. If it was active the
    /// first remaining buffer becomes active.
    pub(crate) fn remove(&mut self, id: &str) -> Option<(usize, Buffer)> {
        let index = self.position(id)?;
        let buffer = self.buffers.remove(index);
        if self.active_id.as_deref() == Some(id) {
            self.restore_active(None);
        }
        Some((index, buffer))
    }

    /// Remove every buffer named in `ids`. Indices in the result refer to the
    /// list before any removal and come back in ascending order.
    pub(crate) fn remove_many(&mut self, ids: &[String]) -> Vec<(usize, Buffer)> {
        let doomed: Vec<usize> = self
            .buffers
            .iter()
            .enumerate()
            .filter(|(_, b)| ids.contains(&b.id))
            .map(|(i, _)| i)
            .collect();

        let mut removed: Vec<(usize, Buffer)> = doomed
            .into_iter()
            .rev()
            .map(|i| (i, self.buffers.remove(i)))
            .collect();
        removed.reverse();

        let active = self.active_id.clone();
        self.restore_active(active.as_deref());
        removed
    }

    /// Reassign a buffer's identity. Fails when `from` is unknown or `to`
    /// already names a different buffer. The active selection follows.
    pub(crate) fn rename(&mut self, from: &str, to: &str, path: &str, language: &str) -> bool {
        if from != to && self.contains(to) {
            return false;
        }
        let Some(buffer) = self.get_mut(from) else {
            return false;
        };
        buffer.id = to.to_string();
        buffer.path = path.to_string();
        buffer.language = language.to_string();
        if self.active_id.as_deref() == Some(from) {
            self.active_id = Some(to.to_string());
        }
        true
    }
}
