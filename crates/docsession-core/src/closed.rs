use std::collections::VecDeque;

use crate::buffer::Buffer;

pub const DEFAULT_CLOSED_CAPACITY: usize = 20;

/// Bounded list of recently closed buffers for tab restore.
///
/// Independent of the undo stacks: restoring from here records nothing, and
/// recording new actions never touches it.
#[derive(Debug, Clone)]
pub struct ClosedRing {
    entries: VecDeque<Buffer>,
    capacity: usize,
}

impl ClosedRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Remember a closed buffer, evicting the oldest entry when full.
    pub fn push(&mut self, snapshot: Buffer) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
    }

    /// Take the most recently closed buffer.
    pub fn pop_latest(&mut self) -> Option<Buffer> {
        self.entries.pop_back()
    }

    /// Entries, most recently closed first.
    pub fn iter(&self) -> impl Iterator<Item = &Buffer> {
        self.entries.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ClosedRing {
    fn default() -> Self {
        Self::new(DEFAULT_CLOSED_CAPACITY)
    }
}
