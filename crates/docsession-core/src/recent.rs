pub const DEFAULT_RECENT_CAPACITY: usize = 10;

/// Most-recent-first list of paths touched by open and save.
#[derive(Debug, Clone)]
pub struct RecentFiles {
    paths: Vec<String>,
    capacity: usize,
}

impl RecentFiles {
    pub fn new(capacity: usize) -> Self {
        Self {
            paths: Vec::new(),
            capacity,
        }
    }

    /// Seed from persisted paths, keeping their order.
    pub fn from_paths(paths: Vec<String>, capacity: usize) -> Self {
        let mut recent = Self::new(capacity);
        for path in paths.into_iter().rev() {
            recent.push(&path);
        }
        recent
    }

    /// Move `path` to the front, dropping any older mention of it.
    pub fn push(&mut self, path: &str) {
        self.paths.retain(|p| p != path);
        self.paths.insert(0, path.to_string());
        self.paths.truncate(self.capacity);
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl Default for RecentFiles {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_CAPACITY)
    }
}
