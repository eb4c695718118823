//! The session: open buffers, structural history and the tab-restore ring,
//! behind one owned aggregate.
//!
//! Every operation runs to completion synchronously. Expected conditions
//! (missing file, failed write, empty undo stack, declined close) come back
//! as return values; session-state persistence after a change is
//! best-effort and only logged when it fails.
//!
//! There are two ways to bring a closed buffer back and they are kept
//! apart on purpose: [`Session::undo`] walks the structural history, while
//! [`Session::reopen_closed`] pops the recently-closed ring without
//! touching either stack. After mixing the two, an undo may find the
//! buffer already open again; it then leaves the store alone.

use conflict_engine::Strategy;

use crate::buffer::Buffer;
use crate::closed::ClosedRing;
use crate::config::SessionSettings;
use crate::error::SessionError;
use crate::history::{ClosedEntry, History, StructuralAction};
use crate::persistence::{PersistenceBridge, SessionState, SESSION_STATE_VERSION};
use crate::recent::RecentFiles;
use crate::store::DocumentStore;

/// Result of a single-buffer close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed,
    /// The buffer was dirty and the caller declined; nothing changed.
    Declined,
    NotFound,
}

pub struct Session<B> {
    store: DocumentStore,
    history: History,
    closed: ClosedRing,
    recent: RecentFiles,
    settings: SessionSettings,
    bridge: B,
}

impl<B: PersistenceBridge> Session<B> {
    /// Seed a session from the bridge's saved state, or start with the
    /// welcome buffer when there is none.
    pub fn restore(bridge: B, settings: SessionSettings) -> Self {
        let (store, recent) = match bridge.load_session_state() {
            Some(state) => {
                tracing::info!(
                    version = state.version,
                    buffers = state.buffers.len(),
                    "Restored session"
                );
                (
                    DocumentStore::new(state.buffers, state.active_id),
                    state.recent,
                )
            }
            None => {
                let welcome = Buffer::welcome();
                let active = Some(welcome.id().to_string());
                (DocumentStore::new(vec![welcome], active), Vec::new())
            }
        };

        Self {
            store,
            history: History::new(),
            closed: ClosedRing::new(settings.closed_ring_capacity),
            recent: RecentFiles::from_paths(recent, settings.recent_capacity),
            settings,
            bridge,
        }
    }

    pub fn buffers(&self) -> &[Buffer] {
        self.store.buffers()
    }

    pub fn get(&self, id: &str) -> Option<&Buffer> {
        self.store.get(id)
    }

    pub fn active_id(&self) -> Option<&str> {
        self.store.active_id()
    }

    pub fn active(&self) -> Option<&Buffer> {
        self.store.active()
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn closed(&self) -> &ClosedRing {
        &self.closed
    }

    pub fn recent(&self) -> &RecentFiles {
        &self.recent
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn is_dirty(buffer: &Buffer) -> bool {
        buffer.is_dirty()
    }

    /// Snapshot of what gets persisted.
    pub fn state(&self) -> SessionState {
        SessionState {
            version: SESSION_STATE_VERSION,
            buffers: self.store.buffers().to_vec(),
            active_id: self.store.active_id().map(str::to_string),
            recent: self.recent.paths().to_vec(),
        }
    }

    /// Replace a buffer's content. Not a structural action.
    ///
    /// This does not arm autosave; a caller running an
    /// [`Autosaver`](crate::autosave::Autosaver) reports the edit with
    /// `notify_edit` so the edited buffer (not the active one) gets saved.
    pub fn update(&mut self, id: &str, content: &str) -> bool {
        if !self.store.update(id, content) {
            tracing::debug!(id, "Update for unknown buffer ignored");
            return false;
        }
        self.persist();
        true
    }

    /// Open `path`, or just activate it when it is already open. Returns the
    /// buffer id, or `None` when the file could not be read.
    pub fn open(&mut self, path: &str) -> Option<String> {
        if self.store.contains(path) {
            self.store.set_active(path);
            self.persist();
            return Some(path.to_string());
        }

        let text = match self.bridge.read_text(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(path, error = %e, "Open skipped");
                return None;
            }
        };

        let buffer = Buffer::loaded(path, text);
        let previous_active = self.store.active_id().map(str::to_string);
        let index = self.store.push(buffer.clone());
        self.store.set_active(path);
        self.record(StructuralAction::NewBuffer {
            id: path.to_string(),
            index,
            snapshot: buffer,
            previous_active,
        });
        self.recent.push(path);
        tracing::info!(path, "Opened buffer");
        self.persist();
        Some(path.to_string())
    }

    /// Write a buffer's content through the bridge. On failure nothing
    /// changes and the buffer stays dirty.
    pub fn save(&mut self, id: &str) -> Result<(), SessionError> {
        let buffer = self
            .store
            .get(id)
            .ok_or_else(|| SessionError::UnknownBuffer(id.to_string()))?;
        let path = buffer.path().to_string();

        if let Err(e) = self.bridge.write_text(&path, buffer.content()) {
            tracing::warn!(id, path = %path, error = %e, "Save failed");
            return Err(e.into());
        }

        if let Some(buffer) = self.store.get_mut(id) {
            buffer.mark_saved();
        }
        self.recent.push(&path);
        tracing::info!(id, path = %path, "Saved buffer");
        self.persist();
        Ok(())
    }

    /// Create an empty buffer and activate it. Without a name one is
    /// generated from the current time.
    pub fn new_buffer(&mut self, name: Option<&str>) -> Result<String, SessionError> {
        let id = match name {
            Some(name) => name.to_string(),
            None => untitled_name(),
        };
        if self.store.contains(&id) {
            return Err(SessionError::IdTaken(id));
        }

        let buffer = Buffer::empty(&id);
        let previous_active = self.store.active_id().map(str::to_string);
        let index = self.store.push(buffer.clone());
        self.store.set_active(&id);
        self.record(StructuralAction::NewBuffer {
            id: id.clone(),
            index,
            snapshot: buffer,
            previous_active,
        });
        tracing::info!(id = %id, "Created buffer");
        self.persist();
        Ok(id)
    }

    /// Close a buffer. A dirty buffer is only closed when `confirm` agrees.
    pub fn close<F>(&mut self, id: &str, confirm: F) -> CloseOutcome
    where
        F: FnOnce(&Buffer) -> bool,
    {
        let Some(buffer) = self.store.get(id) else {
            return CloseOutcome::NotFound;
        };
        if buffer.is_dirty() && !confirm(buffer) {
            tracing::debug!(id, "Close declined");
            return CloseOutcome::Declined;
        }

        let was_active = self.store.active_id() == Some(id);
        let Some((index, snapshot)) = self.store.remove(id) else {
            return CloseOutcome::NotFound;
        };
        self.closed.push(snapshot.clone());
        self.record(StructuralAction::CloseBuffer {
            snapshot,
            was_active,
            index,
        });
        tracing::info!(id, "Closed buffer");
        self.persist();
        CloseOutcome::Closed
    }

    /// Close every buffer except `id` and the exempt ones, then activate
    /// `id`. Returns how many buffers closed.
    pub fn close_others<F>(&mut self, id: &str, confirm: F) -> usize
    where
        F: FnMut(&Buffer) -> bool,
    {
        if !self.store.contains(id) {
            return 0;
        }
        self.close_batch(|b| b.id() != id, Some(id.to_string()), confirm)
    }

    /// Close every buffer that is not exempt. Returns how many closed.
    pub fn close_all<F>(&mut self, confirm: F) -> usize
    where
        F: FnMut(&Buffer) -> bool,
    {
        self.close_batch(|_| true, None, confirm)
    }

    fn close_batch<P, F>(&mut self, wanted: P, activate: Option<String>, mut confirm: F) -> usize
    where
        P: Fn(&Buffer) -> bool,
        F: FnMut(&Buffer) -> bool,
    {
        let ids: Vec<String> = self
            .store
            .buffers()
            .iter()
            .filter(|b| wanted(*b) && !self.settings.is_exempt(b.id()))
            .filter(|b| !b.is_dirty() || confirm(*b))
            .map(|b| b.id().to_string())
            .collect();
        if ids.is_empty() {
            return 0;
        }

        let previous_active = self.store.active_id().map(str::to_string);
        let removed = self.store.remove_many(&ids);
        if let Some(id) = activate.as_deref() {
            self.store.set_active(id);
        }

        let closed: Vec<ClosedEntry> = removed
            .into_iter()
            .map(|(index, snapshot)| ClosedEntry { index, snapshot })
            .collect();
        for entry in &closed {
            self.closed.push(entry.snapshot.clone());
        }
        let count = closed.len();
        let active_after = self.store.active_id().map(str::to_string);
        self.record(StructuralAction::CloseBatch {
            closed,
            previous_active,
            active_after,
        });
        tracing::info!(count, "Closed buffers");
        self.persist();
        count
    }

    /// Give a buffer a new path. Its id becomes the new path, so the
    /// returned id replaces the old one for every holder.
    pub fn rename_buffer(&mut self, old_id: &str, new_path: &str) -> Result<String, SessionError> {
        let buffer = self
            .store
            .get(old_id)
            .ok_or_else(|| SessionError::UnknownBuffer(old_id.to_string()))?;
        if old_id != new_path && self.store.contains(new_path) {
            return Err(SessionError::IdTaken(new_path.to_string()));
        }

        let from_path = buffer.path().to_string();
        let from_language = buffer.language().to_string();
        let to_language = crate::buffer::guess_language(new_path).to_string();
        if !self
            .store
            .rename(old_id, new_path, new_path, &to_language)
        {
            return Err(SessionError::IdTaken(new_path.to_string()));
        }

        self.record(StructuralAction::RenameBuffer {
            from_id: old_id.to_string(),
            to_id: new_path.to_string(),
            from_path,
            to_path: new_path.to_string(),
            from_language,
            to_language,
        });
        tracing::info!(from = old_id, to = new_path, "Renamed buffer");
        self.persist();
        Ok(new_path.to_string())
    }

    pub fn set_active(&mut self, id: &str) -> bool {
        if !self.store.set_active(id) {
            return false;
        }
        self.persist();
        true
    }

    /// Reverse the latest structural action. Returns false on an empty stack.
    pub fn undo(&mut self) -> bool {
        let Some(mut action) = self.history.pop_undo() else {
            return false;
        };
        if !action.revert(&mut self.store) {
            tracing::warn!(kind = action.kind(), "Undo could not apply; session diverged");
        } else {
            tracing::info!(kind = action.kind(), "Undo");
        }
        self.history.push_redo(action);
        self.persist();
        true
    }

    /// Re-apply the latest undone action. Returns false on an empty stack.
    pub fn redo(&mut self) -> bool {
        let Some(mut action) = self.history.pop_redo() else {
            return false;
        };
        if !action.replay(&mut self.store) {
            tracing::warn!(kind = action.kind(), "Redo could not apply; session diverged");
        } else {
            tracing::info!(kind = action.kind(), "Redo");
        }
        self.history.push_undo(action);
        self.persist();
        true
    }

    /// Bring back the most recently closed buffer and activate it. Does not
    /// touch the undo or redo stacks.
    pub fn reopen_closed(&mut self) -> Option<String> {
        let snapshot = self.closed.pop_latest()?;
        let id = snapshot.id().to_string();
        if !self.store.contains(&id) {
            self.store.push(snapshot);
        }
        self.store.set_active(&id);
        tracing::info!(id = %id, "Reopened closed buffer");
        self.persist();
        Some(id)
    }

    /// Collapse every conflict block in a buffer to one side. This is a
    /// content edit: the buffer turns dirty and history is untouched.
    /// Returns how many blocks were collapsed.
    pub fn resolve_conflicts(&mut self, id: &str, strategy: Strategy) -> Result<usize, SessionError> {
        let buffer = self
            .store
            .get(id)
            .ok_or_else(|| SessionError::UnknownBuffer(id.to_string()))?;
        let blocks = conflict_engine::scan(buffer.content()).len();
        if blocks == 0 {
            return Ok(0);
        }

        let resolved = conflict_engine::resolve(buffer.content(), strategy);
        self.store.update(id, &resolved);
        tracing::info!(id, blocks, strategy = %strategy, "Resolved conflicts");
        self.persist();
        Ok(blocks)
    }

    fn record(&mut self, action: StructuralAction) {
        self.history.record(action);
    }

    fn persist(&self) {
        if let Err(e) = self.bridge.save_session_state(&self.state()) {
            tracing::warn!(error = %e, "Failed to persist session state");
        }
    }
}

fn untitled_name() -> String {
    let ts = chrono::Utc::now().timestamp_millis();
    let rand = uuid::Uuid::new_v4().simple().to_string();
    format!("untitled-{}_{}.txt", ts, &rand[..7])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryBridge;

    fn session_with(files: &[(&str, &str)]) -> Session<MemoryBridge> {
        let bridge = files
            .iter()
            .fold(MemoryBridge::new(), |b, (path, text)| b.with_file(path, text));
        Session::restore(bridge, SessionSettings::default())
    }

    fn ids<B: PersistenceBridge>(session: &Session<B>) -> Vec<String> {
        session.buffers().iter().map(|b| b.id().to_string()).collect()
    }

    fn assert_dirty_invariant<B: PersistenceBridge>(session: &Session<B>) {
        for b in session.buffers() {
            assert_eq!(
                Session::<B>::is_dirty(b),
                b.content() != b.saved_content().unwrap_or("")
            );
        }
    }

    #[test]
    fn test_fresh_session_has_welcome_buffer() {
        let session = session_with(&[]);
        assert_eq!(ids(&session), vec!["welcome"]);
        assert_eq!(session.active_id(), Some("welcome"));
        assert!(!session.history().can_undo());
    }

    #[test]
    fn test_open_is_idempotent() {
        let mut session = session_with(&[("a.ts", "let a = 1;\n")]);
        assert_eq!(session.open("a.ts").as_deref(), Some("a.ts"));
        session.set_active("welcome");
        assert_eq!(session.open("a.ts").as_deref(), Some("a.ts"));

        assert_eq!(ids(&session), vec!["welcome", "a.ts"]);
        assert_eq!(session.active_id(), Some("a.ts"));
        assert_eq!(session.history().undo_len(), 1);
        let buf = session.get("a.ts").unwrap();
        assert_eq!(buf.language(), "typescript");
        assert_eq!(buf.saved_content(), Some("let a = 1;\n"));
        assert_dirty_invariant(&session);
    }

    #[test]
    fn test_open_missing_file_changes_nothing() {
        let mut session = session_with(&[]);
        assert!(session.open("ghost.txt").is_none());
        assert_eq!(ids(&session), vec!["welcome"]);
        assert_eq!(session.active_id(), Some("welcome"));
        assert!(!session.history().can_undo());
        assert!(session.recent().is_empty());
    }

    #[test]
    fn test_update_and_save_track_dirty() {
        let mut session = session_with(&[("a.txt", "one")]);
        session.open("a.txt");
        assert!(session.update("a.txt", "two"));
        assert!(!session.update("missing", "x"));
        assert!(session.get("a.txt").unwrap().is_dirty());
        assert_dirty_invariant(&session);

        session.save("a.txt").unwrap();
        assert!(!session.get("a.txt").unwrap().is_dirty());
        assert_eq!(session.bridge().file("a.txt").as_deref(), Some("two"));
        assert_eq!(session.history().undo_len(), 1);
        assert_dirty_invariant(&session);
    }

    #[test]
    fn test_failed_save_keeps_buffer_dirty() {
        let mut session = session_with(&[("a.txt", "one")]);
        session.open("a.txt");
        session.update("a.txt", "two");
        session.bridge().set_fail_writes(true);

        assert!(matches!(session.save("a.txt"), Err(SessionError::Bridge(_))));
        let buf = session.get("a.txt").unwrap();
        assert!(buf.is_dirty());
        assert_eq!(buf.saved_content(), Some("one"));
        assert!(matches!(
            session.save("nope"),
            Err(SessionError::UnknownBuffer(_))
        ));
    }

    #[test]
    fn test_new_buffer_defaults() {
        let mut session = session_with(&[]);
        let id = session.new_buffer(None).unwrap();
        assert!(id.starts_with("untitled-") && id.ends_with(".txt"));
        assert_eq!(session.active_id(), Some(id.as_str()));
        let buf = session.get(&id).unwrap();
        assert_eq!(buf.content(), "");
        assert_eq!(buf.saved_content(), Some(""));

        let named = session.new_buffer(Some("notes.md")).unwrap();
        assert_eq!(session.get(&named).unwrap().language(), "markdown");
        assert!(matches!(
            session.new_buffer(Some("notes.md")),
            Err(SessionError::IdTaken(_))
        ));
        assert_eq!(session.history().undo_len(), 2);
    }

    #[test]
    fn test_declined_close_changes_nothing() {
        let mut session = session_with(&[("a.txt", "one"), ("b.txt", "two")]);
        session.open("a.txt");
        session.open("b.txt");
        session.undo();
        session.update("a.txt", "edited");

        let before = session.state();
        let undo_len = session.history().undo_len();
        let redo_len = session.history().redo_len();
        assert_eq!(redo_len, 1);

        let mut asked = false;
        let outcome = session.close("a.txt", |b| {
            asked = true;
            assert_eq!(b.id(), "a.txt");
            false
        });
        assert!(asked);
        assert_eq!(outcome, CloseOutcome::Declined);
        assert_eq!(session.state(), before);
        assert_eq!(session.history().undo_len(), undo_len);
        assert_eq!(session.history().redo_len(), redo_len);
        assert!(session.closed().is_empty());
    }

    #[test]
    fn test_clean_close_does_not_ask() {
        let mut session = session_with(&[("a.txt", "one")]);
        session.open("a.txt");
        let outcome = session.close("a.txt", |_| panic!("clean buffers need no confirmation"));
        assert_eq!(outcome, CloseOutcome::Closed);
        assert_eq!(session.active_id(), Some("welcome"));
        assert_eq!(session.closed().len(), 1);
        assert_eq!(session.close("a.txt", |_| true), CloseOutcome::NotFound);
        assert_dirty_invariant(&session);
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut session = session_with(&[("a.ts", "a"), ("b.md", "b")]);
        session.open("a.ts");
        session.new_buffer(Some("scratch.txt")).unwrap();
        session.update("scratch.txt", "draft");
        session.open("b.md");
        session.rename_buffer("a.ts", "a.js").unwrap();
        session.close("scratch.txt", |_| true);
        session.close_others("b.md", |_| true);

        let after = session.state();
        let n = session.history().undo_len();
        assert_eq!(n, 6);

        for _ in 0..n {
            assert!(session.undo());
            assert_dirty_invariant(&session);
        }
        assert_eq!(ids(&session), vec!["welcome"]);
        assert!(!session.undo());

        for _ in 0..n {
            assert!(session.redo());
            assert_dirty_invariant(&session);
        }
        assert!(!session.redo());
        assert_eq!(session.state().buffers, after.buffers);
        assert_eq!(session.state().active_id, after.active_id);
    }

    #[test]
    fn test_new_action_invalidates_redo() {
        let mut session = session_with(&[("a.txt", "a")]);
        session.open("a.txt");
        assert!(session.undo());
        assert!(session.history().can_redo());

        session.new_buffer(Some("fresh.txt")).unwrap();
        assert!(!session.history().can_redo());
        assert!(!session.redo());
        assert!(session.get("a.txt").is_none());
    }

    #[test]
    fn test_undo_close_restores_snapshot_and_focus() {
        let mut session = session_with(&[("a.txt", "a"), ("b.txt", "b")]);
        session.open("a.txt");
        session.open("b.txt");
        session.set_active("a.txt");
        session.update("a.txt", "unsaved");
        session.close("a.txt", |_| true);
        assert_eq!(session.active_id(), Some("welcome"));

        assert!(session.undo());
        assert_eq!(ids(&session), vec!["welcome", "a.txt", "b.txt"]);
        assert_eq!(session.active_id(), Some("a.txt"));
        let buf = session.get("a.txt").unwrap();
        assert_eq!(buf.content(), "unsaved");
        assert!(buf.is_dirty());
    }

    #[test]
    fn test_closed_snapshot_is_independent() {
        let mut session = session_with(&[("a.txt", "original")]);
        session.open("a.txt");
        session.close("a.txt", |_| true);
        session.open("a.txt");
        session.update("a.txt", "mutated later");
        session.close("a.txt", |_| true);

        // Undo the second close, then the reopen, then the first close.
        session.undo();
        session.undo();
        session.undo();
        assert_eq!(session.get("a.txt").unwrap().content(), "original");
    }

    #[test]
    fn test_rename_reassigns_identity() {
        let mut session = session_with(&[("a.txt", "a")]);
        session.open("a.txt");
        let new_id = session.rename_buffer("a.txt", "src/a.rs").unwrap();
        assert_eq!(new_id, "src/a.rs");
        assert!(session.get("a.txt").is_none());
        let buf = session.get("src/a.rs").unwrap();
        assert_eq!(buf.path(), "src/a.rs");
        assert_eq!(buf.language(), "rust");
        assert_eq!(session.active_id(), Some("src/a.rs"));
        assert_dirty_invariant(&session);

        assert!(matches!(
            session.rename_buffer("src/a.rs", "welcome"),
            Err(SessionError::IdTaken(_))
        ));
        assert!(matches!(
            session.rename_buffer("ghost", "x"),
            Err(SessionError::UnknownBuffer(_))
        ));

        session.undo();
        assert_eq!(session.get("a.txt").unwrap().language(), "plaintext");
        assert_eq!(session.active_id(), Some("a.txt"));
    }

    #[test]
    fn test_close_all_keeps_exempt_and_undoes_in_one_step() {
        let mut session = session_with(&[("a.txt", "a"), ("b.txt", "b")]);
        session.open("a.txt");
        session.open("b.txt");
        session.update("b.txt", "dirty");

        let closed = session.close_all(|b| b.id() != "b.txt");
        assert_eq!(closed, 1);
        assert_eq!(ids(&session), vec!["welcome", "b.txt"]);

        let closed = session.close_all(|_| true);
        assert_eq!(closed, 1);
        assert_eq!(ids(&session), vec!["welcome"]);
        assert_eq!(session.active_id(), Some("welcome"));
        assert_eq!(session.closed().len(), 2);
        assert_dirty_invariant(&session);

        session.undo();
        assert_eq!(ids(&session), vec!["welcome", "b.txt"]);
        assert_eq!(session.active_id(), Some("b.txt"));
    }

    #[test]
    fn test_close_others_activates_target() {
        let mut session = session_with(&[("a.txt", "a"), ("b.txt", "b"), ("c.txt", "c")]);
        session.open("a.txt");
        session.open("b.txt");
        session.open("c.txt");

        assert_eq!(session.close_others("b.txt", |_| true), 2);
        assert_eq!(ids(&session), vec!["welcome", "b.txt"]);
        assert_eq!(session.active_id(), Some("b.txt"));
        assert_eq!(session.close_others("ghost", |_| true), 0);
        assert_dirty_invariant(&session);

        session.undo();
        assert_eq!(ids(&session), vec!["welcome", "a.txt", "b.txt", "c.txt"]);
        assert_eq!(session.active_id(), Some("c.txt"));
    }

    #[test]
    fn test_reopen_closed_bypasses_history() {
        let mut session = session_with(&[("a.txt", "a")]);
        session.open("a.txt");
        session.close("a.txt", |_| true);
        let undo_len = session.history().undo_len();

        assert_eq!(session.reopen_closed().as_deref(), Some("a.txt"));
        assert_eq!(session.active_id(), Some("a.txt"));
        assert_eq!(session.history().undo_len(), undo_len);
        assert!(session.reopen_closed().is_none());

        // The structural undo of the close now finds the buffer open again.
        assert!(session.undo());
        assert_eq!(ids(&session), vec!["welcome", "a.txt"]);
    }

    #[test]
    fn test_reopen_closed_when_already_open_only_activates() {
        let mut session = session_with(&[("a.txt", "a")]);
        session.open("a.txt");
        session.close("a.txt", |_| true);
        assert!(session.undo());
        assert!(session.get("a.txt").is_some());
        assert_eq!(session.closed().len(), 1);
        session.set_active("welcome");

        assert_eq!(session.reopen_closed().as_deref(), Some("a.txt"));
        assert_eq!(ids(&session), vec!["welcome", "a.txt"]);
        assert_eq!(session.active_id(), Some("a.txt"));
        assert!(session.closed().is_empty());
        assert_dirty_invariant(&session);
    }

    #[test]
    fn test_undo_batch_close_skips_member_already_reopened() {
        let mut session = session_with(&[("a.txt", "a"), ("b.txt", "b")]);
        session.open("a.txt");
        session.open("b.txt");
        assert_eq!(session.close_all(|_| true), 2);

        assert_eq!(session.reopen_closed().as_deref(), Some("b.txt"));
        assert_eq!(ids(&session), vec!["welcome", "b.txt"]);

        assert!(session.undo());
        assert_eq!(ids(&session), vec!["welcome", "a.txt", "b.txt"]);
        assert_eq!(session.active_id(), Some("b.txt"));
        assert_eq!(session.history().redo_len(), 1);
        assert_dirty_invariant(&session);
    }

    #[test]
    fn test_resolve_conflicts_is_a_content_edit() {
        let text = "a\n<<<<<<< HEAD\nmine\n=======\nyours\n>>>>>>> topic\nz\n";
        let mut session = session_with(&[("merge.txt", text)]);
        session.open("merge.txt");
        let undo_len = session.history().undo_len();

        assert_eq!(session.resolve_conflicts("merge.txt", Strategy::Ours).unwrap(), 1);
        let buf = session.get("merge.txt").unwrap();
        assert_eq!(buf.content(), "a\nmine\nz\n");
        assert!(buf.is_dirty());
        assert_eq!(session.history().undo_len(), undo_len);
        assert_eq!(session.resolve_conflicts("merge.txt", Strategy::Ours).unwrap(), 0);
    }

    #[test]
    fn test_state_is_persisted_and_restored() {
        let mut session = session_with(&[("a.txt", "a")]);
        session.open("a.txt");
        session.update("a.txt", "changed");
        let saved = session.bridge().saved_state().unwrap();
        assert_eq!(saved.version, SESSION_STATE_VERSION);
        assert_eq!(saved.active_id.as_deref(), Some("a.txt"));
        assert_eq!(saved.recent, vec!["a.txt".to_string()]);

        let restored = Session::restore(
            MemoryBridge::new().with_state(saved),
            SessionSettings::default(),
        );
        assert_eq!(ids(&restored), vec!["welcome", "a.txt"]);
        assert!(restored.get("a.txt").unwrap().is_dirty());
        assert_eq!(restored.active_id(), Some("a.txt"));
        assert_eq!(restored.recent().paths(), ["a.txt"]);
    }

    #[test]
    fn test_failed_state_save_is_swallowed() {
        let mut session = session_with(&[]);
        session.bridge().set_fail_writes(true);
        let id = session.new_buffer(Some("x.txt")).unwrap();
        assert_eq!(session.active_id(), Some(id.as_str()));
    }
}
