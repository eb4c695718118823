//! Persistence bridge: file text in and out, session state across restarts.
//!
//! The session decides what to read or write and when; a bridge only moves
//! bytes. Bridges never hold session state of their own.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::buffer::Buffer;
use crate::error::BridgeError;

/// Layout version written by this crate. Files without a tag are version 0.
pub const SESSION_STATE_VERSION: u32 = 1;

/// Durable form of a session: the buffer list, active id and recent paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub buffers: Vec<Buffer>,
    #[serde(default)]
    pub active_id: Option<String>,
    #[serde(default)]
    pub recent: Vec<String>,
}

impl SessionState {
    /// Fill in what older layouts leave out: a buffer with no saved snapshot
    /// counts as saved with its current content.
    pub fn normalize(mut self) -> Self {
        for buffer in &mut self.buffers {
            if buffer.saved_content.is_none() {
                buffer.saved_content = Some(buffer.content.clone());
            }
        }
        self
    }
}

/// Collaborator that performs the session's I/O.
pub trait PersistenceBridge {
    /// Read the text stored at `path`; `BridgeError::NotFound` when missing.
    fn read_text(&self, path: &str) -> Result<String, BridgeError>;

    fn write_text(&self, path: &str, text: &str) -> Result<(), BridgeError>;

    /// Previously saved session state, if any could be read.
    fn load_session_state(&self) -> Option<SessionState>;

    fn save_session_state(&self, state: &SessionState) -> Result<(), BridgeError>;
}

/// Bridge over a workspace directory, with session state kept as JSON.
#[derive(Debug, Clone)]
pub struct FsBridge {
    root: PathBuf,
    state_path: PathBuf,
}

impl FsBridge {
    pub fn new(root: impl Into<PathBuf>, state_path: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            state_path: state_path.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

/// Write via a temp file and rename so readers never see a partial file.
fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let filename = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.tmp", filename));
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)
}

impl PersistenceBridge for FsBridge {
    fn read_text(&self, path: &str) -> Result<String, BridgeError> {
        std::fs::read_to_string(self.resolve(path)).map_err(|e| BridgeError::io(path, e))
    }

    fn write_text(&self, path: &str, text: &str) -> Result<(), BridgeError> {
        write_atomic(&self.resolve(path), text).map_err(|e| BridgeError::io(path, e))
    }

    fn load_session_state(&self) -> Option<SessionState> {
        let content = match std::fs::read_to_string(&self.state_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(
                    path = %self.state_path.display(),
                    error = %e,
                    "Failed to read session state"
                );
                return None;
            }
        };
        match serde_json::from_str::<SessionState>(&content) {
            Ok(state) => Some(state.normalize()),
            Err(e) => {
                tracing::warn!(
                    path = %self.state_path.display(),
                    error = %e,
                    "Ignoring unreadable session state"
                );
                None
            }
        }
    }

    fn save_session_state(&self, state: &SessionState) -> Result<(), BridgeError> {
        let content = serde_json::to_string_pretty(state)?;
        write_atomic(&self.state_path, &content)
            .map_err(|e| BridgeError::io(self.state_path.display().to_string(), e))
    }
}

/// In-memory bridge for tests and embedders without a file system.
#[derive(Debug, Default)]
pub struct MemoryBridge {
    files: Mutex<HashMap<String, String>>,
    state: Mutex<Option<SessionState>>,
    fail_writes: AtomicBool,
    text_writes: AtomicUsize,
}

impl MemoryBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, text: &str) -> Self {
        self.put_file(path, text);
        self
    }

    pub fn with_state(self, state: SessionState) -> Self {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = Some(state);
        self
    }

    pub fn put_file(&self, path: &str, text: &str) {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_string(), text.to_string());
    }

    pub fn file(&self, path: &str) -> Option<String> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `write_text` calls.
    pub fn text_writes(&self) -> usize {
        self.text_writes.load(Ordering::SeqCst)
    }

    pub fn saved_state(&self) -> Option<SessionState> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PersistenceBridge for MemoryBridge {
    fn read_text(&self, path: &str) -> Result<String, BridgeError> {
        self.file(path)
            .ok_or_else(|| BridgeError::NotFound(path.to_string()))
    }

    fn write_text(&self, path: &str, text: &str) -> Result<(), BridgeError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BridgeError::Rejected(path.to_string()));
        }
        self.put_file(path, text);
        self.text_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn load_session_state(&self) -> Option<SessionState> {
        self.saved_state().map(SessionState::normalize)
    }

    fn save_session_state(&self, state: &SessionState) -> Result<(), BridgeError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BridgeError::Rejected("session state".to_string()));
        }
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = Some(state.clone());
        Ok(())
    }
}
