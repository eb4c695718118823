use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::buffer::WELCOME_ID;
use crate::closed::DEFAULT_CLOSED_CAPACITY;
use crate::recent::DEFAULT_RECENT_CAPACITY;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub editor: EditorSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub workspace: WorkspaceSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorSettings {
    #[serde(default)]
    pub autosave: bool,
    #[serde(default = "default_autosave_delay_ms")]
    pub autosave_delay_ms: u64,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            autosave: false,
            autosave_delay_ms: default_autosave_delay_ms(),
        }
    }
}

impl EditorSettings {
    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(default = "default_closed_ring_capacity")]
    pub closed_ring_capacity: usize,
    #[serde(default = "default_recent_capacity")]
    pub recent_capacity: usize,
    /// Buffer ids that close-others and close-all never touch.
    #[serde(default = "default_bulk_close_exempt")]
    pub bulk_close_exempt: Vec<String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            closed_ring_capacity: default_closed_ring_capacity(),
            recent_capacity: default_recent_capacity(),
            bulk_close_exempt: default_bulk_close_exempt(),
        }
    }
}

impl SessionSettings {
    pub fn is_exempt(&self, id: &str) -> bool {
        self.bulk_close_exempt.iter().any(|e| e == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceSettings {
    /// Directory buffer paths are resolved against.
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

fn default_autosave_delay_ms() -> u64 {
    1000
}
fn default_closed_ring_capacity() -> usize {
    DEFAULT_CLOSED_CAPACITY
}
fn default_recent_capacity() -> usize {
    DEFAULT_RECENT_CAPACITY
}
fn default_bulk_close_exempt() -> Vec<String> {
    vec![WELCOME_ID.into()]
}
fn default_root() -> PathBuf {
    PathBuf::from(".")
}

impl Settings {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    /// Load `path`, or fall back to defaults when it does not exist yet.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
