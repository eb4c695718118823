pub mod autosave;
pub mod buffer;
pub mod closed;
pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod persistence;
pub mod recent;
pub mod session;
pub mod store;

pub use autosave::Autosaver;
pub use buffer::{guess_language, is_dirty, Buffer};
pub use config::Settings;
pub use error::{BridgeError, SessionError};
pub use history::StructuralAction;
pub use persistence::{FsBridge, MemoryBridge, PersistenceBridge, SessionState};
pub use session::{CloseOutcome, Session};
