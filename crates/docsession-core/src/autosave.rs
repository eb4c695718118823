//! Debounced autosave.
//!
//! Each edit notification (re)arms a per-buffer timer. When a buffer has
//! been quiet for the whole delay it is saved once, provided it is still
//! open, still dirty and autosave is still enabled. Disabling autosave
//! drops every pending timer.
//!
//! The debouncer does not observe the session. Whoever edits a buffer
//! through [`Session::update`] reports it with [`Autosaver::notify_edit`],
//! and whoever changes a buffer's id (rename, or undo/redo of one) reports
//! it with [`Autosaver::notify_rename`] so the armed timer follows the
//! buffer. What gets saved is the edited buffer, not whichever is active.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::persistence::PersistenceBridge;
use crate::session::Session;

#[derive(Debug)]
enum AutosaveEvent {
    Edited(String),
    Renamed { from: String, to: String },
    CancelAll,
}

/// Handle to the background debouncer task.
pub struct Autosaver {
    tx: mpsc::UnboundedSender<AutosaveEvent>,
    enabled: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Autosaver {
    /// Spawn the debouncer on the current tokio runtime. It stops when
    /// `shutdown` fires or the handle is dropped.
    pub fn spawn<B>(
        session: Arc<Mutex<Session<B>>>,
        delay: Duration,
        enabled: bool,
        shutdown: broadcast::Receiver<()>,
    ) -> Self
    where
        B: PersistenceBridge + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let enabled = Arc::new(AtomicBool::new(enabled));
        let handle = tokio::spawn(run_debouncer(
            session,
            delay,
            enabled.clone(),
            rx,
            shutdown,
        ));
        Self {
            tx,
            enabled,
            handle,
        }
    }

    /// Tell the debouncer that buffer `id` was edited.
    pub fn notify_edit(&self, id: &str) {
        if !self.is_enabled() {
            return;
        }
        if self.tx.send(AutosaveEvent::Edited(id.to_string())).is_err() {
            tracing::debug!(id, "Autosave task gone; edit not scheduled");
        }
    }

    /// Move a pending save from `from` to `to` after the buffer's id changed.
    /// The remaining quiet period is kept.
    pub fn notify_rename(&self, from: &str, to: &str) {
        let event = AutosaveEvent::Renamed {
            from: from.to_string(),
            to: to.to_string(),
        };
        if self.tx.send(event).is_err() {
            tracing::debug!(from, to, "Autosave task gone; rename not tracked");
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        if !enabled {
            let _ = self.tx.send(AutosaveEvent::CancelAll);
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

async fn run_debouncer<B>(
    session: Arc<Mutex<Session<B>>>,
    delay: Duration,
    enabled: Arc<AtomicBool>,
    mut rx: mpsc::UnboundedReceiver<AutosaveEvent>,
    mut shutdown: broadcast::Receiver<()>,
) where
    B: PersistenceBridge + Send + 'static,
{
    let mut pending: HashMap<String, Instant> = HashMap::new();

    loop {
        let deadline = pending.values().min().copied();

        tokio::select! {
            event = rx.recv() => match event {
                Some(AutosaveEvent::Edited(id)) => {
                    pending.insert(id, Instant::now() + delay);
                }
                Some(AutosaveEvent::Renamed { from, to }) => {
                    if let Some(at) = pending.remove(&from) {
                        pending.insert(to, at);
                    }
                }
                Some(AutosaveEvent::CancelAll) => pending.clear(),
                None => break,
            },
            _ = wait_until(deadline) => {
                let now = Instant::now();
                let due: Vec<String> = pending
                    .iter()
                    .filter(|(_, at)| **at <= now)
                    .map(|(id, _)| id.clone())
                    .collect();
                for id in due {
                    pending.remove(&id);
                    flush(&session, &id, &enabled).await;
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("Autosave shutting down");
                break;
            }
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

async fn flush<B: PersistenceBridge>(
    session: &Mutex<Session<B>>,
    id: &str,
    enabled: &AtomicBool,
) {
    if !enabled.load(Ordering::SeqCst) {
        return;
    }
    let mut session = session.lock().await;
    match session.get(id) {
        None => {
            tracing::debug!(id, "Buffer closed before autosave");
            return;
        }
        Some(buffer) if !buffer.is_dirty() => return,
        Some(_) => {}
    }
    if let Err(e) = session.save(id) {
        tracing::warn!(id, error = %e, "Autosave failed");
    }
}
