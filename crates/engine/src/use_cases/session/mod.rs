//! Session lifecycle for one feed instance.
//!
//! A session is opened once when the feed mounts and closed once when it
//! unmounts. Opening never blocks the feed: until it resolves (or if it
//! fails) events are recorded without a session id. A close that arrives
//! while the open is still in flight is deferred, and the session is closed
//! as soon as the open resolves without ever being exposed.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::task::TaskTracker;

use explore_domain::{DeviceClass, SessionId};

use crate::infrastructure::ports::SessionPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Unopened,
    Opening,
    /// Close requested while the open was in flight.
    CloseRequested,
    Open(SessionId),
    /// Open failed; the feed runs without a session.
    Degraded,
    Closed,
}

impl SessionPhase {
    pub fn session_id(&self) -> Option<SessionId> {
        match self {
            SessionPhase::Open(id) => Some(*id),
            _ => None,
        }
    }
}

/// Read-only view of the session, used to tag events at emission time.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    rx: watch::Receiver<SessionPhase>,
}

impl SessionHandle {
    /// Handle that never has a session.
    pub fn detached() -> Self {
        let (_tx, rx) = watch::channel(SessionPhase::Unopened);
        Self { rx }
    }

    pub fn current(&self) -> Option<SessionId> {
        self.rx.borrow().session_id()
    }

    pub fn phase(&self) -> SessionPhase {
        *self.rx.borrow()
    }
}

/// State shared with the open task.
struct SessionShared {
    port: Arc<dyn SessionPort>,
    state: watch::Sender<SessionPhase>,
}

pub struct SessionManager {
    shared: Arc<SessionShared>,
    /// Holds the open request so it completes even if the caller goes away.
    tasks: TaskTracker,
}

impl SessionManager {
    pub fn new(port: Arc<dyn SessionPort>) -> Self {
        let (state, _rx) = watch::channel(SessionPhase::Unopened);
        Self {
            shared: Arc::new(SessionShared { port, state }),
            tasks: TaskTracker::new(),
        }
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            rx: self.shared.state.subscribe(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        *self.shared.state.borrow()
    }

    /// Opens the session. Only the first call does anything; later calls
    /// return the current id.
    ///
    /// The request runs on its own task: dropping this future does not
    /// abandon it, and a close requested meanwhile is still carried out.
    pub async fn open_session(&self, device: DeviceClass) -> Option<SessionId> {
        let started = self.shared.state.send_if_modified(|phase| {
            if *phase == SessionPhase::Unopened {
                *phase = SessionPhase::Opening;
                true
            } else {
                false
            }
        });
        if !started {
            let phase = self.phase();
            tracing::warn!(?phase, "open_session called more than once, ignoring");
            return phase.session_id();
        }

        let shared = self.shared.clone();
        let opening = self
            .tasks
            .spawn(async move { shared.finish_open(device).await });
        match opening.await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(error = %e, "Session open task failed");
                self.phase().session_id()
            }
        }
    }

    /// Closes the session. Idempotent. When the open is still in flight the
    /// close is left to the open task; see [`SessionManager::settle`].
    pub async fn close_session(&self) {
        let mut to_close = None;
        let changed = self.shared.state.send_if_modified(|phase| match *phase {
            SessionPhase::Opening => {
                *phase = SessionPhase::CloseRequested;
                true
            }
            SessionPhase::Open(id) => {
                to_close = Some(id);
                *phase = SessionPhase::Closed;
                true
            }
            SessionPhase::Unopened | SessionPhase::Degraded => {
                *phase = SessionPhase::Closed;
                true
            }
            SessionPhase::CloseRequested | SessionPhase::Closed => false,
        });

        if !changed {
            tracing::debug!("Session already closed or closing");
            return;
        }
        match to_close {
            Some(id) => self.shared.close_remote(id).await,
            None => tracing::debug!(phase = ?self.phase(), "No open session to close"),
        }
    }

    /// Waits for an in-flight open, including any deferred close it owes.
    pub async fn settle(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }
}

impl SessionShared {
    async fn finish_open(&self, device: DeviceClass) -> Option<SessionId> {
        match self.port.open_session(device).await {
            Ok(id) => {
                let mut close_now = false;
                self.state.send_modify(|phase| {
                    if *phase == SessionPhase::CloseRequested {
                        *phase = SessionPhase::Closed;
                        close_now = true;
                    } else {
                        *phase = SessionPhase::Open(id);
                    }
                });

                if close_now {
                    tracing::info!(session_id = %id, "Session opened after close was requested, closing it");
                    self.close_remote(id).await;
                    None
                } else {
                    tracing::info!(session_id = %id, device = %device, "Explore session opened");
                    Some(id)
                }
            }
            Err(e) => {
                tracing::warn!(
                    device = %device,
                    error = %e,
                    "Failed to open explore session, continuing without one"
                );
                self.state.send_modify(|phase| {
                    *phase = if *phase == SessionPhase::CloseRequested {
                        SessionPhase::Closed
                    } else {
                        SessionPhase::Degraded
                    };
                });
                None
            }
        }
    }

    async fn close_remote(&self, id: SessionId) {
        match self.port.close_session(id).await {
            Ok(()) => tracing::info!(session_id = %id, "Explore session closed"),
            Err(e) => tracing::warn!(session_id = %id, error = %e, "Failed to close explore session"),
        }
    }
}
