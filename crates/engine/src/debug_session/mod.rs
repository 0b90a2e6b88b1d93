//! Owns the lifecycle of every browser-backed debug session: creation,
//! the start sequence, deadline/stop handling, and lookups the probe crate
//! needs to decide whether a scheduled check should also capture traffic.

mod active_session;

pub use active_session::ActiveSession;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use mon_domain::config::DebugConfig;
use mon_domain::error::Result;
use mon_domain::trace::TraceEvent;
use mon_domain::types::{DebugSession, SessionId, SessionStatus, TargetId};
use mon_probe::browser::probe::ActiveSessionLookup;
use mon_probe::{BrowserPool, CaptureSink};
use mon_storage::Store;

use crate::broadcaster::{Broadcaster, DebugMessage};

/// Coordinates active debug sessions: at most one per target (enforced by
/// the store), each owning its own browsing context and capture buffers.
pub struct DebugSessionEngine {
    store: Arc<dyn Store>,
    pool: Arc<dyn BrowserPool>,
    broadcaster: Arc<Broadcaster>,
    config: DebugConfig,
    active: RwLock<HashMap<SessionId, Arc<ActiveSession>>>,
}

impl DebugSessionEngine {
    pub fn new(
        store: Arc<dyn Store>,
        pool: Arc<dyn BrowserPool>,
        broadcaster: Arc<Broadcaster>,
        config: DebugConfig,
    ) -> Self {
        Self {
            store,
            pool,
            broadcaster,
            config,
            active: RwLock::new(HashMap::new()),
        }
    }

    /// Create a `pending` session for `target_id`. Cheap and DB-only — does
    /// not touch the browser pool. Fails with `conflict` if the target
    /// already has an active session (enforced by the store).
    pub async fn create_session(
        &self,
        target_id: TargetId,
        duration_limit_seconds: Option<u32>,
    ) -> Result<DebugSession> {
        self.store.get_target(target_id).await?;
        self.store
            .create_session(target_id, duration_limit_seconds)
            .await
    }

    /// Run the start sequence for a `pending` session: acquire a browsing
    /// context, navigate, and transition to `active` (or `failed` on
    /// error). Fails with `conflict` if the session is not currently
    /// `pending`.
    pub async fn start_session(self: &Arc<Self>, session_id: SessionId) -> Result<DebugSession> {
        let pending = self.store.get_session(session_id).await?;
        if pending.status != SessionStatus::Pending {
            return Err(mon_domain::error::Error::Conflict(format!(
                "debug session {session_id} is not pending (status: {:?})",
                pending.status
            )));
        }
        let target = self.store.get_target(pending.target_id).await?;

        let (session, handle) = active_session::start(
            self.store.clone(),
            self.pool.clone(),
            self.broadcaster.clone(),
            self.config.clone(),
            pending,
            target,
        )
        .await;

        if let Some(handle) = handle {
            self.active.write().insert(session.id, handle.clone());
            if let Some(limit) = session.duration_limit_seconds {
                self.spawn_deadline_watcher(session.id, handle, limit);
            }
        }

        Ok(session)
    }

    /// Stop an active session and record its terminal state.
    pub async fn stop_session(self: &Arc<Self>, session_id: SessionId) -> Result<DebugSession> {
        let handle = self.active.write().remove(&session_id);
        let Some(handle) = handle else {
            return self.store.get_session(session_id).await;
        };

        active_session::stop(&handle).await;
        let updated = self
            .store
            .transition_session(session_id, SessionStatus::Stopped, None)
            .await?;

        TraceEvent::DebugSessionStopped {
            session_id,
            status: "stopped".into(),
        }
        .emit();
        self.broadcaster.broadcast(
            session_id,
            DebugMessage::Status {
                status: "stopped".into(),
                detail: None,
                at: chrono::Utc::now(),
            },
        );
        self.broadcaster.close_session(session_id);

        Ok(updated)
    }

    fn spawn_deadline_watcher(
        self: &Arc<Self>,
        session_id: SessionId,
        handle: Arc<ActiveSession>,
        duration_limit_seconds: u32,
    ) {
        let engine = self.clone();
        tokio::spawn(async move {
            let fired = active_session::wait_for_deadline(
                &handle,
                std::time::Duration::from_secs(duration_limit_seconds as u64),
            )
            .await;
            if !fired {
                // `stop_session` already handled cleanup.
                return;
            }

            let removed = engine.active.write().remove(&session_id);
            if removed.is_none() {
                return;
            }
            active_session::stop(&handle).await;

            match engine
                .store
                .transition_session(session_id, SessionStatus::Timeout, None)
                .await
            {
                Ok(_) => {
                    TraceEvent::DebugSessionStopped {
                        session_id,
                        status: "timeout".into(),
                    }
                    .emit();
                    engine.broadcaster.broadcast(
                        session_id,
                        DebugMessage::Status {
                            status: "timeout".into(),
                            detail: None,
                            at: chrono::Utc::now(),
                        },
                    );
                    engine.broadcaster.close_session(session_id);
                }
                Err(err) => {
                    tracing::warn!(session_id, error = %err, "failed to record session timeout");
                }
            }
        });
    }

    pub async fn get_session(&self, session_id: SessionId) -> Result<DebugSession> {
        self.store.get_session(session_id).await
    }

    /// Re-subscribe or inspect whether a session is currently live (has a
    /// running browsing context), as opposed to merely existing in a
    /// terminal state in the store.
    pub fn is_live(&self, session_id: SessionId) -> bool {
        self.active.read().contains_key(&session_id)
    }
}

impl ActiveSessionLookup for DebugSessionEngine {
    fn capture_sink_for(&self, target_id: TargetId) -> Option<Arc<dyn CaptureSink>> {
        let active = self.active.read();
        active
            .values()
            .find(|session| session.target_id == target_id)
            .map(|session| session.clone() as Arc<dyn CaptureSink>)
    }
}
