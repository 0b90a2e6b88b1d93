use async_trait::async_trait;
use chrono::{DateTime, Utc};

use mon_domain::error::Result;
use mon_domain::types::{
    Check, ConsoleMessage, DebugSession, DowntimeAction, DowntimeWindow, NetworkEvent,
    SessionId, SessionStatus, Target, TargetId, TargetPatch,
};

use crate::model::{NetworkEventFilter, NewCheck, NewConsoleMessage, NewNetworkEvent, NewTarget};

/// Transactional persistence of Targets, Checks, DowntimeWindows,
/// DebugSessions, NetworkEvents, and ConsoleMessages, with the ranged
/// queries the engine crate needs. One method per read/write operation;
/// every mutating method that touches more than one table commits as a
/// single logical transaction (see [`MemStore`](crate::mem::MemStore) for
/// the in-memory critical-section stand-in).
#[async_trait]
pub trait Store: Send + Sync {
    // ── Targets ──────────────────────────────────────────────────────
    async fn create_target(&self, input: NewTarget) -> Result<Target>;
    async fn get_target(&self, id: TargetId) -> Result<Target>;
    async fn list_targets(&self, skip: usize, limit: usize) -> Result<Vec<Target>>;
    async fn list_enabled_targets(&self) -> Result<Vec<Target>>;
    async fn update_target(&self, id: TargetId, patch: TargetPatch) -> Result<Target>;
    /// Deletes the target and cascades to its Checks, DowntimeWindows, and
    /// DebugSessions (and, transitively, those sessions' NetworkEvents and
    /// ConsoleMessages).
    async fn delete_target(&self, id: TargetId) -> Result<()>;

    // ── Checks + downtime (one logical transaction) ─────────────────
    /// Returns the open downtime window for `target_id`, if any. Callers
    /// pass this into the downtime state machine to decide the
    /// [`DowntimeAction`] to commit alongside the new check.
    async fn open_window(&self, target_id: TargetId) -> Result<Option<DowntimeWindow>>;

    /// Persists `check` and applies `action` to the target's downtime
    /// window state as one transaction: inserting the check and
    /// opening/closing/no-op'ing the window happen under the same
    /// critical section, so a concurrent reader never observes the check
    /// without its corresponding window mutation.
    async fn commit_check(
        &self,
        check: NewCheck,
        action: DowntimeAction,
    ) -> Result<(Check, Option<DowntimeWindow>)>;

    async fn checks_in_range(
        &self,
        target_id: TargetId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Check>>;

    async fn windows_overlapping(
        &self,
        target_id: TargetId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DowntimeWindow>>;

    // ── Debug sessions ───────────────────────────────────────────────
    /// Fails with `conflict` if an `active` session already exists for
    /// this target.
    async fn create_session(
        &self,
        target_id: TargetId,
        duration_limit_seconds: Option<u32>,
    ) -> Result<DebugSession>;

    async fn transition_session(
        &self,
        id: SessionId,
        status: SessionStatus,
        error_detail: Option<String>,
    ) -> Result<DebugSession>;

    async fn get_session(&self, id: SessionId) -> Result<DebugSession>;

    async fn active_session_for_target(&self, target_id: TargetId) -> Result<Option<DebugSession>>;

    // ── Network events / console messages ───────────────────────────
    async fn insert_network_events_batch(
        &self,
        events: Vec<NewNetworkEvent>,
    ) -> Result<Vec<NetworkEvent>>;

    async fn insert_console_messages_batch(
        &self,
        messages: Vec<NewConsoleMessage>,
    ) -> Result<Vec<ConsoleMessage>>;

    async fn list_network_events(
        &self,
        session_id: SessionId,
        skip: usize,
        limit: usize,
        filter: NetworkEventFilter,
    ) -> Result<Vec<NetworkEvent>>;

    async fn list_console_messages(
        &self,
        session_id: SessionId,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<ConsoleMessage>>;
}
