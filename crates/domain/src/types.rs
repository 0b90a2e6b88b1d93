//! Shared record types for the monitoring core: Target, Check, DowntimeWindow,
//! DebugSession, NetworkEvent, ConsoleMessage.
//!
//! These are unidirectional — children carry a parent id, never a back-pointer.
//! Cascade delete is the store's job, not the object graph's.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Surrogate key for a [`Target`].
pub type TargetId = u64;
/// Surrogate key for a [`Check`].
pub type CheckId = u64;
/// Surrogate key for a [`DowntimeWindow`].
pub type WindowId = u64;
/// Surrogate key for a [`DebugSession`].
pub type SessionId = u64;
/// Surrogate key for a [`NetworkEvent`].
pub type NetworkEventId = u64;
/// Surrogate key for a [`ConsoleMessage`].
pub type ConsoleMessageId = u64;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Target
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A monitored endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Target {
    pub id: TargetId,
    pub url: String,
    pub name: String,
    /// Check interval, seconds. Clamped to `[60, 3600]` at the boundary.
    pub check_interval_seconds: u32,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted by an `update(id, patch)` call. `None` means "leave as is".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetPatch {
    pub url: Option<String>,
    pub name: Option<String>,
    pub check_interval_seconds: Option<u32>,
    pub enabled: Option<bool>,
}

pub const MIN_CHECK_INTERVAL_SECONDS: u32 = 60;
pub const MAX_CHECK_INTERVAL_SECONDS: u32 = 3600;
pub const MAX_URL_BYTES: usize = 2048;
pub const MAX_NAME_BYTES: usize = 255;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Check
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Timeout,
    Connect,
    Protocol,
    Navigation,
    Unexpected,
}

/// One probe result, append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Check {
    pub id: CheckId,
    pub target_id: TargetId,
    pub observed_at: DateTime<Utc>,
    pub available: bool,
    pub status: Option<u16>,
    pub response_time_ms: Option<f64>,
    pub error_kind: Option<ErrorKind>,
    pub error_detail: Option<String>,
}

impl Check {
    /// `available == true` implies `status in [200, 400)`;
    /// `available == false` implies `status not in [200, 400)` or (no status and an error kind).
    pub fn invariant_holds(&self) -> bool {
        if self.available {
            matches!(self.status, Some(s) if (200..400).contains(&s))
        } else {
            match self.status {
                Some(s) => !(200..400).contains(&s),
                None => self.error_kind.is_some(),
            }
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DowntimeWindow
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A contiguous unavailability interval for one target. `ended_at = None`
/// means the window is still open.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DowntimeWindow {
    pub id: WindowId,
    pub target_id: TargetId,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl DowntimeWindow {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Duration at read time; clamped to zero if clock skew made `ended_at`
    /// precede `started_at`.
    pub fn duration(&self, now: DateTime<Utc>) -> chrono::Duration {
        let end = self.ended_at.unwrap_or(now);
        let dur = end - self.started_at;
        if dur < chrono::Duration::zero() {
            chrono::Duration::zero()
        } else {
            dur
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DebugSession
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Active,
    Stopped,
    Failed,
    Timeout,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Failed | Self::Timeout)
    }
}

/// Lifecycle of a browser-backed capture session for one target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DebugSession {
    pub id: SessionId,
    pub target_id: TargetId,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub duration_limit_seconds: Option<u32>,
    pub error_detail: Option<String>,
}

impl DebugSession {
    /// Invariant: a session must never be `active` with a non-null `stopped_at`.
    pub fn invariant_holds(&self) -> bool {
        !(self.status == SessionStatus::Active && self.stopped_at.is_some())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// NetworkEvent / ConsoleMessage
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkEventKind {
    Request,
    Response,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Document,
    Stylesheet,
    Image,
    Script,
    Xhr,
    Fetch,
    Other,
}

/// One observed HTTP request or response within a debug session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkEvent {
    pub id: NetworkEventId,
    pub session_id: SessionId,
    pub kind: NetworkEventKind,
    pub url: String,
    pub method: String,
    pub status: Option<u16>,
    /// Opaque JSON-serialized headers.
    pub request_headers: Option<String>,
    pub response_headers: Option<String>,
    pub request_body: Option<String>,
    pub response_body: Option<String>,
    pub resource_type: ResourceType,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsoleLevel {
    Error,
    Warning,
    Info,
    Log,
}

impl ConsoleLevel {
    /// Only `error` and `warning` are captured per the capture contract.
    pub fn is_captured(self) -> bool {
        matches!(self, Self::Error | Self::Warning)
    }
}

/// One page-originated diagnostic within a debug session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsoleMessage {
    pub id: ConsoleMessageId,
    pub session_id: SessionId,
    pub level: ConsoleLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// The mutation a new [`Check`] implies for the target's open
/// [`DowntimeWindow`], decided by the pure downtime state machine and
/// carried to the store as the other half of one logical transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DowntimeAction {
    NoOp,
    Open,
    Close,
}

/// Truncate `s` to at most `byte_limit` bytes without splitting a UTF-8
/// codepoint, picking the last valid char boundary at or before
/// `byte_limit`.
pub fn truncate_utf8(s: &str, byte_limit: usize) -> String {
    if s.len() <= byte_limit {
        return s.to_string();
    }
    let mut end = byte_limit;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_invariant_available_requires_2xx_3xx() {
        let mut c = Check {
            id: 1,
            target_id: 1,
            observed_at: Utc::now(),
            available: true,
            status: Some(200),
            response_time_ms: Some(10.0),
            error_kind: None,
            error_detail: None,
        };
        assert!(c.invariant_holds());
        c.status = Some(404);
        assert!(!c.invariant_holds());
        c.available = false;
        assert!(c.invariant_holds());
    }

    #[test]
    fn check_invariant_unavailable_needs_status_or_error_kind() {
        let c = Check {
            id: 1,
            target_id: 1,
            observed_at: Utc::now(),
            available: false,
            status: None,
            response_time_ms: None,
            error_kind: None,
            error_detail: None,
        };
        assert!(!c.invariant_holds());
    }

    #[test]
    fn downtime_window_duration_clamped_on_skew() {
        let now = Utc::now();
        let w = DowntimeWindow {
            id: 1,
            target_id: 1,
            started_at: now,
            ended_at: Some(now - chrono::Duration::seconds(5)),
        };
        assert_eq!(w.duration(now), chrono::Duration::zero());
    }

    #[test]
    fn truncate_utf8_respects_char_boundary() {
        let s = "héllo"; // 'é' is 2 bytes
        // byte_limit=2 lands mid-'é' (bytes: h=1, é=2-3) -> should back off to 1
        let t = truncate_utf8(s, 2);
        assert_eq!(t, "h");
    }

    #[test]
    fn truncate_utf8_noop_when_short() {
        assert_eq!(truncate_utf8("short", 100), "short");
    }

    #[test]
    fn debug_session_invariant_rejects_active_with_stopped_at() {
        let s = DebugSession {
            id: 1,
            target_id: 1,
            status: SessionStatus::Active,
            created_at: Utc::now(),
            started_at: Some(Utc::now()),
            stopped_at: Some(Utc::now()),
            duration_limit_seconds: None,
            error_detail: None,
        };
        assert!(!s.invariant_holds());
    }
}
