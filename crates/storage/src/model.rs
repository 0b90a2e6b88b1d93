//! Input DTOs for the [`crate::Store`] trait — the same record shapes as
//! `mon_domain::types`, minus the surrogate key the store mints on insert.

use chrono::{DateTime, Utc};

use mon_domain::types::{ConsoleLevel, ErrorKind, NetworkEventKind, ResourceType, TargetId};

#[derive(Debug, Clone)]
pub struct NewTarget {
    pub url: String,
    pub name: String,
    pub check_interval_seconds: u32,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct NewCheck {
    pub target_id: TargetId,
    pub observed_at: DateTime<Utc>,
    pub available: bool,
    pub status: Option<u16>,
    pub response_time_ms: Option<f64>,
    pub error_kind: Option<ErrorKind>,
    pub error_detail: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewNetworkEvent {
    pub session_id: u64,
    pub kind: NetworkEventKind,
    pub url: String,
    pub method: String,
    pub status: Option<u16>,
    pub request_headers: Option<String>,
    pub response_headers: Option<String>,
    pub request_body: Option<String>,
    pub response_body: Option<String>,
    pub resource_type: ResourceType,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct NewConsoleMessage {
    pub session_id: u64,
    pub level: ConsoleLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Filters accepted by `Store::list_network_events`. All fields are
/// conjunctive; `None` means "don't filter on this dimension".
#[derive(Debug, Clone, Default)]
pub struct NetworkEventFilter {
    pub kind: Option<NetworkEventKind>,
    pub resource_type: Option<ResourceType>,
}
