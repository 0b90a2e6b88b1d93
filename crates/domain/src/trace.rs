use serde::Serialize;

/// Structured trace events emitted across the monitoring crates. Each one
/// is logged as a single JSON-valued `tracing` field so a log aggregator
/// can filter on `event` without parsing free text.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    TargetCreated {
        target_id: u64,
        url: String,
    },
    TargetDeleted {
        target_id: u64,
    },
    CheckRecorded {
        target_id: u64,
        check_id: u64,
        available: bool,
        error_kind: Option<String>,
    },
    DowntimeWindowOpened {
        target_id: u64,
        window_id: u64,
        started_at: String,
    },
    DowntimeWindowClosed {
        target_id: u64,
        window_id: u64,
        ended_at: String,
    },
    CircuitBreakerOpened {
        target_id: u64,
        failure_count: u32,
        blocked_until: String,
    },
    CircuitBreakerClosed {
        target_id: u64,
    },
    SchedulerJobSkippedBlocked {
        target_id: u64,
    },
    SchedulerJobCoalesced {
        target_id: u64,
    },
    DebugSessionStarted {
        session_id: u64,
        target_id: u64,
    },
    DebugSessionStopped {
        session_id: u64,
        status: String,
    },
    DebugSessionFlush {
        session_id: u64,
        network_events: usize,
        console_messages: usize,
    },
    SlaCacheHit {
        target_id: u64,
    },
    SlaCacheMiss {
        target_id: u64,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "mon_event");
    }
}
