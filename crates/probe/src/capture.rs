use chrono::{DateTime, Utc};

use mon_domain::types::{ConsoleLevel, NetworkEventKind, ResourceType};

/// One request or response observed by the browser probe while a debug
/// session is active for the target being probed.
#[derive(Debug, Clone)]
pub struct NetworkCapture {
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
pub struct ConsoleCapture {
    pub level: ConsoleLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum CapturedEvent {
    Network(NetworkCapture),
    Console(ConsoleCapture),
}

/// Sink the browser probe forwards captures into when a debug session is
/// active for the target being probed. `mon-engine`'s `DebugSessionEngine`
/// implements this over its in-memory buffers; the probe crate itself never
/// touches storage.
pub trait CaptureSink: Send + Sync {
    fn capture(&self, event: CapturedEvent);
}
