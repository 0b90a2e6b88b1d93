use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Debug session
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugConfig {
    #[serde(default = "d_flush_ms")]
    pub flush_interval_ms: u64,
    #[serde(default = "d_max_duration")]
    pub max_duration_seconds: u32,
    #[serde(default = "d_body_budget")]
    pub body_byte_limit: usize,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            flush_interval_ms: d_flush_ms(),
            max_duration_seconds: d_max_duration(),
            body_byte_limit: d_body_budget(),
        }
    }
}

fn d_flush_ms() -> u64 {
    1000
}
fn d_max_duration() -> u32 {
    3600
}
fn d_body_budget() -> usize {
    10_240
}
