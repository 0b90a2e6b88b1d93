use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Probe
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "d_timeout")]
    pub timeout_seconds: u32,
    /// Bounded retries at the transport layer for transient connect errors
    /// only — never for HTTP status errors.
    #[serde(default = "d_retries")]
    pub retries: u32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: d_timeout(),
            retries: d_retries(),
        }
    }
}

fn d_timeout() -> u32 {
    30
}
fn d_retries() -> u32 {
    2
}
