use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SLA analytics
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaConfig {
    #[serde(default = "d_ttl")]
    pub cache_ttl_seconds: u64,
    #[serde(default = "d_true")]
    pub cache_enabled: bool,
}

impl Default for SlaConfig {
    fn default() -> Self {
        Self {
            cache_ttl_seconds: d_ttl(),
            cache_enabled: true,
        }
    }
}

fn d_ttl() -> u64 {
    300
}
fn d_true() -> bool {
    true
}
