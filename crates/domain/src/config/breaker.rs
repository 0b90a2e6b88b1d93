use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Circuit breaker
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerConfig {
    #[serde(default = "d_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "d_cooldown")]
    pub cooldown_seconds: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: d_threshold(),
            cooldown_seconds: d_cooldown(),
        }
    }
}

fn d_threshold() -> u32 {
    5
}
fn d_cooldown() -> u32 {
    300
}
