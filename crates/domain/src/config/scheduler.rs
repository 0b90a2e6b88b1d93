use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Scheduler
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Gates the entire scheduler subsystem.
    #[serde(default = "d_true")]
    pub enabled: bool,
    /// Display/log timezone. Internal times remain UTC regardless.
    #[serde(default = "d_tz")]
    pub timezone: String,
    /// How long past a firing's due time it remains eligible to fire once.
    #[serde(default = "d_grace")]
    pub grace_period_seconds: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timezone: d_tz(),
            grace_period_seconds: d_grace(),
        }
    }
}

fn d_true() -> bool {
    true
}
fn d_tz() -> String {
    "UTC".into()
}
fn d_grace() -> u32 {
    300
}
