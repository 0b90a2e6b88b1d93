mod breaker;
mod browser;
mod debug;
mod probe;
mod scheduler;
mod server;
mod sla;

pub use breaker::*;
pub use browser::*;
pub use debug::*;
pub use probe::*;
pub use scheduler::*;
pub use server::*;
pub use sla::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub breaker: BreakerConfig,
    #[serde(default)]
    pub debug: DebugConfig,
    #[serde(default)]
    pub sla: SlaConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues. An empty
    /// vec means everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "server.port".into(),
                message: "port must be greater than 0".into(),
            });
        }

        if self.server.host.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "server.host".into(),
                message: "host must not be empty".into(),
            });
        }

        if self.scheduler.grace_period_seconds == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "scheduler.grace_period_seconds".into(),
                message: "grace period of 0 means any missed firing is dropped".into(),
            });
        }

        if self.probe.timeout_seconds == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "probe.timeout_seconds".into(),
                message: "timeout must be greater than 0".into(),
            });
        }

        if self.breaker.failure_threshold == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "breaker.failure_threshold".into(),
                message: "failure_threshold must be greater than 0".into(),
            });
        }

        if self.debug.flush_interval_ms == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "debug.flush_interval_ms".into(),
                message: "flush_interval_ms must be greater than 0".into(),
            });
        }

        if self.debug.max_duration_seconds == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "debug.max_duration_seconds".into(),
                message: "max_duration_seconds must be greater than 0".into(),
            });
        }

        if self.sla.cache_enabled && self.sla.cache_ttl_seconds == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "sla.cache_ttl_seconds".into(),
                message: "TTL of 0 means every lookup is a miss; consider disabling the cache instead".into(),
            });
        }

        if self.server.cors.allowed_origins.len() == 1
            && self.server.cors.allowed_origins[0] == "*"
        {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "server.cors.allowed_origins".into(),
                message: "wildcard \"*\" allows all origins (not recommended for production)".into(),
            });
        }

        errors
    }
}
