pub mod breaker;
pub mod broadcaster;
pub mod debug_session;
pub mod downtime;
pub mod scheduler;
pub mod sla;

pub use breaker::CircuitBreaker;
pub use broadcaster::Broadcaster;
pub use debug_session::DebugSessionEngine;
pub use scheduler::Scheduler;
pub use sla::SlaAnalytics;
