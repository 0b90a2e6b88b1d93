//! Clock seam so store-level timestamps (`created_at`, `started_at`, ...)
//! are injectable in tests without threading a `DateTime` through every
//! call site.

use std::sync::Arc;

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub fn system() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}

#[cfg(feature = "test-support")]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;

    /// A settable clock for deterministic tests, mirroring the teacher's
    /// `test-support`-gated fake adapters.
    pub struct FakeClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl FakeClock {
        pub fn new(start: DateTime<Utc>) -> Arc<dyn Clock> {
            Arc::new(Self {
                now: Mutex::new(start),
            })
        }

        pub fn advance(clock: &FakeClock, delta: chrono::Duration) {
            let mut now = clock.now.lock();
            *now = *now + delta;
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock()
        }
    }
}
