use std::sync::Arc;

use async_trait::async_trait;

use mon_domain::types::Target;

use crate::browser::probe::{ActiveSessionLookup, BrowserProbe};
use crate::http::HttpProbe;
use crate::outcome::ProbeOutcome;
use crate::probe::Probe;

/// The probe the scheduler actually drives: the lightweight HTTP probe by
/// default, switching to the browser probe only while a debug session is
/// active for that target, so a capture never misses the check that
/// triggered it.
pub struct HybridProbe {
    http: HttpProbe,
    browser: BrowserProbe,
    sessions: Arc<dyn ActiveSessionLookup>,
}

impl HybridProbe {
    pub fn new(
        http: HttpProbe,
        browser: BrowserProbe,
        sessions: Arc<dyn ActiveSessionLookup>,
    ) -> Self {
        Self {
            http,
            browser,
            sessions,
        }
    }
}

#[async_trait]
impl Probe for HybridProbe {
    async fn check(&self, target: &Target) -> ProbeOutcome {
        if self.sessions.capture_sink_for(target.id).is_some() {
            self.browser.check(target).await
        } else {
            self.http.check(target).await
        }
    }
}
