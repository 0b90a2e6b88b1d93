pub mod chromium;
pub mod probe;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use mon_domain::error::Result;

use crate::capture::CaptureSink;

/// Outcome of navigating a browsing context to a URL.
#[derive(Debug, Clone)]
pub struct NavigationOutcome {
    pub status: Option<u16>,
}

/// One isolated browsing context vended by a [`BrowserPool`]. Every
/// acquired context must be closed, even on a failure path.
#[async_trait]
pub trait BrowsingContext: Send {
    /// Navigates to `url`, optionally forwarding every captured request and
    /// response into `sink` (set when a debug session is active for the
    /// target being probed).
    async fn navigate(
        &mut self,
        url: &str,
        timeout: Duration,
        sink: Option<Arc<dyn CaptureSink>>,
    ) -> Result<NavigationOutcome>;

    async fn close(self: Box<Self>) -> Result<()>;
}

/// Owns a long-lived headless browser process and vends isolated browsing
/// contexts on request.
#[async_trait]
pub trait BrowserPool: Send + Sync {
    async fn acquire_context(&self) -> Result<Box<dyn BrowsingContext>>;
}
