use async_trait::async_trait;

use mon_domain::types::Target;

use crate::outcome::ProbeOutcome;

/// Given a Target, performs one check and returns a typed outcome. Both
/// implementations (`HttpProbe`, the browser probe) recover all of their
/// own errors into a [`ProbeOutcome`] — a probe call itself never returns
/// `Err`.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn check(&self, target: &Target) -> ProbeOutcome;
}
