use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::redirect::Policy;
use reqwest::Client;

use mon_domain::config::ProbeConfig;
use mon_domain::types::{ErrorKind, Target};

use crate::outcome::{effective_timeout, ProbeOutcome};
use crate::probe::Probe;

/// Default probe: a single GET with bounded retries on transient connect
/// errors only. One `Client` is built once and shared across every check,
/// mirroring the teacher's per-provider `reqwest::Client` reuse.
pub struct HttpProbe {
    client: Client,
    retries: u32,
}

impl HttpProbe {
    pub fn new(config: &ProbeConfig) -> Self {
        let client = Client::builder()
            .redirect(Policy::limited(10))
            .build()
            .expect("reqwest client with static TLS config must build");
        Self {
            client,
            retries: config.retries,
        }
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn check(&self, target: &Target) -> ProbeOutcome {
        let timeout = effective_timeout(target.check_interval_seconds);
        let mut last_err: Option<reqwest::Error> = None;

        for attempt in 0..=self.retries {
            let started = Instant::now();
            let result = self
                .client
                .get(&target.url)
                .timeout(timeout)
                .send()
                .await;

            match result {
                Ok(response) => {
                    let status = response.status().as_u16();
                    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
                    return ProbeOutcome::success(status, elapsed_ms, Utc::now());
                }
                Err(err) => {
                    let transient = err.is_connect();
                    last_err = Some(err);
                    if transient && attempt < self.retries {
                        continue;
                    }
                    break;
                }
            }
        }

        let err = last_err.expect("loop always sets last_err before breaking on a non-Ok path");
        let kind = classify(&err);
        ProbeOutcome::failure(kind, err.to_string(), Utc::now())
    }
}

fn classify(err: &reqwest::Error) -> ErrorKind {
    if err.is_timeout() {
        ErrorKind::Timeout
    } else if err.is_connect() {
        ErrorKind::Connect
    } else if err.is_decode() || err.is_body() {
        ErrorKind::Protocol
    } else {
        ErrorKind::Unexpected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_config_retries_default_to_two() {
        let cfg = ProbeConfig::default();
        let probe = HttpProbe::new(&cfg);
        assert_eq!(probe.retries, 2);
    }
}
