//! Concrete [`BrowserPool`]/[`BrowsingContext`] backed by `chromiumoxide`
//! CDP automation — the closest real crate in the ecosystem to a
//! tokio-native, async headless-Chrome driver. Not part of the teacher's
//! own dependency stack; see DESIGN.md for the justification.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{EventRequestWillBeSent, EventResponseReceived};
use chromiumoxide::cdp::browser_protocol::runtime::EventConsoleApiCalled;
use chromiumoxide::{Browser, BrowserConfig, Page};
use chrono::Utc;
use futures_util::StreamExt;
use tokio::task::JoinHandle;

use mon_domain::config::BrowserConfig as MonBrowserConfig;
use mon_domain::error::{Error, Result};
use mon_domain::types::{ConsoleLevel, NetworkEventKind, ResourceType};

use crate::browser::{BrowserPool, BrowsingContext, NavigationOutcome};
use crate::capture::{CapturedEvent, ConsoleCapture, NetworkCapture};
use crate::capture::CaptureSink;

/// Owns the single headless Chrome process. The CDP event stream returned
/// by `Browser::launch` must be polled continuously or the connection
/// stalls, so it is driven by a background task for the pool's whole
/// lifetime, mirroring the teacher's pattern of a dedicated reader task per
/// long-lived connection.
pub struct ChromiumPool {
    browser: Browser,
    _event_pump: JoinHandle<()>,
}

impl ChromiumPool {
    pub async fn launch(config: &MonBrowserConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder();
        if config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &config.executable_path {
            builder = builder.chrome_executable(path);
        }
        let cdp_config = builder
            .build()
            .map_err(|e| Error::Fatal(format!("invalid browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(cdp_config)
            .await
            .map_err(|e| Error::Fatal(format!("failed to launch browser: {e}")))?;

        let event_pump = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    tracing::warn!(error = %err, "browser event stream error");
                }
            }
        });

        Ok(Self {
            browser,
            _event_pump: event_pump,
        })
    }
}

#[async_trait]
impl BrowserPool for ChromiumPool {
    async fn acquire_context(&self) -> Result<Box<dyn BrowsingContext>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| Error::Fatal(format!("failed to open page: {e}")))?;
        Ok(Box::new(ChromiumContext { page }))
    }
}

pub struct ChromiumContext {
    page: Page,
}

#[async_trait]
impl BrowsingContext for ChromiumContext {
    async fn navigate(
        &mut self,
        url: &str,
        timeout: Duration,
        sink: Option<Arc<dyn CaptureSink>>,
    ) -> Result<NavigationOutcome> {
        if let Some(sink) = sink {
            attach_listeners(&self.page, sink).await;
        }

        let goto = self.page.goto(url);
        let status = tokio::time::timeout(timeout, goto)
            .await
            .map_err(|_| Error::Probe {
                kind: mon_domain::types::ErrorKind::Timeout,
                detail: format!("navigation to {url} exceeded {timeout:?}"),
            })?
            .map_err(|e| Error::Probe {
                kind: mon_domain::types::ErrorKind::Navigation,
                detail: e.to_string(),
            })?;

        Ok(NavigationOutcome {
            status: status.status().map(|s| s as u16),
        })
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.page
            .close()
            .await
            .map_err(|e| Error::Fatal(format!("failed to close page: {e}")))
    }
}

/// Attaches request, response, and console listeners that forward captures
/// into `sink` for the lifetime of this navigation. Listener errors are
/// logged and never propagated — per the event-capture contract, a handler
/// must never crash the session.
async fn attach_listeners(page: &Page, sink: Arc<dyn CaptureSink>) {
    if let Ok(mut requests) = page.event_listener::<EventRequestWillBeSent>().await {
        let sink = Arc::clone(&sink);
        tokio::spawn(async move {
            while let Some(event) = requests.next().await {
                let req = &event.request;
                sink.capture(CapturedEvent::Network(NetworkCapture {
                    kind: NetworkEventKind::Request,
                    url: req.url.clone(),
                    method: req.method.clone(),
                    status: None,
                    request_headers: serde_json::to_string(&req.headers).ok(),
                    response_headers: None,
                    request_body: req.post_data.clone(),
                    response_body: None,
                    resource_type: classify_resource_type(&event.r#type.to_string()),
                    timestamp: Utc::now(),
                    duration_ms: None,
                }));
            }
        });
    }

    if let Ok(mut responses) = page.event_listener::<EventResponseReceived>().await {
        let sink = Arc::clone(&sink);
        tokio::spawn(async move {
            while let Some(event) = responses.next().await {
                let resp = &event.response;
                sink.capture(CapturedEvent::Network(NetworkCapture {
                    kind: NetworkEventKind::Response,
                    url: resp.url.clone(),
                    method: String::new(),
                    status: Some(resp.status as u16),
                    request_headers: None,
                    response_headers: serde_json::to_string(&resp.headers).ok(),
                    request_body: None,
                    response_body: None,
                    resource_type: classify_resource_type(&event.r#type.to_string()),
                    timestamp: Utc::now(),
                    duration_ms: None,
                }));
            }
        });
    }

    if let Ok(mut console) = page.event_listener::<EventConsoleApiCalled>().await {
        tokio::spawn(async move {
            let sink = sink;
            while let Some(event) = console.next().await {
                let level = match event.r#type.as_ref() {
                    "error" => ConsoleLevel::Error,
                    "warning" => ConsoleLevel::Warning,
                    _ => continue,
                };
                let message = event
                    .args
                    .iter()
                    .filter_map(|a| a.value.as_ref().map(|v| v.to_string()))
                    .collect::<Vec<_>>()
                    .join(" ");
                sink.capture(CapturedEvent::Console(ConsoleCapture {
                    level,
                    message,
                    timestamp: Utc::now(),
                }));
            }
        });
    }
}

fn classify_resource_type(raw: &str) -> ResourceType {
    match raw.to_ascii_lowercase().as_str() {
        "document" => ResourceType::Document,
        "stylesheet" => ResourceType::Stylesheet,
        "image" => ResourceType::Image,
        "script" => ResourceType::Script,
        "xhr" => ResourceType::Xhr,
        "fetch" => ResourceType::Fetch,
        _ => ResourceType::Other,
    }
}
