pub mod browser;
pub mod capture;
pub mod http;
pub mod hybrid;
pub mod outcome;
pub mod probe;

pub use browser::{BrowserPool, BrowsingContext};
pub use browser::probe::BrowserProbe;
pub use capture::{CaptureSink, CapturedEvent, ConsoleCapture, NetworkCapture};
pub use http::HttpProbe;
pub use hybrid::HybridProbe;
pub use outcome::ProbeOutcome;
pub use probe::Probe;
