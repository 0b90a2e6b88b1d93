use crate::types::ErrorKind as ProbeErrorKind;

/// Shared error taxonomy used across the monitoring crates.
///
/// `invalid-input`, `not-found`, and `conflict` are boundary errors — they
/// never reach persistence. `Probe` carries the probe-local error kinds
/// (`timeout`/`connect`/`protocol`/`navigation`/`unexpected`), which are
/// always recovered into a [`crate::types::Check`] and never propagated as
/// this enum; it exists here only so boundary code can report a failed
/// manual check trigger using the same vocabulary.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("probe {kind:?}: {detail}")]
    Probe {
        kind: ProbeErrorKind,
        detail: String,
    },

    #[error("persistence: {0}")]
    Persistence(String),

    #[error("fatal: {0}")]
    Fatal(String),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
