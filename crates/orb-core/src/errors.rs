use std::path::PathBuf;

/// Core error type.
///
/// Adapter crates should map their specific errors into this type so the
/// dispatcher can handle failures consistently (fallback reply vs fatal).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store corrupt: {path}: {reason}")]
    StoreCorrupt { path: PathBuf, reason: String },

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
