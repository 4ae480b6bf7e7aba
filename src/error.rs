use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("invalid report request: {0}")]
    InvalidRequest(String),
    #[error("font {}: {reason}", path.display())]
    Font { path: PathBuf, reason: String },
    #[error("PDF generation error: {0}")]
    Pdf(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the caller sent a bad payload (HTTP 400); everything else is a
    /// server-side failure (HTTP 500).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidJson(_) | Error::InvalidRequest(_))
    }
}
