//! All error types for the propsync crate.
//!
//! These are returned from all fallible operations (scanning, loading, saving).
//! Absent resources are never errors: a missing file or bundle is reported as
//! `None` so callers can tell "no such resource" apart from "empty resource".

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("encoding error: {0}")]
    Encoding(String),
}

impl Error {
    /// Creates a new encoding error.
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Error::Encoding(message.into())
    }
}
