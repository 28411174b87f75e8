//! Error types for promo-sender

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Credentials are missing or still set to their placeholder values.
    #[error("Configuration is invalid, please set: {}", .missing.join(", "))]
    Configuration { missing: Vec<String> },

    /// A request failed pre-flight validation; no network call was made.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Storage error on {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Template error: {0}")]
    Template(String),
}

/// Failures talking to the messaging API.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("API request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned a malformed response body ({source}): {body}")]
    MalformedBody {
        body: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Storage {
            path: path.into(),
            source,
        }
    }

    /// Errors that only affect the current recipient; the dispatch loop
    /// reports them and moves on.
    pub fn is_per_recipient(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::Transport(_))
    }
}
