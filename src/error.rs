/// Crate-wide error type.
///
/// Four failure classes cross the component boundaries: unreadable input
/// documents, invalid or mismatched configuration, provider failures
/// (embedding model or language model, including timeouts), and durable
/// storage I/O. Components return these unmodified; the pipelines never
/// downgrade them, and the HTTP layer owns the status-code mapping.
use std::fmt::Display;
use std::path::Path;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The input document is missing, unreadable, or not a valid PDF.
    #[error("failed to load {path}: {reason}")]
    Load { path: String, reason: String },

    /// Invalid configuration, including dimensionality mismatches between
    /// the embedding model and the vector store.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Embedding or language-model backend failure, including timeouts.
    #[error("provider error: {0}")]
    Provider(String),

    /// Durable-storage failure.
    #[error("storage error: {0}")]
    Store(String),
}

impl Error {
    /// Build a `Load` error for the given file path.
    pub fn load(path: &Path, reason: impl Display) -> Self {
        Self::Load {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Self::Store(e.to_string())
    }
}
