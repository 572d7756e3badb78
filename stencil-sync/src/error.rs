//! Error types for stencil-sync.

use std::path::PathBuf;

use thiserror::Error;

use stencil_core::error::SourceError;
use stencil_renderer::RenderError;

/// Errors that abort a whole reconciliation pass.
///
/// Per-object failures never surface here; they become failed outcomes.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Listing templates or parameter records failed.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// The renderer could not be constructed.
    #[error("render error: {0}")]
    Render(#[from] RenderError),
}

/// Errors from a [`Store`](crate::store::Store).
#[derive(Debug, Error)]
pub enum StoreError {
    /// No object with this identity. Drives create-vs-update, not a failure.
    #[error("{0} not found")]
    NotFound(String),

    /// Stale `metadata.resourceVersion` on update.
    #[error("conflict on {reference}: stored version {stored}, got {given}")]
    Conflict {
        reference: String,
        stored: String,
        given: String,
    },

    #[error("{0} already exists")]
    AlreadyExists(String),

    /// The object is missing identity fields, or they are unusable as a store path.
    #[error("invalid object: {0}")]
    Invalid(String),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode or decode stored object at {path}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Any other backend failure (permissions, connectivity).
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}
