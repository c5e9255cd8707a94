//! RBAC error types.

use thiserror::Error;

/// RBAC errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A mutation referenced an item name that does not exist.
    ///
    /// Plain lookups never produce this; a missing name reads as `None`.
    #[error("unknown item: {0}")]
    UnknownItem(String),

    /// Failed to parse a configuration or data document.
    #[error("failed to parse document: {0}")]
    Parse(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A storage backend failed. The original backend error is preserved.
    #[error("storage error: {0}")]
    Store(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Box a backend error crossing the [`ItemStore`] seam.
    ///
    /// [`ItemStore`]: crate::ItemStore
    pub fn store(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Store(err.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
