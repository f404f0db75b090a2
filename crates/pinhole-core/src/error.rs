use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
}

/// Errors raised by storage backends.
///
/// Conflicts are expected outcomes of [`Repository::insert`] and carry the
/// value that collided. Everything else is an opaque backend failure whose
/// message is meant for logs, not for callers.
///
/// [`Repository::insert`]: crate::repository::Repository::insert
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("alias already exists: {0}")]
    AliasConflict(String),
    #[error("original url already exists: {0}")]
    UrlConflict(String),
    #[error("operation not supported by this backend: {0}")]
    Unsupported(&'static str),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// Returns `true` for the two conflict variants.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::AliasConflict(_) | Self::UrlConflict(_))
    }
}
