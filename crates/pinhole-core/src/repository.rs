use crate::error::StorageError;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A stored alias: the short code and the URL it resolves to.
///
/// Records are immutable once inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRecord {
    /// The alias the record is stored under.
    pub short_code: ShortCode,
    /// The original URL that was shortened.
    pub original_url: String,
}

impl AliasRecord {
    pub fn new(short_code: ShortCode, original_url: impl Into<String>) -> Self {
        Self {
            short_code,
            original_url: original_url.into(),
        }
    }
}

/// Whether a backend allows the same original URL under more than one alias.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UrlUniqueness {
    /// A second alias for an already stored URL is rejected with
    /// [`StorageError::UrlConflict`].
    #[default]
    Enforced,
    /// Any number of aliases may point at the same URL.
    Relaxed,
}

/// The read side of a repository.
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Retrieves the record stored under `code`.
    /// Returns `None` if the code does not exist.
    async fn get(&self, code: &ShortCode) -> Result<Option<AliasRecord>>;

    /// Retrieves an alias already issued for `original_url`.
    ///
    /// This is an optional capability. Backends without a reverse lookup keep
    /// the default body, which fails with [`StorageError::Unsupported`].
    async fn find_by_original_url(&self, original_url: &str) -> Result<Option<ShortCode>> {
        let _ = original_url;
        Err(StorageError::Unsupported("find_by_original_url"))
    }
}

#[async_trait]
pub trait Repository: ReadRepository {
    /// Inserts a new record.
    ///
    /// The existence check and the write happen as one atomic step with
    /// respect to other writers. Fails with [`StorageError::AliasConflict`] if
    /// the code is taken, or with [`StorageError::UrlConflict`] if the backend
    /// enforces [`UrlUniqueness::Enforced`] and the URL is already stored.
    async fn insert(&self, record: AliasRecord) -> Result<()>;
}
