use crate::error::Result;
use async_trait::async_trait;
use pinhole_core::ShortCode;

/// Parameters for creating a shortened URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShortenParams {
    /// The original URL to be shortened.
    pub original_url: String,
    /// Optional custom alias. An empty string is treated as absent.
    pub custom_alias: Option<String>,
}

impl ShortenParams {
    pub fn new(original_url: impl Into<String>) -> Self {
        Self {
            original_url: original_url.into(),
            custom_alias: None,
        }
    }

    pub fn with_custom_alias(mut self, alias: impl Into<String>) -> Self {
        self.custom_alias = Some(alias.into());
        self
    }
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Creates a shortened URL and returns its short code.
    async fn shorten(&self, params: ShortenParams) -> Result<ShortCode>;

    /// Resolves a short code to the original URL.
    async fn resolve(&self, code: &str) -> Result<String>;
}
