use crate::error::{Result, ShortenerError};
use crate::shortener::{ShortenParams, Shortener};
use async_trait::async_trait;
use pinhole_core::{AliasRecord, Repository, ShortCode, StorageError};
use pinhole_generator::Generator;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};
use typed_builder::TypedBuilder;

pub const DEFAULT_CODE_LENGTH: usize = 10;
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

/// Business rules of a [`ShortenerService`].
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct ShortenerConfig {
    /// Length of generated aliases.
    #[builder(default = DEFAULT_CODE_LENGTH)]
    pub code_length: usize,
    /// How many generated aliases are tried before giving up with
    /// [`ShortenerError::RetryExhausted`].
    #[builder(default = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: usize,
    /// Return the alias already issued for a URL instead of minting a new one.
    /// Only applies to generated aliases.
    #[builder(default = true)]
    pub reuse_existing_alias: bool,
    /// Upper bound on each storage call.
    #[builder(default)]
    pub operation_timeout: Option<Duration>,
}

impl Default for ShortenerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A concrete implementation of the [`Shortener`] trait.
///
/// This service wraps a [`Repository`] and a [`Generator`] to handle:
/// - URL and custom alias validation
/// - Generated aliases, retried on collision up to `max_attempts`
/// - The reuse policy for URLs that already have an alias
/// - Translating storage errors into [`ShortenerError`]
///
/// All writes go through [`Repository::insert`]; the service never checks
/// for an alias before inserting it.
#[derive(Debug)]
pub struct ShortenerService<R, G> {
    repository: Arc<R>,
    generator: Arc<G>,
    config: ShortenerConfig,
}

impl<R, G> Clone for ShortenerService<R, G> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            generator: Arc::clone(&self.generator),
            config: self.config.clone(),
        }
    }
}

impl<R: Repository, G: Generator> ShortenerService<R, G> {
    /// Creates a new `ShortenerService` with the default configuration.
    pub fn new(repository: R, generator: G) -> Self {
        Self {
            repository: Arc::new(repository),
            generator: Arc::new(generator),
            config: ShortenerConfig::default(),
        }
    }

    /// Creates a new `ShortenerService` with a custom configuration.
    pub fn try_new(repository: R, generator: G, config: ShortenerConfig) -> Result<Self> {
        if config.code_length == 0 {
            return Err(ShortenerError::InvalidArgument(
                "code length must be at least 1".to_string(),
            ));
        }
        if config.max_attempts == 0 {
            return Err(ShortenerError::InvalidArgument(
                "max attempts must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            repository: Arc::new(repository),
            generator: Arc::new(generator),
            config,
        })
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn config(&self) -> &ShortenerConfig {
        &self.config
    }

    /// Validates that the URL has a valid format (has a scheme and host).
    fn validate_url(url: &str) -> Result<()> {
        if url.is_empty() {
            return Err(ShortenerError::InvalidArgument(
                "original_url is required".to_string(),
            ));
        }

        let Some((scheme, rest)) = url.split_once("://") else {
            return Err(ShortenerError::InvalidArgument(format!(
                "URL must have a valid scheme and host: {}",
                url
            )));
        };
        if scheme.is_empty() || rest.is_empty() || rest.starts_with('/') {
            return Err(ShortenerError::InvalidArgument(format!(
                "URL must have a valid scheme and host: {}",
                url
            )));
        }

        let scheme = scheme.to_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(ShortenerError::InvalidArgument(format!(
                "URL scheme must be http or https: {}",
                scheme
            )));
        }

        Ok(())
    }

    /// Runs a storage call under the configured timeout, if any.
    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> StorageResult<T>
    where
        F: Future<Output = StorageResult<T>>,
    {
        match self.config.operation_timeout {
            None => call.await,
            Some(limit) => tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
                Err(StorageError::Timeout(format!(
                    "{operation} exceeded {}ms",
                    limit.as_millis()
                )))
            }),
        }
    }

    /// Looks up an alias already issued for `original_url`. Backends without
    /// a reverse lookup report a miss.
    async fn existing_alias(&self, original_url: &str) -> Result<Option<ShortCode>> {
        match self
            .bounded(
                "find_by_original_url",
                self.repository.find_by_original_url(original_url),
            )
            .await
        {
            Ok(found) => Ok(found),
            Err(StorageError::Unsupported(operation)) => {
                debug!(operation, "backend has no reverse lookup, minting a new alias");
                Ok(None)
            }
            Err(err) => Err(internal("find_by_original_url", err)),
        }
    }

    async fn insert_custom(&self, code: ShortCode, original_url: String) -> Result<ShortCode> {
        let record = AliasRecord::new(code.clone(), original_url);

        match self.bounded("insert", self.repository.insert(record)).await {
            Ok(()) => {
                debug!(code = %code, "stored custom alias");
                Ok(code)
            }
            Err(StorageError::AliasConflict(alias)) => {
                Err(ShortenerError::AliasAlreadyExists(alias))
            }
            Err(StorageError::UrlConflict(url)) => Err(ShortenerError::UrlAlreadyExists(url)),
            Err(err) => Err(internal("insert", err)),
        }
    }

    async fn insert_generated(&self, original_url: String) -> Result<ShortCode> {
        for attempt in 1..=self.config.max_attempts {
            let code = self.generator.generate(self.config.code_length);
            let record = AliasRecord::new(code.clone(), original_url.clone());

            match self.bounded("insert", self.repository.insert(record)).await {
                Ok(()) => {
                    debug!(code = %code, attempt, "stored generated alias");
                    return Ok(code);
                }
                Err(StorageError::AliasConflict(_)) => {
                    warn!(code = %code, attempt, "generated alias collided, retrying");
                }
                Err(StorageError::UrlConflict(url)) => {
                    // A concurrent create won this URL after our lookup.
                    if self.config.reuse_existing_alias {
                        if let Some(existing) = self.existing_alias(&original_url).await? {
                            return Ok(existing);
                        }
                    }
                    return Err(ShortenerError::UrlAlreadyExists(url));
                }
                Err(err) => return Err(internal("insert", err)),
            }
        }

        error!(
            attempts = self.config.max_attempts,
            code_length = self.config.code_length,
            "exhausted attempts to generate a unique alias"
        );
        Err(ShortenerError::RetryExhausted {
            attempts: self.config.max_attempts,
        })
    }
}

type StorageResult<T> = std::result::Result<T, StorageError>;

/// Logs the backend failure and returns an error without its detail.
fn internal(operation: &'static str, err: StorageError) -> ShortenerError {
    error!(operation, error = %err, "storage operation failed");
    ShortenerError::Internal(format!("storage operation `{operation}` failed"))
}

#[async_trait]
impl<R: Repository, G: Generator> Shortener for ShortenerService<R, G> {
    async fn shorten(&self, params: ShortenParams) -> Result<ShortCode> {
        Self::validate_url(&params.original_url)?;

        let custom_alias = params.custom_alias.filter(|alias| !alias.is_empty());
        if let Some(alias) = custom_alias {
            let code = ShortCode::new(alias)?;
            return self.insert_custom(code, params.original_url).await;
        }

        if self.config.reuse_existing_alias {
            if let Some(existing) = self.existing_alias(&params.original_url).await? {
                debug!(code = %existing, "reusing alias already issued for url");
                return Ok(existing);
            }
        }

        self.insert_generated(params.original_url).await
    }

    async fn resolve(&self, code: &str) -> Result<String> {
        if code.is_empty() {
            return Err(ShortenerError::InvalidArgument(
                "short_url is required".to_string(),
            ));
        }

        let code = ShortCode::new_unchecked(code);
        match self.bounded("get", self.repository.get(&code)).await {
            Ok(Some(record)) => Ok(record.original_url),
            Ok(None) => {
                debug!(code = %code, "short code not found");
                Err(ShortenerError::NotFound(code.into_inner()))
            }
            Err(err) => Err(internal("get", err)),
        }
    }
}
