use async_trait::async_trait;
use parking_lot::RwLock;
use pinhole_core::repository::{AliasRecord, ReadRepository, Repository, Result, UrlUniqueness};
use pinhole_core::{ShortCode, StorageError};
use std::collections::HashMap;
use tracing::trace;

/// Both lookup directions, guarded together.
#[derive(Debug, Default)]
struct Registry {
    /// short code -> original url
    by_code: HashMap<ShortCode, String>,
    /// original url -> first short code issued for it
    by_url: HashMap<String, ShortCode>,
}

/// In-memory implementation of the [`Repository`] trait.
///
/// The forward map and the reverse index live behind a single lock, so an
/// insert checks and updates both in one critical section. The lock is never
/// held across an `.await`.
#[derive(Debug)]
pub struct InMemoryRepository {
    registry: RwLock<Registry>,
    url_uniqueness: UrlUniqueness,
}

impl InMemoryRepository {
    /// Creates an empty repository that enforces URL uniqueness.
    pub fn new() -> Self {
        Self::with_url_uniqueness(UrlUniqueness::Enforced)
    }

    /// Creates an empty repository with the given URL uniqueness policy.
    pub fn with_url_uniqueness(url_uniqueness: UrlUniqueness) -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            url_uniqueness,
        }
    }

    /// Creates a new in-memory repository with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            registry: RwLock::new(Registry {
                by_code: HashMap::with_capacity(capacity),
                by_url: HashMap::with_capacity(capacity),
            }),
            url_uniqueness: UrlUniqueness::Enforced,
        }
    }

    pub fn url_uniqueness(&self) -> UrlUniqueness {
        self.url_uniqueness
    }

    /// Number of stored aliases.
    pub fn len(&self) -> usize {
        self.registry.read().by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn get(&self, code: &ShortCode) -> Result<Option<AliasRecord>> {
        let registry = self.registry.read();
        Ok(registry
            .by_code
            .get(code)
            .map(|url| AliasRecord::new(code.clone(), url.clone())))
    }

    async fn find_by_original_url(&self, original_url: &str) -> Result<Option<ShortCode>> {
        let registry = self.registry.read();
        Ok(registry.by_url.get(original_url).cloned())
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn insert(&self, record: AliasRecord) -> Result<()> {
        let mut registry = self.registry.write();

        if registry.by_code.contains_key(&record.short_code) {
            return Err(StorageError::AliasConflict(record.short_code.into_inner()));
        }
        if self.url_uniqueness == UrlUniqueness::Enforced
            && registry.by_url.contains_key(&record.original_url)
        {
            return Err(StorageError::UrlConflict(record.original_url));
        }

        trace!(code = %record.short_code, url = %record.original_url, "inserting alias");

        registry
            .by_url
            .entry(record.original_url.clone())
            .or_insert_with(|| record.short_code.clone());
        registry
            .by_code
            .insert(record.short_code, record.original_url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn code(s: &str) -> ShortCode {
        ShortCode::new_unchecked(s)
    }

    fn record(c: &str, url: &str) -> AliasRecord {
        AliasRecord::new(code(c), url)
    }

    #[tokio::test]
    async fn save_and_get() {
        let repo = InMemoryRepository::new();

        repo.insert(record("abc123", "https://example.com"))
            .await
            .unwrap();

        let result = repo.get(&code("abc123")).await.unwrap().unwrap();
        assert_eq!(result.original_url, "https://example.com");
        assert_eq!(result.short_code, code("abc123"));
    }

    #[tokio::test]
    async fn get_nonexistent() {
        let repo = InMemoryRepository::new();

        let result = repo.get(&code("nope")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn insert_alias_conflict() {
        let repo = InMemoryRepository::new();

        repo.insert(record("abc123", "https://example.com"))
            .await
            .unwrap();

        let err = repo
            .insert(record("abc123", "https://other.com"))
            .await
            .unwrap_err();

        assert_eq!(err, StorageError::AliasConflict("abc123".to_string()));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn alias_conflict_wins_over_url_conflict() {
        let repo = InMemoryRepository::new();

        repo.insert(record("abc123", "https://example.com"))
            .await
            .unwrap();

        let err = repo
            .insert(record("abc123", "https://example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::AliasConflict(_)));
    }

    #[tokio::test]
    async fn enforced_policy_rejects_second_alias_for_url() {
        let repo = InMemoryRepository::new();

        repo.insert(record("first", "https://example.com"))
            .await
            .unwrap();

        let err = repo
            .insert(record("second", "https://example.com"))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            StorageError::UrlConflict("https://example.com".to_string())
        );
        assert!(repo.get(&code("second")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn relaxed_policy_accepts_second_alias_for_url() {
        let repo = InMemoryRepository::with_url_uniqueness(UrlUniqueness::Relaxed);

        repo.insert(record("first", "https://example.com"))
            .await
            .unwrap();
        repo.insert(record("second", "https://example.com"))
            .await
            .unwrap();

        assert_eq!(repo.len(), 2);
        // The reverse index keeps the first alias issued.
        assert_eq!(
            repo.find_by_original_url("https://example.com")
                .await
                .unwrap(),
            Some(code("first"))
        );
    }

    #[tokio::test]
    async fn reverse_lookup() {
        let repo = InMemoryRepository::with_capacity(4);

        assert!(repo
            .find_by_original_url("https://example.com")
            .await
            .unwrap()
            .is_none());

        repo.insert(record("abc123", "https://example.com"))
            .await
            .unwrap();

        assert_eq!(
            repo.find_by_original_url("https://example.com")
                .await
                .unwrap(),
            Some(code("abc123"))
        );
    }

    #[tokio::test]
    async fn concurrent_inserts_of_same_alias_have_one_winner() {
        let repo = Arc::new(InMemoryRepository::with_url_uniqueness(
            UrlUniqueness::Relaxed,
        ));
        let mut handles = vec![];

        for i in 0..32u64 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                repo.insert(record("contested", &format!("https://example{i}.com")))
                    .await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => winners += 1,
                Err(err) => assert!(matches!(err, StorageError::AliasConflict(_))),
            }
        }

        assert_eq!(winners, 1);
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_inserts_of_same_url_have_one_winner() {
        let repo = Arc::new(InMemoryRepository::new());
        let mut handles = vec![];

        for i in 0..32u64 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                repo.insert(record(&format!("code-{i:03}"), "https://example.com"))
                    .await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => winners += 1,
                Err(err) => assert!(matches!(err, StorageError::UrlConflict(_))),
            }
        }

        assert_eq!(winners, 1);
        let winner = repo
            .find_by_original_url("https://example.com")
            .await
            .unwrap()
            .unwrap();
        let stored = repo.get(&winner).await.unwrap().unwrap();
        assert_eq!(stored.original_url, "https://example.com");
    }

    #[tokio::test]
    async fn concurrent_access() {
        let repo = Arc::new(InMemoryRepository::new());
        let mut handles = vec![];

        for i in 0..10u64 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                repo.insert(record(
                    &format!("code-{:03}", i),
                    &format!("https://example{}.com", i),
                ))
                .await
                .unwrap();
            }));
        }

        for i in 0..10u64 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                let _ = repo.get(&code(&format!("code-{:03}", i))).await;
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        for i in 0..10u64 {
            let result = repo
                .get(&code(&format!("code-{:03}", i)))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(result.original_url, format!("https://example{}.com", i));
        }
    }
}
