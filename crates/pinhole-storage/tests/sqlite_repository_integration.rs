use std::sync::Arc;

use pinhole_core::{AliasRecord, ShortCode};
use pinhole_storage::{ReadRepository, Repository, SqliteRepository, StorageError, UrlUniqueness};

struct Fixture {
    repo: SqliteRepository,
}

impl Fixture {
    async fn start(url_uniqueness: UrlUniqueness) -> Self {
        let repo = SqliteRepository::in_memory(url_uniqueness)
            .await
            .expect("open in-memory sqlite");
        Self { repo }
    }
}

fn code(value: &str) -> ShortCode {
    ShortCode::new_unchecked(value)
}

fn record(short_code: &str, url: &str) -> AliasRecord {
    AliasRecord::new(code(short_code), url)
}

#[tokio::test]
async fn insert_and_get_record() {
    let fixture = Fixture::start(UrlUniqueness::Enforced).await;

    fixture
        .repo
        .insert(record("abc123", "https://example.com"))
        .await
        .unwrap();

    let got = fixture.repo.get(&code("abc123")).await.unwrap().unwrap();
    assert_eq!(got, record("abc123", "https://example.com"));
}

#[tokio::test]
async fn get_returns_none_for_unknown_code() {
    let fixture = Fixture::start(UrlUniqueness::Enforced).await;

    let got = fixture.repo.get(&code("unknown")).await.unwrap();
    assert!(got.is_none());
}

#[tokio::test]
async fn insert_conflicts_when_code_already_exists() {
    let fixture = Fixture::start(UrlUniqueness::Relaxed).await;

    fixture
        .repo
        .insert(record("existing", "https://example.com"))
        .await
        .unwrap();

    let err = fixture
        .repo
        .insert(record("existing", "https://example.org"))
        .await
        .unwrap_err();

    assert_eq!(err, StorageError::AliasConflict("existing".to_string()));

    let got = fixture.repo.get(&code("existing")).await.unwrap().unwrap();
    assert_eq!(got.original_url, "https://example.com");
}

#[tokio::test]
async fn enforced_policy_rejects_duplicate_url() {
    let fixture = Fixture::start(UrlUniqueness::Enforced).await;

    fixture
        .repo
        .insert(record("first", "https://example.com"))
        .await
        .unwrap();

    let err = fixture
        .repo
        .insert(record("second", "https://example.com"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        StorageError::UrlConflict("https://example.com".to_string())
    );
    assert!(fixture.repo.get(&code("second")).await.unwrap().is_none());
}

#[tokio::test]
async fn relaxed_policy_accepts_duplicate_url() {
    let fixture = Fixture::start(UrlUniqueness::Relaxed).await;

    fixture
        .repo
        .insert(record("first", "https://example.com"))
        .await
        .unwrap();
    fixture
        .repo
        .insert(record("second", "https://example.com"))
        .await
        .unwrap();

    let found = fixture
        .repo
        .find_by_original_url("https://example.com")
        .await
        .unwrap();
    assert_eq!(found, Some(code("first")));
}

#[tokio::test]
async fn find_by_original_url_misses_unknown_url() {
    let fixture = Fixture::start(UrlUniqueness::Enforced).await;

    let found = fixture
        .repo
        .find_by_original_url("https://nowhere.example")
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn reconnecting_with_relaxed_policy_drops_unique_index() {
    let fixture = Fixture::start(UrlUniqueness::Enforced).await;
    let pool = fixture.repo.pool().clone();

    let relaxed = SqliteRepository::new(pool, UrlUniqueness::Relaxed)
        .await
        .unwrap();

    relaxed
        .insert(record("first", "https://example.com"))
        .await
        .unwrap();
    relaxed
        .insert(record("second", "https://example.com"))
        .await
        .unwrap();
}

#[tokio::test]
async fn table_has_expected_columns() {
    let fixture = Fixture::start(UrlUniqueness::Enforced).await;

    let columns: Vec<(String, i64)> =
        sqlx::query_as("SELECT name, pk FROM pragma_table_info('urls') ORDER BY cid")
            .fetch_all(fixture.repo.pool())
            .await
            .unwrap();

    assert_eq!(
        columns,
        vec![("short_url".to_string(), 1), ("original_url".to_string(), 0)]
    );
}

#[tokio::test]
async fn concurrent_inserts_of_same_code_have_one_winner() {
    let fixture = Fixture::start(UrlUniqueness::Relaxed).await;
    let repo = Arc::new(fixture.repo);
    let mut handles = vec![];

    for i in 0..16u32 {
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
}

#[tokio::test]
async fn file_database_persists_across_connections() {
    let path = std::env::temp_dir().join(format!(
        "pinhole-storage-test-{}.db",
        std::process::id()
    ));
    let url = format!("sqlite://{}", path.display());

    {
        let repo = SqliteRepository::connect(&url, UrlUniqueness::Enforced)
            .await
            .unwrap();
        repo.insert(record("persisted", "https://example.com"))
            .await
            .unwrap();
        repo.pool().close().await;
    }

    let repo = SqliteRepository::connect(&url, UrlUniqueness::Enforced)
        .await
        .unwrap();
    let got = repo.get(&code("persisted")).await.unwrap().unwrap();
    assert_eq!(got.original_url, "https://example.com");
    repo.pool().close().await;

    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
}
