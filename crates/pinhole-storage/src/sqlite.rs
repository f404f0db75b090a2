use async_trait::async_trait;
use pinhole_core::repository::{AliasRecord, ReadRepository, Repository, Result, UrlUniqueness};
use pinhole_core::{ShortCode, StorageError};
use sqlx::error::DatabaseError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info};

const SCHEMA: &str = include_str!("../ddl/sqlite/urls.sql");
const UNIQUE_URL_INDEX: &str = include_str!("../ddl/sqlite/urls_original_url_key.sql");
const DROP_UNIQUE_URL_INDEX: &str = "DROP INDEX IF EXISTS urls_original_url_key";

/// SQLite implementation of the repository contract.
///
/// Alias uniqueness is the table's primary key and URL uniqueness, when
/// enforced, is a unique index. Inserts are a plain `INSERT` and the engine's
/// constraint violation is the conflict signal, so there is no window between
/// a check and a write for a concurrent writer to slip into.
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
    url_uniqueness: UrlUniqueness,
}

impl SqliteRepository {
    /// Creates a repository from an existing pool and applies the schema.
    ///
    /// The unique index on `original_url` is created for
    /// [`UrlUniqueness::Enforced`] and dropped for [`UrlUniqueness::Relaxed`],
    /// so the database always matches the configured policy.
    pub async fn new(pool: SqlitePool, url_uniqueness: UrlUniqueness) -> Result<Self> {
        let repository = Self {
            pool,
            url_uniqueness,
        };
        repository.apply_schema().await?;
        Ok(repository)
    }

    /// Opens a pool for `database_url`, creating the database file if needed.
    pub async fn connect(database_url: &str, url_uniqueness: UrlUniqueness) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(map_sqlx_error)?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(map_sqlx_error)?;
        Self::new(pool, url_uniqueness).await
    }

    /// Opens a private in-memory database.
    ///
    /// The pool holds exactly one connection that is never recycled, since the
    /// database disappears with its last connection.
    pub async fn in_memory(url_uniqueness: UrlUniqueness) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(map_sqlx_error)?;
        Self::new(pool, url_uniqueness).await
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn url_uniqueness(&self) -> UrlUniqueness {
        self.url_uniqueness
    }

    async fn apply_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let policy_ddl = match self.url_uniqueness {
            UrlUniqueness::Enforced => UNIQUE_URL_INDEX,
            UrlUniqueness::Relaxed => DROP_UNIQUE_URL_INDEX,
        };
        sqlx::raw_sql(policy_ddl)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        info!(url_uniqueness = ?self.url_uniqueness, "sqlite schema ready");
        Ok(())
    }
}

fn is_unique_violation(err: &dyn DatabaseError) -> bool {
    err.is_unique_violation() || err.message().contains("UNIQUE constraint failed")
}

/// Translates a failed insert, telling the two unique constraints apart by the
/// column SQLite names in its message.
fn map_insert_error(err: sqlx::Error, record: AliasRecord) -> StorageError {
    let url_column = err
        .as_database_error()
        .filter(|db_err| is_unique_violation(*db_err))
        .map(|db_err| db_err.message().contains("original_url"));

    match url_column {
        Some(true) => StorageError::UrlConflict(record.original_url),
        Some(false) => StorageError::AliasConflict(record.short_code.into_inner()),
        None => map_sqlx_error(err),
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Configuration(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl ReadRepository for SqliteRepository {
    async fn get(&self, code: &ShortCode) -> Result<Option<AliasRecord>> {
        let row = sqlx::query(
            r#"
            SELECT original_url
            FROM urls
            WHERE short_url = ?
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let original_url: String = row.try_get("original_url").map_err(map_sqlx_error)?;
        Ok(Some(AliasRecord::new(code.clone(), original_url)))
    }

    async fn find_by_original_url(&self, original_url: &str) -> Result<Option<ShortCode>> {
        // rowid order keeps the first alias issued when duplicates are allowed
        let row = sqlx::query(
            r#"
            SELECT short_url
            FROM urls
            WHERE original_url = ?
            ORDER BY rowid
            LIMIT 1
            "#,
        )
        .bind(original_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(|row| {
            row.try_get::<String, _>("short_url")
                .map(ShortCode::new_unchecked)
                .map_err(map_sqlx_error)
        })
        .transpose()
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn insert(&self, record: AliasRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO urls (short_url, original_url)
            VALUES (?, ?)
            "#,
        )
        .bind(record.short_code.as_str().to_owned())
        .bind(record.original_url.clone())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!(code = %record.short_code, "inserted alias");
                Ok(())
            }
            Err(err) => Err(map_insert_error(err, record)),
        }
    }
}
