//! Storage backends for the Pinhole shortener.
//!
//! Both backends implement [`Repository`] with the same contract: an insert
//! either stores a new record or fails with a conflict, atomically with
//! respect to every other writer of the same backend instance.

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryRepository;
pub use pinhole_core::{AliasRecord, ReadRepository, Repository, StorageError, UrlUniqueness};
pub use sqlite::SqliteRepository;
