//! Core types and traits for the Pinhole URL shortener.
//!
//! This crate provides the alias record model, the validated [`ShortCode`]
//! identifier and the storage capability traits shared by every backend.

pub mod error;
pub mod repository;
pub mod shortcode;

pub use error::{CoreError, StorageError};
pub use repository::{AliasRecord, ReadRepository, Repository, UrlUniqueness};
pub use shortcode::ShortCode;
