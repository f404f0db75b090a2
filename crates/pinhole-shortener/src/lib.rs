//! URL shortener service implementation.
//!
//! This crate provides [`ShortenerService`], which turns a storage backend and
//! a code generator into the create/resolve operations, and the gRPC adapter
//! that exposes them. Core types are re-exported from `pinhole_core`.

pub mod error;
pub mod grpc;
pub mod service;
pub mod shortener;

pub use error::ShortenerError;
pub use grpc::ShortenerGrpcServer;
pub use pinhole_core::ShortCode;
pub use service::{ShortenerConfig, ShortenerService};
pub use shortener::{ShortenParams, Shortener};
