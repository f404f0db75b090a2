pub mod random;

pub use random::{RandomGenerator, ALPHABET};

use pinhole_core::ShortCode;

/// Trait for generating candidate short codes.
///
/// Implementations are pure generators that don't interact with storage.
/// A candidate may collide with a stored alias; the caller detects that on
/// insert and asks for another one.
pub trait Generator: Send + Sync + 'static {
    /// Generates a code of exactly `length` characters.
    fn generate(&self, length: usize) -> ShortCode;
}
