use crate::Generator;
use pinhole_core::ShortCode;
use rand::Rng;

/// The 64 symbols a generated code is drawn from.
pub const ALPHABET: &[u8; 64] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-_";

/// Generates codes whose characters are drawn independently and uniformly
/// from [`ALPHABET`].
///
/// Randomness comes from [`rand::rng`], a CSPRNG seeded and periodically
/// reseeded from the operating system, so codes cannot be predicted from
/// previously issued ones. The generator holds no state of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomGenerator;

impl RandomGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for RandomGenerator {
    fn generate(&self, length: usize) -> ShortCode {
        let mut rng = rand::rng();
        let code: String = (0..length)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect();
        ShortCode::new_unchecked(code)
    }
}
