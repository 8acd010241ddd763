//! Randomness abstraction for deterministic testing.
//!
//! Nonces and key ids are the only random values in this crate. Routing them
//! through [`Entropy`] lets tests use seeded or failing sources while
//! production uses the OS RNG.

use crate::error::{KeysetError, Result};

/// Source of random bytes.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `fill()` uses cryptographically secure entropy in production
/// - `fill()` either fills the entire buffer or returns an error
pub trait Entropy {
    /// Fills the provided buffer with random bytes.
    ///
    /// # Errors
    ///
    /// - `EncryptionFailure`: the underlying source is unavailable
    fn fill(&self, buffer: &mut [u8]) -> Result<()>;

    /// Generates a random `u32`, uniform over the full range.
    fn random_u32(&self) -> Result<u32> {
        let mut bytes = [0u8; 4];
        self.fill(&mut bytes)?;
        Ok(u32::from_be_bytes(bytes))
    }
}

/// Production entropy backed by the OS cryptographic RNG (getrandom).
///
/// Unlike a server environment, an RNG failure here is surfaced as
/// `EncryptionFailure` instead of aborting, so the caller decides.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl Entropy for OsEntropy {
    fn fill(&self, buffer: &mut [u8]) -> Result<()> {
        getrandom::fill(buffer)
            .map_err(|err| KeysetError::EncryptionFailure { reason: err.to_string() })
    }
}
