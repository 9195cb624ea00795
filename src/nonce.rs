use std::fmt;
use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{CryptoRng, RngCore, SeedableRng};

/// Length in bytes of the client nonce
pub const CNONCE_LEN: usize = 10;

/// Length in bytes of an opaque value synthesized when the server sent none
pub const OPAQUE_LEN: usize = 20;

/// Source of hex-encoded random tokens (cnonce, fallback opaque).
///
/// The generator may be shared by every request one [`DigestAuth`](crate::DigestAuth)
/// authenticates, so draws are serialized through a lock; the wrapped source must
/// be cryptographically secure.
pub struct NonceGenerator {
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl NonceGenerator {
    /// Wrap a cryptographically secure random source
    pub fn new<R>(rng: R) -> Self
    where
        R: RngCore + CryptoRng + Send + 'static,
    {
        Self {
            rng: Mutex::new(Box::new(rng)),
        }
    }

    /// Generator seeded from the operating system's entropy source
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Draw `len` random bytes and return them hex-encoded (`2 * len` characters)
    pub fn make_nonce(&self, len: usize) -> String {
        let mut bytes = vec![0u8; len];
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

impl Default for NonceGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl fmt::Debug for NonceGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NonceGenerator").finish_non_exhaustive()
    }
}
