//! Salt sources for disclosures.
//!
//! Every disclosure carries a fresh salt so that equal claim values never
//! produce equal digests. Salts are base64url strings of random bytes.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Default number of random bytes per salt (128 bits).
pub const DEFAULT_SALT_LENGTH: usize = 16;

/// A disclosure salt.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Salt(String);

impl Salt {
    /// Wrap an already-encoded salt.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Encode raw random bytes as a salt.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// The salt string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Salts are secret until the holder reveals the disclosure.
impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Salt(..)")
    }
}

/// Source of fresh salts.
///
/// Implementations must never hand out the same salt twice.
pub trait SaltProvider: Send + Sync {
    /// Produce a fresh salt.
    fn salt(&self) -> Salt;
}

/// Draws salts from the operating system's CSPRNG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomSaltProvider {
    length: usize,
}

impl RandomSaltProvider {
    /// Salts of `length` random bytes.
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    /// Number of random bytes per salt.
    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for RandomSaltProvider {
    fn default() -> Self {
        Self::new(DEFAULT_SALT_LENGTH)
    }
}

impl SaltProvider for RandomSaltProvider {
    fn salt(&self) -> Salt {
        let mut bytes = vec![0u8; self.length];
        OsRng.fill_bytes(&mut bytes);
        Salt::from_bytes(&bytes)
    }
}

impl<P: SaltProvider + ?Sized> SaltProvider for &P {
    fn salt(&self) -> Salt {
        (**self).salt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_random_salts_are_distinct() {
        let provider = RandomSaltProvider::default();
        let salts: HashSet<Salt> = (0..64).map(|_| provider.salt()).collect();
        assert_eq!(salts.len(), 64);
    }

    #[test]
    fn test_salt_length_follows_byte_count() {
        assert_eq!(RandomSaltProvider::default().salt().as_str().len(), 22);
        assert_eq!(RandomSaltProvider::new(32).salt().as_str().len(), 43);
    }

    #[test]
    fn test_debug_hides_salt() {
        assert_eq!(format!("{:?}", Salt::new("secret")), "Salt(..)");
    }
}
