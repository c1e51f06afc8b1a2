//! Decoy digests.
//!
//! A decoy is a digest with no disclosure behind it. It is computed the
//! same way as a real digest, over random input, so the two cannot be told
//! apart.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::hash::{DisclosureDigest, HashAlgorithm};

/// Source of decoy digests.
pub trait DecoyGenerator: Send + Sync {
    /// Produce one decoy digest for `algorithm`.
    fn decoy(&self, algorithm: HashAlgorithm) -> DisclosureDigest;
}

/// Hashes fresh random bytes from the operating system's CSPRNG.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RandomDecoyGenerator;

impl DecoyGenerator for RandomDecoyGenerator {
    fn decoy(&self, algorithm: HashAlgorithm) -> DisclosureDigest {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        algorithm.digest(&bytes)
    }
}

impl<G: DecoyGenerator + ?Sized> DecoyGenerator for &G {
    fn decoy(&self, algorithm: HashAlgorithm) -> DisclosureDigest {
        (**self).decoy(algorithm)
    }
}
