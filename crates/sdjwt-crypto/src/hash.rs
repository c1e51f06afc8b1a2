//! # Hash Algorithms and Disclosure Digests
//!
//! A token commits to every disclosure through a digest: the hash of the
//! disclosure's encoded form, base64url-encoded without padding. The
//! algorithm is declared once per token under `_sd_alg` using its IANA
//! "Named Information Hash Algorithm" identifier.
//!
//! ## Security Invariant
//!
//! Digests are computed over the ASCII bytes of a disclosure exactly as it
//! was issued or received. Disclosures are never re-serialized before
//! hashing, since JSON serialization is not canonical across issuers.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::error::CryptoError;

/// Hash algorithm used for every digest of one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// SHA-256; the default, and the algorithm assumed when a payload does
    /// not declare one.
    #[default]
    #[serde(rename = "sha-256")]
    Sha256,
    /// SHA-384.
    #[serde(rename = "sha-384")]
    Sha384,
    /// SHA-512.
    #[serde(rename = "sha-512")]
    Sha512,
}

impl HashAlgorithm {
    /// Every supported algorithm.
    pub const ALL: [HashAlgorithm; 3] = [Self::Sha256, Self::Sha384, Self::Sha512];

    /// The IANA identifier written to `_sd_alg`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha-256",
            Self::Sha384 => "sha-384",
            Self::Sha512 => "sha-512",
        }
    }

    /// Parse an IANA identifier.
    pub fn from_identifier(identifier: &str) -> Result<Self, CryptoError> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.as_str() == identifier)
            .ok_or_else(|| CryptoError::UnsupportedHashAlgorithm(identifier.to_string()))
    }

    /// Raw hash of `data`.
    pub fn hash(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha384 => Sha384::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    /// Base64url digest of `data`.
    pub fn digest(&self, data: &[u8]) -> DisclosureDigest {
        DisclosureDigest(URL_SAFE_NO_PAD.encode(self.hash(data)))
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_identifier(s)
    }
}

/// A base64url digest as it appears in `_sd` lists and `...` wrappers.
///
/// Digests read from a payload are taken verbatim; no attempt is made to
/// check their length against the algorithm, so decoys from any source
/// compare correctly.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisclosureDigest(String);

impl DisclosureDigest {
    /// Wrap a digest string taken from a payload.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// The base64url string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the digest, returning the string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DisclosureDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
