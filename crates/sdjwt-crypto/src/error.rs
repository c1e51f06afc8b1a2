//! Error types for hashing and the disclosure codec.

use thiserror::Error;

/// Errors raised while hashing or encoding and decoding disclosures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The hash algorithm identifier is not one of the supported IANA names.
    #[error("unsupported hash algorithm: {0}")]
    UnsupportedHashAlgorithm(String),

    /// A disclosure string could not be decoded into a disclosure.
    #[error("malformed disclosure: {reason}")]
    MalformedDisclosure {
        /// What was wrong with it.
        reason: String,
    },

    /// A disclosure names a claim the wire format reserves.
    #[error("disclosure uses reserved claim name \"{0}\"")]
    ReservedClaimName(String),

    /// The disclosure content could not be serialized.
    #[error("disclosure serialization failed: {0}")]
    Serialization(String),
}

impl CryptoError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedDisclosure {
            reason: reason.into(),
        }
    }
}
