//! # Error Types for Issuance and Reconstruction
//!
//! Issuance fails fast with a single [`IssuanceError`]. Reconstruction never
//! stops at the first problem: every [`Inconsistency`] found in a payload
//! and its disclosures is collected into one [`ReconstructionError`], and no
//! partially revealed claim set is ever returned alongside it.

use std::fmt;

use sdjwt_core::TreeError;
use sdjwt_crypto::{CryptoError, DisclosureDigest};
use thiserror::Error;

/// Errors raised while producing or signing a payload.
#[derive(Error, Debug)]
pub enum IssuanceError {
    /// The issuance configuration is unusable.
    #[error("invalid issuance configuration: {0}")]
    Config(String),

    /// A tree construction rule was violated.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// A disclosure could not be created.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// A leaf value embeds an object key that the wire format reserves.
    #[error("claim \"{path}\" embeds reserved key \"{key}\"")]
    ReservedKeyInValue {
        /// Claim path of the offending leaf.
        path: String,
        /// The reserved key.
        key: String,
    },

    /// The rendered payload, a disclosure or the claim set would nest
    /// deeper than can be read back.
    #[error("claim \"{path}\" nests {depth} levels deep, beyond the limit of {limit}")]
    TooDeep {
        /// Claim path of the node where the limit was crossed.
        path: String,
        /// Nesting reached there.
        depth: usize,
        /// The limit.
        limit: usize,
    },

    /// The root object was concealed; only its members can be.
    #[error("the root object cannot be selectively disclosed")]
    ConcealedRoot,

    /// The signer rejected the payload.
    #[error("payload signing failed: {0}")]
    Signing(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Which disclosure shape a reference expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisclosureShape {
    /// `[salt, name, value]`, referenced from `_sd`.
    ObjectProperty,
    /// `[salt, value]`, referenced from a `...` wrapper.
    ArrayElement,
}

impl fmt::Display for DisclosureShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ObjectProperty => f.write_str("object property"),
            Self::ArrayElement => f.write_str("array element"),
        }
    }
}

/// One structural problem found while reconstructing claims.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Inconsistency {
    /// The signed payload is not a JSON object.
    #[error("payload is not a JSON object")]
    PayloadNotAnObject,

    /// `_sd_alg` names an unsupported or malformed algorithm.
    #[error("unsupported hash algorithm {0}")]
    UnsupportedHashAlgorithm(String),

    /// A supplied disclosure string could not be decoded.
    #[error("disclosure #{index} is malformed: {reason}")]
    MalformedDisclosure {
        /// Position in the supplied list.
        index: usize,
        /// Decoder message.
        reason: String,
    },

    /// The same disclosure was supplied more than once.
    #[error("disclosure with digest {digest} supplied more than once")]
    DuplicateDisclosure {
        /// Digest of the repeated disclosure.
        digest: DisclosureDigest,
    },

    /// Two different disclosures hash to the same digest.
    #[error("digest {digest} matches more than one disclosure")]
    AmbiguousDigest {
        /// The contested digest.
        digest: DisclosureDigest,
    },

    /// A supplied disclosure is not referenced from the payload.
    #[error("disclosure with digest {digest} is not referenced by the payload")]
    UnusedDisclosure {
        /// Digest of the orphan.
        digest: DisclosureDigest,
    },

    /// The payload references the same digest more than once.
    #[error("digest {digest} is referenced more than once")]
    DigestReferencedTwice {
        /// The repeated digest.
        digest: DisclosureDigest,
    },

    /// A digest resolves to a disclosure of the wrong shape for its
    /// position.
    #[error("digest {digest} at {location} expects an {expected} disclosure")]
    WrongDisclosureShape {
        /// The digest.
        digest: DisclosureDigest,
        /// Where the reference sits.
        location: String,
        /// Shape required there.
        expected: DisclosureShape,
    },

    /// A disclosed property name already exists in its object.
    #[error("disclosed claim \"{name}\" at {location} collides with an existing claim")]
    ClaimNameCollision {
        /// The colliding name.
        name: String,
        /// The enclosing object.
        location: String,
    },

    /// An `_sd` list or `...` wrapper is not well formed.
    #[error("malformed digest reference at {location}")]
    MalformedDigestList {
        /// Where the bad reference sits.
        location: String,
    },

    /// A digest has no disclosure while undisclosed digests are rejected.
    #[error("digest {digest} at {location} has no disclosure")]
    UndisclosedDigest {
        /// The unmatched digest.
        digest: DisclosureDigest,
        /// Where the reference sits.
        location: String,
    },

    /// Revealed claims nest deeper than the limit.
    #[error("revealed claims at {location} nest deeper than {limit} levels")]
    TooDeep {
        /// The first claim beyond the limit.
        location: String,
        /// The limit.
        limit: usize,
    },
}

/// Every inconsistency found while reconstructing one payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("claim reconstruction failed:\n{}", display_list(.inconsistencies))]
pub struct ReconstructionError {
    inconsistencies: Vec<Inconsistency>,
}

impl ReconstructionError {
    /// Wrap a single inconsistency.
    pub fn single(inconsistency: Inconsistency) -> Self {
        Self {
            inconsistencies: vec![inconsistency],
        }
    }

    /// Fail with `inconsistencies` unless there are none.
    pub(crate) fn check(inconsistencies: Vec<Inconsistency>) -> Result<(), Self> {
        if inconsistencies.is_empty() {
            Ok(())
        } else {
            Err(Self { inconsistencies })
        }
    }

    /// The inconsistencies, in discovery order; never empty.
    pub fn inconsistencies(&self) -> &[Inconsistency] {
        &self.inconsistencies
    }

    /// Consume the error, returning its inconsistencies.
    pub fn into_inner(self) -> Vec<Inconsistency> {
        self.inconsistencies
    }

    /// Number of inconsistencies.
    pub fn len(&self) -> usize {
        self.inconsistencies.len()
    }

    /// Always false.
    pub fn is_empty(&self) -> bool {
        self.inconsistencies.is_empty()
    }
}

fn display_list(inconsistencies: &[Inconsistency]) -> String {
    inconsistencies
        .iter()
        .map(|i| format!("  {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}
