//! # Error Types: Construction Failures
//!
//! Trees, claim paths and definitions are validated when they are built.
//! A malformed structure is rejected immediately and is never coerced into
//! something that would render differently from what the caller described.

use thiserror::Error;

/// Error raised while building a disclosure tree or claim path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The same key was added twice to one object.
    #[error("duplicate key in object: {0}")]
    DuplicateKey(String),

    /// A claim name collides with a name reserved by the wire format.
    #[error("claim name '{0}' is reserved")]
    ReservedClaimName(String),

    /// A minimum-digests hint of zero was supplied.
    #[error("minimum digests must be at least 1, got {0}")]
    InvalidMinimumDigests(u32),

    /// A union of alternatives was built with fewer than two members.
    #[error("a union of alternatives needs at least two members, got {0}")]
    EmptyAlternatives(usize),

    /// A claim path with no elements was supplied.
    #[error("claim path must contain at least one element")]
    EmptyClaimPath,
}
