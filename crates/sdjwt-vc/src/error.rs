//! # Error Types
//!
//! Failures of the credential layer, split by phase:
//!
//! - [`DefinitionError`]: type metadata that cannot become a definition.
//! - [`ResolutionError`]: type metadata that could not be obtained.
//! - [`VerificationError`]: any failure of the full verification pipeline.
//!
//! Violations of a definition by a credential are not errors of this
//! module; they are collected in
//! [`DefinitionViolations`](crate::validator::DefinitionViolations).

use thiserror::Error;

use sdjwt_core::TreeError;

use crate::validator::DefinitionViolations;

/// Type metadata that cannot be turned into a definition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    /// A node declares both named and positional children.
    #[error("claim '{path}' declares both named and positional children")]
    MixedChildren {
        /// Display form of the node's path.
        path: String,
    },

    /// The same claim path is declared twice.
    #[error("claim path '{0}' is declared more than once")]
    DuplicateClaimPath(String),

    /// A top-level declaration addresses an array position.
    #[error("top-level claim path '{0}' must start with a claim name")]
    PositionalTopLevelClaim(String),

    /// The resulting tree is malformed.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Type metadata could not be obtained.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// No metadata is known for the type.
    #[error("no type metadata for '{0}'")]
    UnknownType(String),

    /// Following `extends` revisited a type.
    #[error("type metadata for '{0}' extends itself")]
    ExtendsCycle(String),

    /// The resolver's backing store failed.
    #[error("type metadata lookup for '{vct}' failed: {reason}")]
    Backend {
        /// The requested type.
        vct: String,
        /// What went wrong.
        reason: String,
    },
}

/// The verification pipeline failed.
#[derive(Error, Debug)]
pub enum VerificationError {
    /// The token's signature was rejected.
    #[error("signature verification failed: {0}")]
    Signature(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The credential type's metadata could not be resolved.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// The resolved metadata is malformed.
    #[error("invalid type metadata: {0}")]
    Definition(#[from] DefinitionError),

    /// The credential violates its definition or its disclosures are
    /// inconsistent.
    #[error("credential rejected:\n{0}")]
    Invalid(#[from] DefinitionViolations),
}
