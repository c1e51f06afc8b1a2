//! # sdjwt-codec — The Selective Disclosure Codec
//!
//! Implements both directions of the transform between a disclosure tree
//! and a signable payload with its flat list of disclosures:
//!
//! - **Generation** ([`SdJwtFactory`]): salting, encoding, hashing and
//!   decoy padding, driven by a post-order fold over the tree.
//! - **Reconstruction** ([`recreate_claims`]): digest matching, recursive
//!   unwinding, and aggregated consistency checking.
//! - **Presentation** ([`select_disclosures`], [`SdJwt::present`]): the
//!   smallest disclosure subset revealing a set of claim paths.
//!
//! Signing and signature verification are collaborator contracts
//! ([`PayloadSigner`], [`PayloadVerifier`]).
//!
//! ## Crate Policy
//!
//! - Depends on `sdjwt-core` and `sdjwt-crypto` internally.
//! - Reconstruction either returns a fully revealed claim set or every
//!   inconsistency it found; never a partial result.
//! - Salts and disclosure contents are never logged.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod config;
pub mod error;
pub mod generator;
pub mod presentation;
pub mod reconstruct;
pub mod sdjwt;

#[cfg(test)]
mod testing;

pub use config::{IssuanceConfig, ReconstructionPolicy, UndisclosedDigests};
pub use error::{DisclosureShape, Inconsistency, IssuanceError, ReconstructionError};
pub use generator::{
    SdJwtFactory, UnsignedSdJwt, ARRAY_DIGEST_KEY, SD_ALG_CLAIM, SD_CLAIM,
};
pub use presentation::select_disclosures;
pub use reconstruct::{
    decode_disclosures, payload_hash_algorithm, recreate_claims, recreate_claims_from_encoded,
    DisclosuresPerClaimPath, RecreatedClaims,
};
pub use sdjwt::{PayloadSigner, PayloadVerifier, SdJwt, VerifiedPayload};
