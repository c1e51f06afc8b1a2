//! # sdjwt-crypto — Digests, Salts and the Disclosure Codec
//!
//! Provides the cryptographic building blocks of selective disclosure:
//!
//! - **Hash algorithms** named by their IANA identifiers (`sha-256`,
//!   `sha-384`, `sha-512`) and the base64url digests they produce.
//! - **Disclosures**: salted `[salt, name?, value]` arrays in base64url wire
//!   form, decoded with full structural validation.
//! - **Salt and decoy sources** as `Send + Sync` traits with CSPRNG-backed
//!   defaults, so tests can substitute deterministic fakes.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `sdjwt-*` crates.
//! - Digests are always computed over a disclosure's encoded form as issued
//!   or received, never over a re-serialization.
//! - Salts never appear in `Debug` output.
//! - No `unsafe` code.

pub mod decoy;
pub mod disclosure;
pub mod error;
pub mod hash;
pub mod salt;

pub use decoy::{DecoyGenerator, RandomDecoyGenerator};
pub use disclosure::{nesting_depth, Disclosure, FORBIDDEN_DISCLOSURE_NAMES, MAX_NESTING_DEPTH};
pub use error::CryptoError;
pub use hash::{DisclosureDigest, HashAlgorithm};
pub use salt::{RandomSaltProvider, Salt, SaltProvider, DEFAULT_SALT_LENGTH};
