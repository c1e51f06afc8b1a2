//! # sdjwt-vc — SD-JWT Verifiable Credentials
//!
//! Checks revealed SD-JWT credentials against the declared contract of
//! their type:
//!
//! - **Metadata** (`metadata.rs`): the flat, JSON-serializable type
//!   metadata model with claim paths, display data and disclosure policies.
//!
//! - **Definition** (`definition.rs`): conversion of flat metadata into a
//!   disclosure tree of claim metadata.
//!
//! - **Validator** (`validator.rs`): definition-based checking of claim
//!   types and disclosure policies, collecting every violation.
//!
//! - **Resolver** (`resolver.rs`): the type metadata lookup contract, with
//!   `extends` merging.
//!
//! - **Verifier** (`verifier.rs`): the full pipeline from a received token
//!   to a validated credential.
//!
//! ## Security Invariant
//!
//! A credential is reported valid only after its signature, the
//! consistency of its disclosures and its definition have all been
//! checked. Registered claims such as `iss`, `vct` and `exp` can never be
//! hidden behind a disclosure without a violation.
//!
//! ## Crate Policy
//!
//! - Depends on `sdjwt-core` and `sdjwt-codec` internally.
//! - Fetching metadata and checking signatures are collaborator concerns.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod definition;
pub mod error;
pub mod metadata;
pub mod resolver;
pub mod validator;
pub mod verifier;
pub mod well_known;

pub use definition::{ClaimDef, DefinitionElement, DefinitionObject, SdJwtDefinition};
pub use error::{DefinitionError, ResolutionError, VerificationError};
pub use metadata::{
    ClaimDisplay, ClaimMetadata, ClaimType, DisplayMetadata, SelectivelyDisclosable, TypeMetadata,
};
pub use resolver::{resolve_type_metadata, InMemoryResolver, TypeMetadataResolver};
pub use validator::{validate, validate_sd_jwt, DefinitionViolation, DefinitionViolations};
pub use verifier::{SdJwtVcVerifier, VerifiedCredential};
