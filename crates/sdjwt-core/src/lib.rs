//! # sdjwt-core — Disclosure Trees and Their Traversal
//!
//! This crate defines the data model every other selective-disclosure crate
//! builds on: a generic, immutable tree whose nodes are tagged as either
//! always hidden behind their own disclosure or emitted in place, plus the
//! map and fold operators that walk it.
//!
//! ## Key Design Principles
//!
//! 1. **One sum type, matched everywhere.** A node is a leaf, an object or an
//!    array, wrapped in exactly one of two tags. Every consumer dispatches by
//!    `match`; adding a shape forces every handler to cover it.
//!
//! 2. **Validated construction.** Containers only come out of builders, which
//!    reject duplicate keys, reserved claim names and zero digest minimums.
//!
//! 3. **No native recursion.** [`traversal::fold`], [`traversal::walk`] and
//!    [`DisclosableObject::map`] run on heap-allocated work lists, and trees
//!    drop, clone and compare iteratively, so depth never translates into
//!    stack depth.
//!
//! 4. **Structured claim addresses.** [`ClaimPath`] names nodes of a revealed
//!    claim tree, including the all-elements wildcard, with the same JSON
//!    array form used by credential type metadata.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `sdjwt-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod path;
pub mod projection;
pub mod traversal;
pub mod tree;

pub use error::TreeError;
pub use path::{ClaimPath, ClaimPathElement};
pub use traversal::{fold, fold_element, walk, Flow, Fold, Node, PathSegment, Visit, Walk};
pub use tree::{
    ArrayBuilder, ClaimKey, Disclosable, DisclosableArray, DisclosableObject, DisclosableValue,
    DisclosureTag, MinimumDigests, ObjectBuilder, SdArray, SdArrayBuilder, SdElement, SdObject,
    SdObjectBuilder, RESERVED_CLAIM_NAMES,
};
