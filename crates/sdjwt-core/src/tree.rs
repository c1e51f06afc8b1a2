//! # Disclosure Tree: Data Model
//!
//! A disclosure tree describes a claim set together with, for every node,
//! whether that node is revealed through its own disclosure or emitted
//! as-is. It is generic over the key type `K` of keyed containers, the leaf
//! type `A`, and an optional container annotation `M` (unit for value
//! trees; definitions use it to attach metadata to objects and arrays).
//!
//! ## Shapes and Tags
//!
//! Every element is exactly one of:
//!
//! - [`Disclosable::Always`]: the whole node becomes one commitment.
//! - [`Disclosable::Never`]: the node is emitted in place; its children
//!   carry their own tags.
//!
//! wrapping exactly one of the three shapes in [`DisclosableValue`]:
//! a leaf, a keyed container ([`DisclosableObject`]) or a positional
//! container ([`DisclosableArray`]). Tags are per-node, never inherited.
//!
//! ## Invariants
//!
//! - Containers are only produced by [`ObjectBuilder`] / [`ArrayBuilder`],
//!   which reject duplicate keys, reserved claim names, and zero
//!   minimum-digest hints.
//! - Trees are immutable once built.
//! - Dropping, cloning and comparing a tree never recurse; arbitrarily deep
//!   trees are handled through explicit work lists. `Debug` output is the
//!   exception and recurses with depth.

use std::fmt;
use std::mem;

use serde_json::Value;

use crate::error::TreeError;

/// Claim names the wire format reserves for digest lists, the algorithm
/// declaration and array wrappers.
pub const RESERVED_CLAIM_NAMES: [&str; 3] = ["_sd", "_sd_alg", "..."];

/// A key usable in a keyed container.
///
/// Keys that would be confused with wire-format markers report themselves
/// through [`ClaimKey::is_reserved`] and are rejected at build time.
pub trait ClaimKey: Clone + Eq + fmt::Debug {
    /// Whether this key collides with a reserved claim name.
    fn is_reserved(&self) -> bool {
        false
    }
}

impl ClaimKey for String {
    fn is_reserved(&self) -> bool {
        RESERVED_CLAIM_NAMES.contains(&self.as_str())
    }
}

/// Selective-disclosure tag carried by every element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisclosureTag {
    /// Revealed only through its own disclosure.
    Always,
    /// Emitted as-is.
    Never,
}

/// Lower bound on the number of digests a container renders.
///
/// Shortfalls are made up with decoy digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MinimumDigests(u32);

impl MinimumDigests {
    /// Create a hint. Zero is rejected; use `None` for "no minimum".
    pub fn new(value: u32) -> Result<Self, TreeError> {
        if value == 0 {
            return Err(TreeError::InvalidMinimumDigests(value));
        }
        Ok(Self(value))
    }

    /// The minimum as a count.
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for MinimumDigests {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node together with its disclosure tag.
#[derive(Debug)]
pub enum Disclosable<K, A, M = ()> {
    /// The node is hidden behind a single disclosure.
    Always(DisclosableValue<K, A, M>),
    /// The node is rendered in place.
    Never(DisclosableValue<K, A, M>),
}

impl<K, A, M> Disclosable<K, A, M> {
    /// Wrap `value` with `tag`.
    pub fn tagged(tag: DisclosureTag, value: DisclosableValue<K, A, M>) -> Self {
        match tag {
            DisclosureTag::Always => Self::Always(value),
            DisclosureTag::Never => Self::Never(value),
        }
    }

    /// The tag of this element.
    pub fn tag(&self) -> DisclosureTag {
        match self {
            Self::Always(_) => DisclosureTag::Always,
            Self::Never(_) => DisclosureTag::Never,
        }
    }

    /// The wrapped node.
    pub fn value(&self) -> &DisclosableValue<K, A, M> {
        match self {
            Self::Always(v) | Self::Never(v) => v,
        }
    }

    /// Consume the element, returning the wrapped node.
    pub fn into_value(self) -> DisclosableValue<K, A, M> {
        match self {
            Self::Always(v) | Self::Never(v) => v,
        }
    }
}

/// One of the three node shapes.
#[derive(Debug)]
pub enum DisclosableValue<K, A, M = ()> {
    /// A leaf value.
    Leaf(A),
    /// A keyed container.
    Object(DisclosableObject<K, A, M>),
    /// A positional container.
    Array(DisclosableArray<K, A, M>),
}

impl<K, A, M> From<DisclosableObject<K, A, M>> for DisclosableValue<K, A, M> {
    fn from(object: DisclosableObject<K, A, M>) -> Self {
        Self::Object(object)
    }
}

impl<K, A, M> From<DisclosableArray<K, A, M>> for DisclosableValue<K, A, M> {
    fn from(array: DisclosableArray<K, A, M>) -> Self {
        Self::Array(array)
    }
}

/// A keyed container with entries in insertion order.
#[derive(Debug)]
pub struct DisclosableObject<K, A, M = ()> {
    entries: Vec<(K, Disclosable<K, A, M>)>,
    minimum_digests: Option<MinimumDigests>,
    metadata: M,
}

impl<K, A, M> DisclosableObject<K, A, M> {
    /// Entries in insertion order.
    pub fn entries(&self) -> &[(K, Disclosable<K, A, M>)] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the object has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// This container's own minimum-digests hint, if any.
    pub fn minimum_digests(&self) -> Option<MinimumDigests> {
        self.minimum_digests
    }

    /// Container annotation.
    pub fn metadata(&self) -> &M {
        &self.metadata
    }
}

impl<K: PartialEq, A, M> DisclosableObject<K, A, M> {
    /// Look up an entry by key.
    pub fn get(&self, key: &K) -> Option<&Disclosable<K, A, M>> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

impl<A, M> DisclosableObject<String, A, M> {
    /// Look up an entry by claim name.
    pub fn get_claim(&self, name: &str) -> Option<&Disclosable<String, A, M>> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }
}

/// A positional container.
#[derive(Debug)]
pub struct DisclosableArray<K, A, M = ()> {
    elements: Vec<Disclosable<K, A, M>>,
    minimum_digests: Option<MinimumDigests>,
    metadata: M,
}

impl<K, A, M> DisclosableArray<K, A, M> {
    /// Elements in order.
    pub fn elements(&self) -> &[Disclosable<K, A, M>] {
        &self.elements
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// This container's own minimum-digests hint, if any.
    pub fn minimum_digests(&self) -> Option<MinimumDigests> {
        self.minimum_digests
    }

    /// Container annotation.
    pub fn metadata(&self) -> &M {
        &self.metadata
    }
}

// ---------------------------------------------------------------------------
// Internal constructors used by the traversal engine
// ---------------------------------------------------------------------------

impl<K, A, M> DisclosableObject<K, A, M> {
    /// Assemble an object whose entries were already validated (e.g. when
    /// mapping an existing object).
    pub(crate) fn from_validated(
        entries: Vec<(K, Disclosable<K, A, M>)>,
        minimum_digests: Option<MinimumDigests>,
        metadata: M,
    ) -> Self {
        Self {
            entries,
            minimum_digests,
            metadata,
        }
    }
}

impl<K, A, M> DisclosableArray<K, A, M> {
    pub(crate) fn from_validated(
        elements: Vec<Disclosable<K, A, M>>,
        minimum_digests: Option<MinimumDigests>,
        metadata: M,
    ) -> Self {
        Self {
            elements,
            minimum_digests,
            metadata,
        }
    }
}

// ---------------------------------------------------------------------------
// Non-recursive drop
// ---------------------------------------------------------------------------

/// Release nested containers through a work list so the drop of a deep
/// tree does not grow the call stack with its depth.
fn release<K, A, M>(mut pending: Vec<Disclosable<K, A, M>>) {
    while let Some(element) = pending.pop() {
        match element.into_value() {
            DisclosableValue::Leaf(_) => {}
            DisclosableValue::Object(mut object) => {
                pending.extend(mem::take(&mut object.entries).into_iter().map(|(_, v)| v));
            }
            DisclosableValue::Array(mut array) => {
                pending.extend(mem::take(&mut array.elements));
            }
        }
    }
}

impl<K, A, M> Drop for DisclosableObject<K, A, M> {
    fn drop(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        release(mem::take(&mut self.entries).into_iter().map(|(_, v)| v).collect());
    }
}

impl<K, A, M> Drop for DisclosableArray<K, A, M> {
    fn drop(&mut self) {
        if self.elements.is_empty() {
            return;
        }
        release(mem::take(&mut self.elements));
    }
}

// ---------------------------------------------------------------------------
// Non-recursive clone and equality
// ---------------------------------------------------------------------------

impl<K: Clone, A: Clone, M: Clone> Clone for DisclosableObject<K, A, M> {
    fn clone(&self) -> Self {
        self.map(A::clone)
    }
}

impl<K: Clone, A: Clone, M: Clone> Clone for DisclosableArray<K, A, M> {
    fn clone(&self) -> Self {
        self.map(A::clone)
    }
}

impl<K: Clone, A: Clone, M: Clone> Clone for DisclosableValue<K, A, M> {
    fn clone(&self) -> Self {
        match self {
            Self::Leaf(a) => Self::Leaf(a.clone()),
            Self::Object(o) => Self::Object(o.clone()),
            Self::Array(a) => Self::Array(a.clone()),
        }
    }
}

impl<K: Clone, A: Clone, M: Clone> Clone for Disclosable<K, A, M> {
    fn clone(&self) -> Self {
        Self::tagged(self.tag(), self.value().clone())
    }
}

type Pending<'t, K, A, M> = Vec<(&'t DisclosableValue<K, A, M>, &'t DisclosableValue<K, A, M>)>;

/// Compare the headers of two objects, queueing their entry values.
fn objects_match<'t, K: PartialEq, A, M: PartialEq>(
    left: &'t DisclosableObject<K, A, M>,
    right: &'t DisclosableObject<K, A, M>,
    pending: &mut Pending<'t, K, A, M>,
) -> bool {
    if left.minimum_digests != right.minimum_digests
        || left.metadata != right.metadata
        || left.entries.len() != right.entries.len()
    {
        return false;
    }
    for ((lk, l), (rk, r)) in left.entries.iter().zip(&right.entries) {
        if lk != rk || l.tag() != r.tag() {
            return false;
        }
        pending.push((l.value(), r.value()));
    }
    true
}

/// Compare the headers of two arrays, queueing their element values.
fn arrays_match<'t, K, A, M: PartialEq>(
    left: &'t DisclosableArray<K, A, M>,
    right: &'t DisclosableArray<K, A, M>,
    pending: &mut Pending<'t, K, A, M>,
) -> bool {
    if left.minimum_digests != right.minimum_digests
        || left.metadata != right.metadata
        || left.elements.len() != right.elements.len()
    {
        return false;
    }
    for (l, r) in left.elements.iter().zip(&right.elements) {
        if l.tag() != r.tag() {
            return false;
        }
        pending.push((l.value(), r.value()));
    }
    true
}

fn all_match<K: PartialEq, A: PartialEq, M: PartialEq>(mut pending: Pending<'_, K, A, M>) -> bool {
    while let Some(pair) = pending.pop() {
        let matched = match pair {
            (DisclosableValue::Leaf(l), DisclosableValue::Leaf(r)) => l == r,
            (DisclosableValue::Object(l), DisclosableValue::Object(r)) => {
                objects_match(l, r, &mut pending)
            }
            (DisclosableValue::Array(l), DisclosableValue::Array(r)) => {
                arrays_match(l, r, &mut pending)
            }
            _ => false,
        };
        if !matched {
            return false;
        }
    }
    true
}

impl<K: PartialEq, A: PartialEq, M: PartialEq> PartialEq for DisclosableObject<K, A, M> {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = Vec::new();
        objects_match(self, other, &mut pending) && all_match(pending)
    }
}

impl<K: PartialEq, A: PartialEq, M: PartialEq> PartialEq for DisclosableArray<K, A, M> {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = Vec::new();
        arrays_match(self, other, &mut pending) && all_match(pending)
    }
}

impl<K: PartialEq, A: PartialEq, M: PartialEq> PartialEq for DisclosableValue<K, A, M> {
    fn eq(&self, other: &Self) -> bool {
        all_match(vec![(self, other)])
    }
}

impl<K: PartialEq, A: PartialEq, M: PartialEq> PartialEq for Disclosable<K, A, M> {
    fn eq(&self, other: &Self) -> bool {
        self.tag() == other.tag() && self.value() == other.value()
    }
}

impl<K: Eq, A: Eq, M: Eq> Eq for DisclosableObject<K, A, M> {}
impl<K: Eq, A: Eq, M: Eq> Eq for DisclosableArray<K, A, M> {}
impl<K: Eq, A: Eq, M: Eq> Eq for DisclosableValue<K, A, M> {}
impl<K: Eq, A: Eq, M: Eq> Eq for Disclosable<K, A, M> {}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Accumulates entries into a [`DisclosableObject`].
///
/// Violations are reported by [`ObjectBuilder::build`]; nothing is coerced.
#[derive(Debug, Clone)]
pub struct ObjectBuilder<K, A, M = ()> {
    entries: Vec<(K, Disclosable<K, A, M>)>,
    minimum_digests: Option<u32>,
    metadata: M,
}

impl<K: ClaimKey, A, M: Default> ObjectBuilder<K, A, M> {
    /// Start an empty object with default container metadata.
    pub fn new() -> Self {
        Self::with_metadata(M::default())
    }
}

impl<K: ClaimKey, A, M: Default> Default for ObjectBuilder<K, A, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ClaimKey, A, M> ObjectBuilder<K, A, M> {
    /// Start an empty object annotated with `metadata`.
    pub fn with_metadata(metadata: M) -> Self {
        Self {
            entries: Vec::new(),
            minimum_digests: None,
            metadata,
        }
    }

    /// Add a tagged element.
    pub fn element(mut self, key: impl Into<K>, element: Disclosable<K, A, M>) -> Self {
        self.entries.push((key.into(), element));
        self
    }

    /// Add a node that is rendered in place.
    pub fn never(self, key: impl Into<K>, value: impl Into<DisclosableValue<K, A, M>>) -> Self {
        self.element(key, Disclosable::Never(value.into()))
    }

    /// Add a node that is hidden behind its own disclosure.
    pub fn always(self, key: impl Into<K>, value: impl Into<DisclosableValue<K, A, M>>) -> Self {
        self.element(key, Disclosable::Always(value.into()))
    }

    /// Add a plain leaf.
    pub fn claim(self, key: impl Into<K>, value: A) -> Self {
        self.never(key, DisclosableValue::Leaf(value))
    }

    /// Add a selectively disclosable leaf.
    pub fn sd_claim(self, key: impl Into<K>, value: A) -> Self {
        self.always(key, DisclosableValue::Leaf(value))
    }

    /// Set this container's minimum-digests hint.
    pub fn minimum_digests(mut self, minimum: u32) -> Self {
        self.minimum_digests = Some(minimum);
        self
    }

    /// Validate and freeze the object.
    pub fn build(self) -> Result<DisclosableObject<K, A, M>, TreeError> {
        let minimum_digests = self.minimum_digests.map(MinimumDigests::new).transpose()?;
        for (i, (key, _)) in self.entries.iter().enumerate() {
            if key.is_reserved() {
                return Err(TreeError::ReservedClaimName(format!("{key:?}")));
            }
            if self.entries[..i].iter().any(|(k, _)| k == key) {
                return Err(TreeError::DuplicateKey(format!("{key:?}")));
            }
        }
        Ok(DisclosableObject {
            entries: self.entries,
            minimum_digests,
            metadata: self.metadata,
        })
    }
}

/// Accumulates elements into a [`DisclosableArray`].
#[derive(Debug, Clone)]
pub struct ArrayBuilder<K, A, M = ()> {
    elements: Vec<Disclosable<K, A, M>>,
    minimum_digests: Option<u32>,
    metadata: M,
}

impl<K, A, M: Default> ArrayBuilder<K, A, M> {
    /// Start an empty array with default container metadata.
    pub fn new() -> Self {
        Self::with_metadata(M::default())
    }
}

impl<K, A, M: Default> Default for ArrayBuilder<K, A, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, A, M> ArrayBuilder<K, A, M> {
    /// Start an empty array annotated with `metadata`.
    pub fn with_metadata(metadata: M) -> Self {
        Self {
            elements: Vec::new(),
            minimum_digests: None,
            metadata,
        }
    }

    /// Append a tagged element.
    pub fn push(mut self, element: Disclosable<K, A, M>) -> Self {
        self.elements.push(element);
        self
    }

    /// Append a node rendered in place.
    pub fn never(self, value: impl Into<DisclosableValue<K, A, M>>) -> Self {
        self.push(Disclosable::Never(value.into()))
    }

    /// Append a node hidden behind its own disclosure.
    pub fn always(self, value: impl Into<DisclosableValue<K, A, M>>) -> Self {
        self.push(Disclosable::Always(value.into()))
    }

    /// Append a plain leaf.
    pub fn element(self, value: A) -> Self {
        self.never(DisclosableValue::Leaf(value))
    }

    /// Append a selectively disclosable leaf.
    pub fn sd_element(self, value: A) -> Self {
        self.always(DisclosableValue::Leaf(value))
    }

    /// Set this container's minimum-digests hint.
    pub fn minimum_digests(mut self, minimum: u32) -> Self {
        self.minimum_digests = Some(minimum);
        self
    }

    /// Validate and freeze the array.
    pub fn build(self) -> Result<DisclosableArray<K, A, M>, TreeError> {
        let minimum_digests = self.minimum_digests.map(MinimumDigests::new).transpose()?;
        Ok(DisclosableArray {
            elements: self.elements,
            minimum_digests,
            metadata: self.metadata,
        })
    }
}

// ---------------------------------------------------------------------------
// JSON claim trees
// ---------------------------------------------------------------------------

/// An element of a JSON claim tree.
pub type SdElement = Disclosable<String, Value>;
/// A JSON claim object; the root of every issuance.
pub type SdObject = DisclosableObject<String, Value>;
/// A JSON claim array.
pub type SdArray = DisclosableArray<String, Value>;
/// Builder for [`SdObject`].
pub type SdObjectBuilder = ObjectBuilder<String, Value>;
/// Builder for [`SdArray`].
pub type SdArrayBuilder = ArrayBuilder<String, Value>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_object_preserves_order_and_tags() {
        let obj = SdObjectBuilder::new()
            .claim("iss", json!("https://issuer.example"))
            .sd_claim("given_name", json!("Erika"))
            .build()
            .unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj.entries()[0].0, "iss");
        assert_eq!(obj.entries()[0].1.tag(), DisclosureTag::Never);
        assert_eq!(obj.entries()[1].1.tag(), DisclosureTag::Always);
        assert_eq!(
            obj.get_claim("given_name").map(|e| e.value()),
            Some(&DisclosableValue::Leaf(json!("Erika")))
        );
    }

    #[test]
    fn test_equality_covers_tags_hints_and_leaves() {
        let build = |tagged_always: bool, hint: Option<u32>, leaf: i64| {
            let inner = SdArrayBuilder::new().element(json!(leaf)).build().unwrap();
            let mut builder = SdObjectBuilder::new();
            builder = if tagged_always {
                builder.always("list", inner)
            } else {
                builder.never("list", inner)
            };
            if let Some(hint) = hint {
                builder = builder.minimum_digests(hint);
            }
            builder.build().unwrap()
        };
        let tree = build(true, Some(2), 1);
        assert!(tree == tree.clone());
        assert!(tree != build(false, Some(2), 1));
        assert!(tree != build(true, None, 1));
        assert!(tree != build(true, Some(2), 2));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let err = SdObjectBuilder::new()
            .claim("a", json!(1))
            .sd_claim("a", json!(2))
            .build()
            .unwrap_err();
        assert!(matches!(err, TreeError::DuplicateKey(_)));
    }

    #[test]
    fn test_reserved_names_rejected() {
        for name in RESERVED_CLAIM_NAMES {
            let err = SdObjectBuilder::new()
                .claim(name, json!(1))
                .build()
                .unwrap_err();
            assert!(matches!(err, TreeError::ReservedClaimName(_)), "{name}");
        }
    }

    #[test]
    fn test_zero_minimum_digests_rejected() {
        let err = SdArrayBuilder::new()
            .element(json!(1))
            .minimum_digests(0)
            .build()
            .unwrap_err();
        assert_eq!(err, TreeError::InvalidMinimumDigests(0));
        assert!(MinimumDigests::new(3).is_ok());
    }

    #[test]
    fn test_nested_always_inside_never() {
        let address = SdObjectBuilder::new()
            .sd_claim("locality", json!("Schulpforta"))
            .claim("country", json!("DE"))
            .minimum_digests(4)
            .build()
            .unwrap();
        let obj = SdObjectBuilder::new().never("address", address).build().unwrap();
        let DisclosableValue::Object(inner) = obj.entries()[0].1.value() else {
            panic!("expected object");
        };
        assert_eq!(inner.minimum_digests().map(MinimumDigests::get), Some(4));
        assert_eq!(inner.entries()[0].1.tag(), DisclosureTag::Always);
    }

    #[test]
    fn test_tagged_round_trip() {
        let el: SdElement = Disclosable::tagged(DisclosureTag::Always, DisclosableValue::Leaf(json!(1)));
        assert_eq!(el.tag(), DisclosureTag::Always);
        assert_eq!(el.into_value(), DisclosableValue::Leaf(json!(1)));
    }
}
