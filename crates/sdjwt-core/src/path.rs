//! # Claim Paths
//!
//! A [`ClaimPath`] addresses a node of a reconstructed claim tree: a
//! non-empty sequence of claim names, array indices and the "all elements"
//! wildcard. Paths are used in presentation requests, in per-claim
//! disclosure maps, and inside credential type metadata.
//!
//! ## Wire Form
//!
//! Serialized as a JSON array whose items are a string (claim name), a
//! non-negative integer (array index) or `null` (all elements), e.g.
//! `["degrees", null, "type"]`.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::TreeError;
use crate::traversal::PathSegment;

/// One step of a claim path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClaimPathElement {
    /// A named object property.
    Claim(String),
    /// The array element at an index.
    ArrayElement(usize),
    /// Every element of an array.
    AllArrayElements,
}

impl ClaimPathElement {
    /// Whether this element addresses an array position.
    pub fn is_positional(&self) -> bool {
        matches!(self, Self::ArrayElement(_) | Self::AllArrayElements)
    }

    /// Whether `self`, used as a pattern, selects `other`.
    pub fn matches(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::AllArrayElements, Self::ArrayElement(_) | Self::AllArrayElements) => true,
            (a, b) => a == b,
        }
    }
}

/// Structured address of a claim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClaimPath(Vec<ClaimPathElement>);

impl ClaimPath {
    /// Build a path from its elements. Empty paths are rejected.
    pub fn new(elements: Vec<ClaimPathElement>) -> Result<Self, TreeError> {
        if elements.is_empty() {
            return Err(TreeError::EmptyClaimPath);
        }
        Ok(Self(elements))
    }

    /// A path addressing a top-level claim.
    pub fn claim(name: impl Into<String>) -> Self {
        Self(vec![ClaimPathElement::Claim(name.into())])
    }

    /// Extend with a claim name.
    pub fn child(&self, name: impl Into<String>) -> Self {
        self.push(ClaimPathElement::Claim(name.into()))
    }

    /// Extend with an array index.
    pub fn element(&self, index: usize) -> Self {
        self.push(ClaimPathElement::ArrayElement(index))
    }

    /// Extend with the all-elements wildcard.
    pub fn all_elements(&self) -> Self {
        self.push(ClaimPathElement::AllArrayElements)
    }

    /// Extend with an arbitrary element.
    pub fn push(&self, element: ClaimPathElement) -> Self {
        let mut elements = self.0.clone();
        elements.push(element);
        Self(elements)
    }

    /// The path elements, outermost first.
    pub fn elements(&self) -> &[ClaimPathElement] {
        &self.0
    }

    /// Number of elements; always at least one.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; paths are non-empty by construction.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The outermost element.
    pub fn head(&self) -> &ClaimPathElement {
        &self.0[0]
    }

    /// The innermost element.
    pub fn last(&self) -> &ClaimPathElement {
        &self.0[self.0.len() - 1]
    }

    /// The enclosing path, or `None` for a top-level claim.
    pub fn parent(&self) -> Option<ClaimPath> {
        if self.0.len() > 1 {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        } else {
            None
        }
    }

    /// Every prefix of this path, outermost first, ending with the path
    /// itself.
    pub fn ancestors_inclusive(&self) -> impl Iterator<Item = ClaimPath> + '_ {
        (1..=self.0.len()).map(move |n| Self(self.0[..n].to_vec()))
    }

    /// Whether `prefix` is a (not necessarily strict) prefix of this path.
    pub fn starts_with(&self, prefix: &ClaimPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Whether the path contains the all-elements wildcard.
    pub fn has_wildcard(&self) -> bool {
        self.0.contains(&ClaimPathElement::AllArrayElements)
    }

    /// Whether `self`, used as a pattern, selects the concrete path `other`.
    pub fn matches(&self, other: &ClaimPath) -> bool {
        self.0.len() == other.0.len() && self.0.iter().zip(&other.0).all(|(p, o)| p.matches(o))
    }

    /// Convert a traversal path into a claim path; `None` at the root.
    pub fn from_segments(segments: &[PathSegment<'_, String>]) -> Option<ClaimPath> {
        if segments.is_empty() {
            return None;
        }
        Some(Self(
            segments
                .iter()
                .map(|s| match s {
                    PathSegment::Key(k) => ClaimPathElement::Claim((*k).clone()),
                    PathSegment::Index(i) => ClaimPathElement::ArrayElement(*i),
                })
                .collect(),
        ))
    }
}

impl fmt::Display for ClaimPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, element) in self.0.iter().enumerate() {
            match element {
                ClaimPathElement::Claim(name) if i == 0 => f.write_str(name)?,
                ClaimPathElement::Claim(name) => write!(f, ".{name}")?,
                ClaimPathElement::ArrayElement(index) => write!(f, "[{index}]")?,
                ClaimPathElement::AllArrayElements => f.write_str("[*]")?,
            }
        }
        Ok(())
    }
}

impl Serialize for ClaimPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let items: Vec<Value> = self
            .0
            .iter()
            .map(|e| match e {
                ClaimPathElement::Claim(name) => Value::String(name.clone()),
                ClaimPathElement::ArrayElement(index) => Value::from(*index as u64),
                ClaimPathElement::AllArrayElements => Value::Null,
            })
            .collect();
        items.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ClaimPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<Value>::deserialize(deserializer)?;
        let elements = items
            .into_iter()
            .map(|item| match item {
                Value::String(name) => Ok(ClaimPathElement::Claim(name)),
                Value::Null => Ok(ClaimPathElement::AllArrayElements),
                Value::Number(n) => n
                    .as_u64()
                    .and_then(|i| usize::try_from(i).ok())
                    .map(ClaimPathElement::ArrayElement)
                    .ok_or_else(|| D::Error::custom(format!("invalid array index {n}"))),
                other => Err(D::Error::custom(format!("invalid claim path element {other}"))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        ClaimPath::new(elements).map_err(D::Error::custom)
    }
}
