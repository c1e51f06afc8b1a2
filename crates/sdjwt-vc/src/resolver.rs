//! # Type Metadata Resolution
//!
//! Obtaining type metadata is a collaborator concern: a resolver maps a
//! credential type identifier to its metadata, from wherever it lives.
//! [`InMemoryResolver`] serves preloaded metadata.
//!
//! [`resolve_type_metadata`] additionally follows `extends`: the returned
//! metadata carries every claim of every ancestor type, with declarations
//! of a more specific type replacing those of a more general one at the
//! same path.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::ResolutionError;
use crate::metadata::TypeMetadata;

/// Looks up the metadata of a credential type.
pub trait TypeMetadataResolver: Send + Sync {
    /// Metadata declared for `vct`, without following `extends`.
    fn resolve(&self, vct: &str) -> Result<TypeMetadata, ResolutionError>;
}

impl<R: TypeMetadataResolver + ?Sized> TypeMetadataResolver for &R {
    fn resolve(&self, vct: &str) -> Result<TypeMetadata, ResolutionError> {
        (**self).resolve(vct)
    }
}

/// A resolver over a fixed set of metadata documents.
#[derive(Debug, Clone, Default)]
pub struct InMemoryResolver {
    types: HashMap<String, TypeMetadata>,
}

impl InMemoryResolver {
    /// An empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `metadata` under its own `vct`, replacing any earlier entry.
    pub fn insert(&mut self, metadata: TypeMetadata) {
        self.types.insert(metadata.vct.clone(), metadata);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, metadata: TypeMetadata) -> Self {
        self.insert(metadata);
        self
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no types are registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl FromIterator<TypeMetadata> for InMemoryResolver {
    fn from_iter<I: IntoIterator<Item = TypeMetadata>>(iter: I) -> Self {
        let mut resolver = Self::new();
        for metadata in iter {
            resolver.insert(metadata);
        }
        resolver
    }
}

impl TypeMetadataResolver for InMemoryResolver {
    fn resolve(&self, vct: &str) -> Result<TypeMetadata, ResolutionError> {
        self.types
            .get(vct)
            .cloned()
            .ok_or_else(|| ResolutionError::UnknownType(vct.to_string()))
    }
}

/// Resolve `vct` and merge in everything it extends.
pub fn resolve_type_metadata<R: TypeMetadataResolver + ?Sized>(
    resolver: &R,
    vct: &str,
) -> Result<TypeMetadata, ResolutionError> {
    let mut chain = vec![resolver.resolve(vct)?];
    let mut seen = HashSet::from([vct.to_string()]);
    while let Some(parent) = chain.last().and_then(|m| m.extends.clone()) {
        if !seen.insert(parent.clone()) {
            return Err(ResolutionError::ExtendsCycle(parent));
        }
        chain.push(resolver.resolve(&parent)?);
    }
    debug!(vct, depth = chain.len(), "resolved type metadata");

    // Most specific first.
    let mut chain = chain.into_iter();
    let Some(mut merged) = chain.next() else {
        return Err(ResolutionError::UnknownType(vct.to_string()));
    };
    for ancestor in chain {
        merged.name = merged.name.or(ancestor.name);
        merged.description = merged.description.or(ancestor.description);
        if merged.display.is_empty() {
            merged.display = ancestor.display;
        }
        let mut claims: Vec<_> = ancestor
            .claims
            .into_iter()
            .filter(|c| !merged.claims.iter().any(|own| own.path == c.path))
            .collect();
        claims.append(&mut merged.claims);
        merged.claims = claims;
    }
    Ok(merged)
}
