//! # Digest and Disclosure Generation
//!
//! Turns a disclosure tree into a signable payload plus the flat list of
//! disclosures that reveal its hidden nodes. The work is one post-order
//! [`fold`] over the tree:
//!
//! - A `Never` leaf is emitted unchanged.
//! - A `Never` object emits its `Never` members, and collects the digests of
//!   its `Always` members into `_sd`, padded with decoys up to the resolved
//!   minimum and sorted so decoys sit among real digests.
//! - A `Never` array replaces each `Always` element in place with
//!   `{"...": digest}` and appends decoy wrappers up to the resolved minimum.
//! - Any `Always` node is rendered as above first, then wrapped in a fresh
//!   disclosure whose digest is all its parent sees.
//! - The root additionally declares the algorithm under `_sd_alg`.
//!
//! The minimum for a container is its own hint, else the factory fallback,
//! else none.
//!
//! Every node reports how deeply its rendering nests and how deeply its
//! revealed claims nest. Generation stops with [`IssuanceError::TooDeep`]
//! at the first node where either exceeds [`MAX_NESTING_DEPTH`], so a
//! successful issuance always decodes again and no deep value is built.

use serde_json::{Map, Value};
use tracing::debug;

use sdjwt_core::{
    fold, DisclosableArray, DisclosableObject, Fold, MinimumDigests, PathSegment, SdObject,
    Visit,
};
use sdjwt_crypto::{
    nesting_depth, DecoyGenerator, Disclosure, DisclosureDigest, HashAlgorithm,
    RandomDecoyGenerator, RandomSaltProvider, SaltProvider, FORBIDDEN_DISCLOSURE_NAMES,
    MAX_NESTING_DEPTH,
};

use crate::config::IssuanceConfig;
use crate::error::IssuanceError;
use crate::sdjwt::{PayloadSigner, SdJwt};

/// Claim under which the root declares the hash algorithm.
pub const SD_ALG_CLAIM: &str = "_sd_alg";
/// Claim holding an object's digest list.
pub const SD_CLAIM: &str = "_sd";
/// Key of an array element wrapper.
pub const ARRAY_DIGEST_KEY: &str = "...";

/// A payload and its disclosures, before signing.
#[derive(Debug, Clone, PartialEq)]
pub struct UnsignedSdJwt {
    /// The signable claim set.
    pub payload: Map<String, Value>,
    /// Every disclosure, in generation order.
    pub disclosures: Vec<Disclosure>,
}

/// Issues selective-disclosure payloads.
///
/// Salt and decoy sources are passed in explicitly; the defaults draw from
/// the operating system's CSPRNG.
#[derive(Debug, Clone)]
pub struct SdJwtFactory<S = RandomSaltProvider, D = RandomDecoyGenerator> {
    hash_algorithm: HashAlgorithm,
    fallback_minimum_digests: Option<MinimumDigests>,
    salts: S,
    decoys: D,
}

impl SdJwtFactory {
    /// A factory with SHA-256, no fallback minimum, and random providers.
    pub fn new() -> Self {
        Self {
            hash_algorithm: HashAlgorithm::default(),
            fallback_minimum_digests: None,
            salts: RandomSaltProvider::default(),
            decoys: RandomDecoyGenerator,
        }
    }

    /// A factory with random providers set up from `config`.
    pub fn from_config(config: &IssuanceConfig) -> Result<Self, IssuanceError> {
        config.validate()?;
        Ok(Self {
            hash_algorithm: config.hash_algorithm,
            fallback_minimum_digests: config.fallback_minimum()?,
            salts: RandomSaltProvider::new(config.salt_length),
            decoys: RandomDecoyGenerator,
        })
    }
}

impl Default for SdJwtFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, D> SdJwtFactory<S, D> {
    /// Replace the salt source.
    pub fn with_salt_provider<S2: SaltProvider>(self, salts: S2) -> SdJwtFactory<S2, D> {
        SdJwtFactory {
            hash_algorithm: self.hash_algorithm,
            fallback_minimum_digests: self.fallback_minimum_digests,
            salts,
            decoys: self.decoys,
        }
    }

    /// Replace the decoy source.
    pub fn with_decoy_generator<D2: DecoyGenerator>(self, decoys: D2) -> SdJwtFactory<S, D2> {
        SdJwtFactory {
            hash_algorithm: self.hash_algorithm,
            fallback_minimum_digests: self.fallback_minimum_digests,
            salts: self.salts,
            decoys,
        }
    }

    /// Use `algorithm` for every digest.
    pub fn with_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }

    /// Minimum digests for containers without their own hint.
    pub fn with_fallback_minimum_digests(mut self, minimum: MinimumDigests) -> Self {
        self.fallback_minimum_digests = Some(minimum);
        self
    }

    /// The configured algorithm.
    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash_algorithm
    }
}

impl<S: SaltProvider, D: DecoyGenerator> SdJwtFactory<S, D> {
    /// Render `claims` into a payload and its disclosures.
    pub fn generate(&self, claims: &SdObject) -> Result<UnsignedSdJwt, IssuanceError> {
        let mut folder = Generator {
            factory: self,
            disclosures: Vec::new(),
        };
        let payload = match fold(claims, &mut folder)?.emitted {
            Emitted::Plain(Value::Object(payload), _) => payload,
            _ => return Err(IssuanceError::ConcealedRoot),
        };
        debug!(
            alg = %self.hash_algorithm,
            disclosures = folder.disclosures.len(),
            "generated selective disclosure payload"
        );
        Ok(UnsignedSdJwt {
            payload,
            disclosures: folder.disclosures,
        })
    }

    /// Generate and sign.
    pub fn issue<P: PayloadSigner>(
        &self,
        claims: &SdObject,
        signer: &P,
    ) -> Result<SdJwt<P::Token>, IssuanceError> {
        let unsigned = self.generate(claims)?;
        let token = signer
            .sign(&unsigned.payload)
            .map_err(|e| IssuanceError::Signing(Box::new(e)))?;
        Ok(SdJwt::new(
            token,
            Value::Object(unsigned.payload),
            unsigned.disclosures,
        ))
    }
}

/// What a node contributes to its parent.
struct Rendered {
    emitted: Emitted,
    /// Nesting of the node once all of its disclosures are revealed.
    claim_depth: usize,
}

enum Emitted {
    /// Emitted in place, with the nesting of the emitted JSON.
    Plain(Value, usize),
    /// Concealed behind a disclosure.
    Digest(DisclosureDigest),
}

struct Generator<'f, S, D> {
    factory: &'f SdJwtFactory<S, D>,
    disclosures: Vec<Disclosure>,
}

impl<S: SaltProvider, D: DecoyGenerator> Generator<'_, S, D> {
    /// Refuse a node whose rendering nests `depth` levels, or whose claims
    /// nest `claim_depth` levels, once either passes the limit. A disclosure
    /// wraps its value in one more array.
    fn bound(
        &self,
        visit: &Visit<'_, '_, String>,
        depth: usize,
        claim_depth: usize,
    ) -> Result<(), IssuanceError> {
        let document = depth + usize::from(visit.is_always());
        let deepest = document.max(claim_depth);
        if deepest > MAX_NESTING_DEPTH {
            return Err(IssuanceError::TooDeep {
                path: location(visit),
                depth: deepest,
                limit: MAX_NESTING_DEPTH,
            });
        }
        Ok(())
    }

    /// Wrap a rendered value in a disclosure if its node is `Always`.
    fn conceal(
        &mut self,
        visit: &Visit<'_, '_, String>,
        rendered: Value,
        depth: usize,
        claim_depth: usize,
    ) -> Result<Rendered, IssuanceError> {
        if !visit.is_always() {
            return Ok(Rendered {
                emitted: Emitted::Plain(rendered, depth),
                claim_depth,
            });
        }
        let salt = self.factory.salts.salt();
        let disclosure = match visit.position() {
            Some(PathSegment::Key(name)) => Disclosure::object_property(salt, name.as_str(), rendered)?,
            Some(PathSegment::Index(_)) => Disclosure::array_element(salt, rendered)?,
            None => return Err(IssuanceError::ConcealedRoot),
        };
        let digest = disclosure.digest(self.factory.hash_algorithm);
        self.disclosures.push(disclosure);
        Ok(Rendered {
            emitted: Emitted::Digest(digest),
            claim_depth,
        })
    }

    fn resolve_minimum(&self, own: Option<MinimumDigests>) -> usize {
        own.or(self.factory.fallback_minimum_digests)
            .map_or(0, MinimumDigests::get)
    }

    fn decoy(&self) -> DisclosureDigest {
        self.factory.decoys.decoy(self.factory.hash_algorithm)
    }
}

impl<S: SaltProvider, D: DecoyGenerator> Fold<String, Value> for Generator<'_, S, D> {
    type Output = Result<Rendered, IssuanceError>;

    fn leaf(&mut self, visit: &Visit<'_, '_, String>, value: &Value) -> Self::Output {
        let depth = nesting_depth(value);
        self.bound(visit, depth, depth)?;
        if let Some(key) = find_reserved_key(value) {
            return Err(IssuanceError::ReservedKeyInValue {
                path: location(visit),
                key: key.to_string(),
            });
        }
        self.conceal(visit, value.clone(), depth, depth)
    }

    fn object(
        &mut self,
        visit: &Visit<'_, '_, String>,
        object: &DisclosableObject<String, Value>,
        children: Vec<Self::Output>,
    ) -> Self::Output {
        let mut rendered = Map::new();
        let mut digests = Vec::new();
        let (mut depth, mut claim_depth) = (0, 0);
        for ((key, _), child) in object.entries().iter().zip(children) {
            let child = child?;
            claim_depth = claim_depth.max(child.claim_depth);
            match child.emitted {
                Emitted::Plain(value, nested) => {
                    depth = depth.max(nested);
                    rendered.insert(key.clone(), value);
                }
                Emitted::Digest(digest) => digests.push(digest),
            }
        }

        let minimum = self.resolve_minimum(object.minimum_digests());
        while digests.len() < minimum {
            digests.push(self.decoy());
        }
        digests.sort();
        if !digests.is_empty() {
            depth = depth.max(1);
            let list = digests
                .into_iter()
                .map(|d| Value::String(d.into_string()))
                .collect();
            rendered.insert(SD_CLAIM.to_string(), Value::Array(list));
        }

        if visit.tag().is_none() {
            rendered.insert(
                SD_ALG_CLAIM.to_string(),
                Value::String(self.factory.hash_algorithm.as_str().to_string()),
            );
        }
        self.bound(visit, depth + 1, claim_depth + 1)?;
        self.conceal(visit, Value::Object(rendered), depth + 1, claim_depth + 1)
    }

    fn array(
        &mut self,
        visit: &Visit<'_, '_, String>,
        array: &DisclosableArray<String, Value>,
        children: Vec<Self::Output>,
    ) -> Self::Output {
        let mut rendered = Vec::with_capacity(array.len());
        let mut digest_count = 0usize;
        let (mut depth, mut claim_depth) = (0, 0);
        for child in children {
            let child = child?;
            claim_depth = claim_depth.max(child.claim_depth);
            match child.emitted {
                Emitted::Plain(value, nested) => {
                    depth = depth.max(nested);
                    rendered.push(value);
                }
                Emitted::Digest(digest) => {
                    digest_count += 1;
                    rendered.push(array_wrapper(digest));
                }
            }
        }

        let minimum = self.resolve_minimum(array.minimum_digests());
        while digest_count < minimum {
            rendered.push(array_wrapper(self.decoy()));
            digest_count += 1;
        }
        if digest_count > 0 {
            depth = depth.max(1);
        }
        self.bound(visit, depth + 1, claim_depth + 1)?;
        self.conceal(visit, Value::Array(rendered), depth + 1, claim_depth + 1)
    }
}

fn location(visit: &Visit<'_, '_, String>) -> String {
    visit.claim_path().map(|p| p.to_string()).unwrap_or_default()
}

fn array_wrapper(digest: DisclosureDigest) -> Value {
    let mut wrapper = Map::new();
    wrapper.insert(ARRAY_DIGEST_KEY.to_string(), Value::String(digest.into_string()));
    Value::Object(wrapper)
}

/// First reserved key found anywhere inside `value`.
fn find_reserved_key(value: &Value) -> Option<&str> {
    let mut pending = vec![value];
    while let Some(value) = pending.pop() {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    if FORBIDDEN_DISCLOSURE_NAMES.contains(&key.as_str()) {
                        return Some(key);
                    }
                    pending.push(child);
                }
            }
            Value::Array(items) => pending.extend(items),
            _ => {}
        }
    }
    None
}
