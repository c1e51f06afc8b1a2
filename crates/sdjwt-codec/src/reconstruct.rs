//! # Claim Reconstruction and Consistency Checking
//!
//! The inverse of generation: given a payload whose signature has already
//! been checked and the disclosures a holder presented, rebuild the revealed
//! claim set.
//!
//! Every disclosure is indexed by its digest under the payload's declared
//! algorithm (`sha-256` when none is declared). The payload is then walked
//! depth-first: each `_sd` digest with a matching disclosure splices its
//! `(name, value)` into the enclosing object, and each `{"...": digest}`
//! array wrapper with a match is replaced by the disclosed value. Disclosed
//! values are walked in turn, which unwinds recursive disclosures.
//!
//! ## Consistency
//!
//! Every problem found is collected; if there is any, the whole
//! reconstruction fails with a [`ReconstructionError`] listing all of them.
//! A digest without a disclosure is normal for a holder presentation and is
//! only reported under [`UndisclosedDigests::Reject`].
//!
//! The walk uses an explicit frame stack, and every disclosure can be
//! consumed at most once, so hostile inputs cannot loop or exhaust the call
//! stack. Revealed claims nesting deeper than [`MAX_NESTING_DEPTH`] are
//! reported rather than built.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::vec;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use sdjwt_core::ClaimPath;
use sdjwt_crypto::{Disclosure, DisclosureDigest, HashAlgorithm, MAX_NESTING_DEPTH};

use crate::config::{ReconstructionPolicy, UndisclosedDigests};
use crate::error::{DisclosureShape, Inconsistency, ReconstructionError};
use crate::generator::{ARRAY_DIGEST_KEY, SD_ALG_CLAIM, SD_CLAIM};

/// For every claim of a reconstructed claim set, the disclosures needed to
/// reveal it, outermost first.
///
/// A claim that is plain all the way from the root maps to an empty list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisclosuresPerClaimPath {
    paths: BTreeMap<ClaimPath, Vec<Disclosure>>,
}

impl DisclosuresPerClaimPath {
    /// Disclosures needed to reveal the claim at `path`, or `None` if the
    /// reconstructed claim set has no such claim.
    pub fn get(&self, path: &ClaimPath) -> Option<&[Disclosure]> {
        self.paths.get(path).map(Vec::as_slice)
    }

    /// Number of disclosures needed to reveal `path`.
    pub fn disclosure_count(&self, path: &ClaimPath) -> Option<usize> {
        self.paths.get(path).map(Vec::len)
    }

    /// Whether the claim at `path` is revealed by its own disclosure, i.e.
    /// needs strictly more disclosures than its parent.
    pub fn is_selectively_disclosed(&self, path: &ClaimPath) -> bool {
        let own = self.disclosure_count(path).unwrap_or(0);
        let parent = path
            .parent()
            .and_then(|p| self.disclosure_count(&p))
            .unwrap_or(0);
        own > parent
    }

    /// Every concrete path selected by `pattern`.
    pub fn matching<'p>(&'p self, pattern: &'p ClaimPath) -> impl Iterator<Item = &'p ClaimPath> + 'p {
        self.paths.keys().filter(move |p| pattern.matches(p))
    }

    /// All entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&ClaimPath, &[Disclosure])> {
        self.paths.iter().map(|(p, d)| (p, d.as_slice()))
    }

    /// Number of claims.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether no claims were revealed.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// The outcome of a successful reconstruction.
#[derive(Debug, Clone, PartialEq)]
pub struct RecreatedClaims {
    /// The revealed claim set, without `_sd`, `_sd_alg` or unresolved
    /// wrappers.
    pub claims: Map<String, Value>,
    /// Disclosures behind every revealed claim.
    pub disclosures_per_claim: DisclosuresPerClaimPath,
    /// Algorithm the payload declared.
    pub hash_algorithm: HashAlgorithm,
}

/// The algorithm a payload declares, defaulting to `sha-256`.
pub fn payload_hash_algorithm(payload: &Map<String, Value>) -> Result<HashAlgorithm, Inconsistency> {
    match payload.get(SD_ALG_CLAIM) {
        None => Ok(HashAlgorithm::Sha256),
        Some(Value::String(id)) => HashAlgorithm::from_identifier(id)
            .map_err(|_| Inconsistency::UnsupportedHashAlgorithm(id.clone())),
        Some(other) => Err(Inconsistency::UnsupportedHashAlgorithm(other.to_string())),
    }
}

/// Decode presented disclosure strings, reporting every malformed one.
pub fn decode_disclosures<S: AsRef<str>>(encoded: &[S]) -> Result<Vec<Disclosure>, ReconstructionError> {
    let mut decoded = Vec::with_capacity(encoded.len());
    let mut inconsistencies = Vec::new();
    for (index, item) in encoded.iter().enumerate() {
        match Disclosure::decode(item.as_ref()) {
            Ok(d) => decoded.push(d),
            Err(e) => inconsistencies.push(Inconsistency::MalformedDisclosure {
                index,
                reason: e.to_string(),
            }),
        }
    }
    ReconstructionError::check(inconsistencies)?;
    Ok(decoded)
}

/// Rebuild the claims of `payload` from `disclosures`.
pub fn recreate_claims(
    payload: &Value,
    disclosures: &[Disclosure],
    policy: ReconstructionPolicy,
) -> Result<RecreatedClaims, ReconstructionError> {
    let Value::Object(root) = payload else {
        return Err(ReconstructionError::single(Inconsistency::PayloadNotAnObject));
    };
    let algorithm = payload_hash_algorithm(root).map_err(ReconstructionError::single)?;
    let result = Reconstructor::new(disclosures, algorithm, policy).run(root);
    match &result {
        Ok(recreated) => debug!(
            alg = %algorithm,
            disclosures = disclosures.len(),
            claims = recreated.disclosures_per_claim.len(),
            "reconstructed claims"
        ),
        Err(e) => warn!(inconsistencies = e.len(), "claim reconstruction failed"),
    }
    result
}

/// Decode `encoded` and rebuild the claims of `payload` from it.
pub fn recreate_claims_from_encoded<S: AsRef<str>>(
    payload: &Value,
    encoded: &[S],
    policy: ReconstructionPolicy,
) -> Result<RecreatedClaims, ReconstructionError> {
    let disclosures = decode_disclosures(encoded)?;
    recreate_claims(payload, &disclosures, policy)
}

struct Child<'a> {
    value: &'a Value,
    path: ClaimPath,
    chain: Vec<usize>,
}

enum Frame<'a> {
    Object {
        children: vec::IntoIter<(String, Child<'a>)>,
        out: Map<String, Value>,
        pending: Option<String>,
    },
    Array {
        children: vec::IntoIter<Child<'a>>,
        out: Vec<Value>,
    },
}

impl<'a> Frame<'a> {
    fn object(children: Vec<(String, Child<'a>)>) -> Self {
        Self::Object {
            children: children.into_iter(),
            out: Map::new(),
            pending: None,
        }
    }

    fn array(children: Vec<Child<'a>>) -> Self {
        let out = Vec::with_capacity(children.len());
        Self::Array {
            children: children.into_iter(),
            out,
        }
    }

    fn next_child(&mut self) -> Option<Child<'a>> {
        match self {
            Self::Object {
                children, pending, ..
            } => children.next().map(|(key, child)| {
                *pending = Some(key);
                child
            }),
            Self::Array { children, .. } => children.next(),
        }
    }

    fn accept(&mut self, value: Value) {
        match self {
            Self::Object { out, pending, .. } => {
                if let Some(key) = pending.take() {
                    out.insert(key, value);
                }
            }
            Self::Array { out, .. } => out.push(value),
        }
    }

    fn finish(self) -> Value {
        match self {
            Self::Object { out, .. } => Value::Object(out),
            Self::Array { out, .. } => Value::Array(out),
        }
    }
}

fn location(path: Option<&ClaimPath>) -> String {
    path.map_or_else(|| "(root)".to_string(), ClaimPath::to_string)
}

struct Reconstructor<'a> {
    disclosures: &'a [Disclosure],
    digests: Vec<DisclosureDigest>,
    index: HashMap<DisclosureDigest, usize>,
    used: Vec<bool>,
    referenced: HashSet<DisclosureDigest>,
    chains: BTreeMap<ClaimPath, Vec<usize>>,
    algorithm: HashAlgorithm,
    policy: ReconstructionPolicy,
    inconsistencies: Vec<Inconsistency>,
}

impl<'a> Reconstructor<'a> {
    fn new(
        disclosures: &'a [Disclosure],
        algorithm: HashAlgorithm,
        policy: ReconstructionPolicy,
    ) -> Self {
        let digests: Vec<DisclosureDigest> =
            disclosures.iter().map(|d| d.digest(algorithm)).collect();
        let mut index = HashMap::with_capacity(digests.len());
        let mut used = vec![false; digests.len()];
        let mut inconsistencies = Vec::new();

        for (i, digest) in digests.iter().enumerate() {
            match index.get(digest) {
                Some(&first) => {
                    let digest = digest.clone();
                    inconsistencies.push(if disclosures[first] == disclosures[i] {
                        Inconsistency::DuplicateDisclosure { digest }
                    } else {
                        Inconsistency::AmbiguousDigest { digest }
                    });
                    // Already reported; not an orphan as well.
                    used[i] = true;
                }
                None => {
                    index.insert(digest.clone(), i);
                }
            }
        }

        Self {
            disclosures,
            digests,
            index,
            used,
            referenced: HashSet::new(),
            chains: BTreeMap::new(),
            algorithm,
            policy,
            inconsistencies,
        }
    }

    fn run(mut self, root: &'a Map<String, Value>) -> Result<RecreatedClaims, ReconstructionError> {
        let root_children = self.object_children(root, None, &[]);
        let mut stack = vec![Frame::object(root_children)];
        let mut claims = Map::new();

        while let Some(frame) = stack.last_mut() {
            let Some(child) = frame.next_child() else {
                let Some(done) = stack.pop() else { break };
                match (stack.last_mut(), done.finish()) {
                    (Some(parent), value) => parent.accept(value),
                    (None, Value::Object(map)) => claims = map,
                    (None, _) => {}
                }
                continue;
            };

            if matches!(child.value, Value::Object(_) | Value::Array(_))
                && stack.len() >= MAX_NESTING_DEPTH
            {
                // The subtree is never built; one report covers it.
                self.inconsistencies.push(Inconsistency::TooDeep {
                    location: child.path.to_string(),
                    limit: MAX_NESTING_DEPTH,
                });
                continue;
            }
            self.chains.insert(child.path.clone(), child.chain.clone());
            match child.value {
                Value::Object(map) => {
                    let children = self.object_children(map, Some(&child.path), &child.chain);
                    stack.push(Frame::object(children));
                }
                Value::Array(items) => {
                    let children = self.array_children(items, &child.path, &child.chain);
                    stack.push(Frame::array(children));
                }
                leaf => {
                    if let Some(parent) = stack.last_mut() {
                        parent.accept(leaf.clone());
                    }
                }
            }
        }

        for (i, used) in self.used.iter().enumerate() {
            if !used {
                self.inconsistencies.push(Inconsistency::UnusedDisclosure {
                    digest: self.digests[i].clone(),
                });
            }
        }
        ReconstructionError::check(std::mem::take(&mut self.inconsistencies))?;

        let disclosures = self.disclosures;
        let paths = self
            .chains
            .into_iter()
            .map(|(path, chain)| {
                let revealed = chain.into_iter().map(|i| disclosures[i].clone()).collect();
                (path, revealed)
            })
            .collect();
        Ok(RecreatedClaims {
            claims,
            disclosures_per_claim: DisclosuresPerClaimPath { paths },
            hash_algorithm: self.algorithm,
        })
    }

    /// Look up a referenced digest, consuming its disclosure.
    fn resolve(&mut self, digest: DisclosureDigest, location: &str) -> Option<usize> {
        if !self.referenced.insert(digest.clone()) {
            self.inconsistencies
                .push(Inconsistency::DigestReferencedTwice { digest });
            return None;
        }
        match self.index.get(&digest) {
            Some(&i) => {
                self.used[i] = true;
                Some(i)
            }
            None => {
                if self.policy.undisclosed_digests == UndisclosedDigests::Reject {
                    self.inconsistencies.push(Inconsistency::UndisclosedDigest {
                        digest,
                        location: location.to_string(),
                    });
                }
                None
            }
        }
    }

    fn object_children(
        &mut self,
        map: &'a Map<String, Value>,
        path: Option<&ClaimPath>,
        chain: &[usize],
    ) -> Vec<(String, Child<'a>)> {
        let disclosures = self.disclosures;
        let child_path = |name: &str| path.map_or_else(|| ClaimPath::claim(name), |p| p.child(name));
        let mut children: Vec<(String, Child<'a>)> = map
            .iter()
            .filter(|(k, _)| k.as_str() != SD_CLAIM && !(path.is_none() && k.as_str() == SD_ALG_CLAIM))
            .map(|(k, v)| {
                let child = Child {
                    value: v,
                    path: child_path(k.as_str()),
                    chain: chain.to_vec(),
                };
                (k.clone(), child)
            })
            .collect();

        let Some(sd) = map.get(SD_CLAIM) else {
            return children;
        };
        let here = location(path);
        let Some(list) = sd.as_array() else {
            self.inconsistencies
                .push(Inconsistency::MalformedDigestList { location: here });
            return children;
        };

        for entry in list {
            let Some(digest) = entry.as_str().map(DisclosureDigest::new) else {
                self.inconsistencies.push(Inconsistency::MalformedDigestList {
                    location: here.clone(),
                });
                continue;
            };
            let Some(i) = self.resolve(digest, &here) else {
                continue;
            };
            let disclosure = &disclosures[i];
            let Some(name) = disclosure.name() else {
                self.inconsistencies.push(Inconsistency::WrongDisclosureShape {
                    digest: self.digests[i].clone(),
                    location: here.clone(),
                    expected: DisclosureShape::ObjectProperty,
                });
                continue;
            };
            if children.iter().any(|(k, _)| k == name) {
                self.inconsistencies.push(Inconsistency::ClaimNameCollision {
                    name: name.to_string(),
                    location: here.clone(),
                });
                continue;
            }
            let mut revealed_by = chain.to_vec();
            revealed_by.push(i);
            children.push((
                name.to_string(),
                Child {
                    value: disclosure.value(),
                    path: child_path(name),
                    chain: revealed_by,
                },
            ));
        }
        children
    }

    fn array_children(
        &mut self,
        items: &'a [Value],
        path: &ClaimPath,
        chain: &[usize],
    ) -> Vec<Child<'a>> {
        let disclosures = self.disclosures;
        let here = path.to_string();
        let mut children = Vec::with_capacity(items.len());

        for item in items {
            let wrapper = match item {
                Value::Object(map) if map.contains_key(ARRAY_DIGEST_KEY) => map,
                plain => {
                    children.push(Child {
                        value: plain,
                        path: path.element(children.len()),
                        chain: chain.to_vec(),
                    });
                    continue;
                }
            };
            let digest = match (wrapper.len(), wrapper.get(ARRAY_DIGEST_KEY).and_then(Value::as_str)) {
                (1, Some(digest)) => DisclosureDigest::new(digest),
                _ => {
                    self.inconsistencies.push(Inconsistency::MalformedDigestList {
                        location: here.clone(),
                    });
                    continue;
                }
            };
            let Some(i) = self.resolve(digest, &here) else {
                continue;
            };
            let disclosure = &disclosures[i];
            if disclosure.is_object_property() {
                self.inconsistencies.push(Inconsistency::WrongDisclosureShape {
                    digest: self.digests[i].clone(),
                    location: here.clone(),
                    expected: DisclosureShape::ArrayElement,
                });
                continue;
            }
            let mut revealed_by = chain.to_vec();
            revealed_by.push(i);
            children.push(Child {
                value: disclosure.value(),
                path: path.element(children.len()),
                chain: revealed_by,
            });
        }
        children
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::SdJwtFactory;
    use crate::testing::{CountingDecoys, SequentialSalts};
    use sdjwt_core::{SdArrayBuilder, SdObjectBuilder};
    use sdjwt_crypto::Salt;
    use serde_json::json;

    const FAMILY_NAME: &str = "WyJfMjZiYzRMVC1hYzZxMktJNmNCVzVlcyIsICJmYW1pbHlfbmFtZSIsICJNw7ZiaXVzIl0";
    const NATIONALITY: &str = "WyJsa2x4RjVqTVlsR1RQVW92TU5JdkNBIiwgIkZSIl0";

    fn factory() -> SdJwtFactory<SequentialSalts, CountingDecoys> {
        SdJwtFactory::new()
            .with_salt_provider(SequentialSalts::default())
            .with_decoy_generator(CountingDecoys::default())
    }

    fn recursive_address() -> sdjwt_core::SdObject {
        let address = SdObjectBuilder::new()
            .sd_claim("street_address", json!("Schulstr. 12"))
            .sd_claim("locality", json!("Schulpforta"))
            .sd_claim("region", json!("Sachsen-Anhalt"))
            .sd_claim("country", json!("DE"))
            .build()
            .unwrap();
        SdObjectBuilder::new()
            .claim("iss", json!("https://issuer.example.com"))
            .always("address", address)
            .build()
            .unwrap()
    }

    fn tolerate() -> ReconstructionPolicy {
        ReconstructionPolicy::tolerant()
    }

    fn kinds(err: &ReconstructionError) -> Vec<&'static str> {
        err.inconsistencies()
            .iter()
            .map(|i| match i {
                Inconsistency::PayloadNotAnObject => "payload",
                Inconsistency::UnsupportedHashAlgorithm(_) => "alg",
                Inconsistency::MalformedDisclosure { .. } => "malformed",
                Inconsistency::DuplicateDisclosure { .. } => "duplicate",
                Inconsistency::AmbiguousDigest { .. } => "ambiguous",
                Inconsistency::UnusedDisclosure { .. } => "unused",
                Inconsistency::DigestReferencedTwice { .. } => "twice",
                Inconsistency::WrongDisclosureShape { .. } => "shape",
                Inconsistency::ClaimNameCollision { .. } => "collision",
                Inconsistency::MalformedDigestList { .. } => "list",
                Inconsistency::UndisclosedDigest { .. } => "undisclosed",
                Inconsistency::TooDeep { .. } => "depth",
            })
            .collect()
    }

    #[test]
    fn test_draft_vectors_without_declared_algorithm() {
        let payload = json!({
            "_sd": ["X9yH0Ajrdm1Oij4tWso9UzzKJvPoDxwmuEcO3XAdRC0"],
            "nationalities": [{"...": "w0I8EKcdCtUPkGCNUrfwVp2xEgNjtoIDlOxc9-PlOhs"}, "DE"]
        });
        let recreated =
            recreate_claims_from_encoded(&payload, &[FAMILY_NAME, NATIONALITY], tolerate()).unwrap();
        assert_eq!(
            Value::Object(recreated.claims),
            json!({"family_name": "Möbius", "nationalities": ["FR", "DE"]})
        );
        assert_eq!(recreated.hash_algorithm, HashAlgorithm::Sha256);
    }

    #[test]
    fn test_recursive_disclosure_restored() {
        let claims = recursive_address();
        let unsigned = factory().generate(&claims).unwrap();
        let payload = Value::Object(unsigned.payload);
        let recreated = recreate_claims(&payload, &unsigned.disclosures, tolerate()).unwrap();
        assert_eq!(Value::Object(recreated.claims), claims.to_plain());

        let per_claim = &recreated.disclosures_per_claim;
        let address = ClaimPath::claim("address");
        assert_eq!(per_claim.disclosure_count(&ClaimPath::claim("iss")), Some(0));
        assert_eq!(per_claim.disclosure_count(&address), Some(1));
        assert_eq!(per_claim.disclosure_count(&address.child("region")), Some(2));
        assert!(per_claim.is_selectively_disclosed(&address.child("region")));
        assert!(!per_claim.is_selectively_disclosed(&ClaimPath::claim("iss")));
    }

    #[test]
    fn test_withheld_disclosures_leave_claims_hidden() {
        let unsigned = factory().generate(&recursive_address()).unwrap();
        let payload = Value::Object(unsigned.payload);
        // Only the container: its members stay behind their digests.
        let container = unsigned.disclosures[4].clone();
        let recreated = recreate_claims(&payload, &[container], tolerate()).unwrap();
        assert_eq!(
            Value::Object(recreated.claims),
            json!({"iss": "https://issuer.example.com", "address": {}})
        );
    }

    #[test]
    fn test_strict_policy_rejects_undisclosed_digests() {
        let claims = SdObjectBuilder::new()
            .sd_claim("a", json!(1))
            .minimum_digests(3)
            .build()
            .unwrap();
        let unsigned = factory().generate(&claims).unwrap();
        let payload = Value::Object(unsigned.payload);
        assert!(recreate_claims(&payload, &unsigned.disclosures, tolerate()).is_ok());
        let err = recreate_claims(&payload, &unsigned.disclosures, ReconstructionPolicy::strict())
            .unwrap_err();
        assert_eq!(kinds(&err), vec!["undisclosed", "undisclosed"]);
    }

    #[test]
    fn test_orphan_disclosure_fails() {
        let unsigned = factory().generate(&recursive_address()).unwrap();
        let payload = Value::Object(unsigned.payload);
        let mut disclosures = unsigned.disclosures.clone();
        disclosures.push(Disclosure::object_property(Salt::new("x"), "extra", json!(1)).unwrap());
        let err = recreate_claims(&payload, &disclosures, tolerate()).unwrap_err();
        assert_eq!(kinds(&err), vec!["unused"]);
    }

    #[test]
    fn test_duplicate_disclosure_fails() {
        let unsigned = factory().generate(&recursive_address()).unwrap();
        let payload = Value::Object(unsigned.payload);
        let mut disclosures = unsigned.disclosures.clone();
        disclosures.push(disclosures[0].clone());
        let err = recreate_claims(&payload, &disclosures, tolerate()).unwrap_err();
        assert_eq!(kinds(&err), vec!["duplicate"]);
    }

    #[test]
    fn test_inconsistencies_are_aggregated() {
        let element = Disclosure::array_element(Salt::new("s1"), json!("x")).unwrap();
        let property = Disclosure::object_property(Salt::new("s2"), "given_name", json!("y")).unwrap();
        let colliding = Disclosure::object_property(Salt::new("s3"), "iss", json!("z")).unwrap();
        let alg = HashAlgorithm::Sha256;
        let payload = json!({
            "iss": "https://issuer.example.com",
            "_sd": [element.digest(alg).as_str(), colliding.digest(alg).as_str()],
            "list": [{"...": property.digest(alg).as_str()}, {"...": "a", "extra": 1}],
            "nested": {"_sd": "not-a-list"}
        });
        let err = recreate_claims(&payload, &[element, property, colliding], tolerate()).unwrap_err();
        let mut found = kinds(&err);
        found.sort();
        assert_eq!(found, vec!["collision", "list", "list", "shape", "shape"]);
    }

    #[test]
    fn test_digest_referenced_twice() {
        let d = Disclosure::object_property(Salt::new("s"), "a", json!(1)).unwrap();
        let digest = d.digest(HashAlgorithm::Sha256);
        let payload = json!({"_sd": [digest.as_str()], "b": {"_sd": [digest.as_str()]}});
        let err = recreate_claims(&payload, &[d], tolerate()).unwrap_err();
        assert_eq!(kinds(&err), vec!["twice"]);
    }

    #[test]
    fn test_self_referencing_disclosure_terminates() {
        // The same digest reachable twice through a disclosed value.
        let inner = Disclosure::object_property(Salt::new("i"), "inner", json!(1)).unwrap();
        let digest = inner.digest(HashAlgorithm::Sha256);
        let outer = Disclosure::object_property(
            Salt::new("o"),
            "outer",
            json!({"_sd": [digest.as_str()], "again": {"_sd": [digest.as_str()]}}),
        )
        .unwrap();
        let payload = json!({"_sd": [outer.digest(HashAlgorithm::Sha256).as_str()]});
        let err = recreate_claims(&payload, &[outer, inner], tolerate()).unwrap_err();
        assert_eq!(kinds(&err), vec!["twice"]);
    }

    #[test]
    fn test_unsupported_algorithm() {
        let payload = json!({"_sd_alg": "md5"});
        let err = recreate_claims(&payload, &[], tolerate()).unwrap_err();
        assert_eq!(kinds(&err), vec!["alg"]);
        let err = recreate_claims(&json!([1]), &[], tolerate()).unwrap_err();
        assert_eq!(kinds(&err), vec!["payload"]);
    }

    #[test]
    fn test_malformed_disclosures_all_reported() {
        let err = decode_disclosures(&["!!", NATIONALITY, "e30"]).unwrap_err();
        let indexes: Vec<usize> = err
            .inconsistencies()
            .iter()
            .filter_map(|i| match i {
                Inconsistency::MalformedDisclosure { index, .. } => Some(*index),
                _ => None,
            })
            .collect();
        assert_eq!(indexes, vec![0, 2]);
    }

    #[test]
    fn test_overly_deep_disclosure_chain_reported() {
        let alg = HashAlgorithm::Sha256;
        let mut disclosures = vec![Disclosure::object_property(Salt::new("s"), "n", json!(1)).unwrap()];
        for i in 0..150 {
            let inner = disclosures[disclosures.len() - 1].digest(alg);
            let outer = Disclosure::object_property(
                Salt::new(format!("s{i}")),
                "n",
                json!({"_sd": [inner.as_str()]}),
            )
            .unwrap();
            disclosures.push(outer);
        }
        let top = disclosures[disclosures.len() - 1].digest(alg);
        let payload = json!({"_sd": [top.as_str()]});

        let err = recreate_claims(&payload, &disclosures, tolerate()).unwrap_err();
        let found = kinds(&err);
        assert_eq!(found[0], "depth");
        assert_eq!(found.iter().filter(|k| **k == "depth").count(), 1);
        assert!(found[1..].iter().all(|k| *k == "unused"));
    }

    #[test]
    fn test_array_indices_follow_revealed_positions() {
        let nationalities = SdArrayBuilder::new()
            .sd_element(json!("US"))
            .sd_element(json!("DE"))
            .element(json!("FR"))
            .build()
            .unwrap();
        let claims = SdObjectBuilder::new()
            .never("nationalities", nationalities)
            .build()
            .unwrap();
        let unsigned = factory().generate(&claims).unwrap();
        let payload = Value::Object(unsigned.payload);
        let recreated = recreate_claims(&payload, &unsigned.disclosures[1..], tolerate()).unwrap();
        assert_eq!(recreated.claims["nationalities"], json!(["DE", "FR"]));
        let path = ClaimPath::claim("nationalities").element(0);
        assert_eq!(recreated.disclosures_per_claim.disclosure_count(&path), Some(1));
        let all = ClaimPath::claim("nationalities").all_elements();
        assert_eq!(recreated.disclosures_per_claim.matching(&all).count(), 2);
    }
}
