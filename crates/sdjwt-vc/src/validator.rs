//! # Definition-Based Validation
//!
//! Checks a reconstructed credential against the definition of its type.
//! The definition and the revealed claims are walked together, descending
//! only where both have a container. At every claim:
//!
//! - **Type.** An object or array definition needs a value of that shape; a
//!   leaf with a declared [`ClaimType`](crate::metadata::ClaimType) needs a
//!   value of that type. A mismatch is reported and the walk does not
//!   descend further there.
//! - **Disclosure policy.** A claim that needs strictly more disclosures
//!   than its parent was selectively disclosed. `always` claims must be,
//!   `never` claims must not be; `allowed` is not checked.
//!
//! Revealed claims without a definition are reported as unknown. Registered
//! claims are skipped by the walk and checked on their own rules: `iss` and
//! `vct` must be present, `vct` must name the definition's type, and `iss`,
//! `vct`, `vct#integrity`, `nbf`, `exp`, `cnf` and `status` must be plain.
//!
//! Arrays are checked element by element only when their definition has a
//! single element definition, which then applies to every element.
//!
//! Every violation is collected; nothing stops at the first one.

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use sdjwt_codec::{
    DisclosuresPerClaimPath, ReconstructionError, ReconstructionPolicy, RecreatedClaims, SdJwt,
};
use sdjwt_core::{ClaimPath, DisclosableValue};

use crate::definition::{ClaimDef, DefinitionElement, SdJwtDefinition};
use crate::metadata::{json_type_name, SelectivelyDisclosable};
use crate::well_known::{is_well_known, NEVER_SELECTIVELY_DISCLOSED, REQUIRED_CLAIMS, VCT};

/// One way a credential departs from its definition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionViolation {
    /// A revealed claim the definition does not declare.
    #[error("claim '{0}' is not defined for this credential type")]
    UnknownClaim(ClaimPath),

    /// A claim's value has the wrong JSON type.
    #[error("claim '{path}' should be {expected}, found {found}")]
    WrongClaimType {
        /// The claim.
        path: ClaimPath,
        /// What the definition declares.
        expected: String,
        /// What the credential holds.
        found: String,
    },

    /// A claim's disclosure contradicts its policy.
    #[error("claim '{path}' {}", requirement(.policy))]
    IncorrectlyDisclosedClaim {
        /// The claim.
        path: ClaimPath,
        /// The policy it violates.
        policy: SelectivelyDisclosable,
    },

    /// A registered claim every credential needs is absent.
    #[error("required claim '{0}' is missing")]
    MissingRequiredClaim(String),

    /// The credential names another type than the definition.
    #[error("vct '{found}' does not match '{expected}'")]
    InvalidVct {
        /// The definition's type.
        expected: String,
        /// The credential's `vct`.
        found: String,
    },

    /// The disclosures could not be reconciled with the payload.
    #[error("{0}")]
    DisclosureInconsistencies(ReconstructionError),
}

fn requirement(policy: &SelectivelyDisclosable) -> &'static str {
    match policy {
        SelectivelyDisclosable::Always => "must be selectively disclosed",
        SelectivelyDisclosable::Never => "must not be selectively disclosed",
        SelectivelyDisclosable::Allowed => "may be selectively disclosed",
    }
}

/// A non-empty list of violations, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionViolations {
    violations: Vec<DefinitionViolation>,
}

impl DefinitionViolations {
    /// Wrap a single violation.
    pub fn single(violation: DefinitionViolation) -> Self {
        Self {
            violations: vec![violation],
        }
    }

    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[DefinitionViolation] {
        &self.violations
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<DefinitionViolation> {
        self.violations
    }
}

impl fmt::Display for DefinitionViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

impl std::error::Error for DefinitionViolations {}

/// Check revealed `claims` and the disclosures behind them against
/// `definition`.
pub fn validate(
    definition: &SdJwtDefinition,
    claims: &Map<String, Value>,
    per_claim: &DisclosuresPerClaimPath,
) -> Result<(), DefinitionViolations> {
    let mut violations = Vec::new();
    check_registered_claims(definition, claims, per_claim, &mut violations);

    let mut pending: Vec<(ClaimPath, &Value, Option<&DefinitionElement>)> = claims
        .iter()
        .rev()
        .filter(|(name, _)| !is_well_known(name))
        .map(|(name, value)| {
            (
                ClaimPath::claim(name.as_str()),
                value,
                definition.claims.get_claim(name),
            )
        })
        .collect();

    while let Some((path, value, def)) = pending.pop() {
        let Some(def) = def else {
            violations.push(DefinitionViolation::UnknownClaim(path));
            continue;
        };
        check_policy(&path, node_def(def), per_claim, &mut violations);

        match (def.value(), value) {
            (DisclosableValue::Leaf(leaf), value) => {
                if let Some(expected) = &leaf.claim_type {
                    if !expected.matches(value) {
                        violations.push(DefinitionViolation::WrongClaimType {
                            path,
                            expected: expected.to_string(),
                            found: json_type_name(value).to_string(),
                        });
                    }
                }
            }
            (DisclosableValue::Object(object), Value::Object(members)) => {
                for (name, member) in members.iter().rev() {
                    pending.push((path.child(name.as_str()), member, object.get_claim(name)));
                }
            }
            (DisclosableValue::Array(array), Value::Array(items)) => {
                if let [element] = array.elements() {
                    for (index, item) in items.iter().enumerate().rev() {
                        pending.push((path.element(index), item, Some(element)));
                    }
                }
            }
            (DisclosableValue::Object(_), value) => {
                violations.push(wrong_container(path, "object", value));
            }
            (DisclosableValue::Array(_), value) => {
                violations.push(wrong_container(path, "array", value));
            }
        }
    }

    debug!(
        vct = %definition.vct,
        violations = violations.len(),
        "validated credential against its definition"
    );
    if violations.is_empty() {
        Ok(())
    } else {
        Err(DefinitionViolations { violations })
    }
}

/// Reconstruct `sd_jwt` under `policy` and validate the result. A failed
/// reconstruction is reported as
/// [`DefinitionViolation::DisclosureInconsistencies`] without validating.
pub fn validate_sd_jwt<J>(
    definition: &SdJwtDefinition,
    sd_jwt: &SdJwt<J>,
    policy: ReconstructionPolicy,
) -> Result<RecreatedClaims, DefinitionViolations> {
    let recreated = sd_jwt.recreate_claims_with(policy).map_err(|e| {
        DefinitionViolations::single(DefinitionViolation::DisclosureInconsistencies(e))
    })?;
    validate(definition, &recreated.claims, &recreated.disclosures_per_claim)?;
    Ok(recreated)
}

fn node_def(element: &DefinitionElement) -> &ClaimDef {
    match element.value() {
        DisclosableValue::Leaf(def) => def,
        DisclosableValue::Object(object) => object.metadata(),
        DisclosableValue::Array(array) => array.metadata(),
    }
}

fn check_policy(
    path: &ClaimPath,
    def: &ClaimDef,
    per_claim: &DisclosuresPerClaimPath,
    violations: &mut Vec<DefinitionViolation>,
) {
    let disclosed = per_claim.is_selectively_disclosed(path);
    let wrong = match def.sd {
        SelectivelyDisclosable::Always => !disclosed,
        SelectivelyDisclosable::Never => disclosed,
        SelectivelyDisclosable::Allowed => false,
    };
    if wrong {
        violations.push(DefinitionViolation::IncorrectlyDisclosedClaim {
            path: path.clone(),
            policy: def.sd,
        });
    }
}

fn check_registered_claims(
    definition: &SdJwtDefinition,
    claims: &Map<String, Value>,
    per_claim: &DisclosuresPerClaimPath,
    violations: &mut Vec<DefinitionViolation>,
) {
    for name in REQUIRED_CLAIMS {
        if !claims.contains_key(name) {
            violations.push(DefinitionViolation::MissingRequiredClaim(name.to_string()));
        }
    }
    if let Some(vct) = claims.get(VCT) {
        if vct.as_str() != Some(definition.vct.as_str()) {
            violations.push(DefinitionViolation::InvalidVct {
                expected: definition.vct.clone(),
                found: vct.as_str().map_or_else(|| vct.to_string(), str::to_string),
            });
        }
    }
    for name in NEVER_SELECTIVELY_DISCLOSED {
        let path = ClaimPath::claim(name);
        if claims.contains_key(name) && per_claim.is_selectively_disclosed(&path) {
            violations.push(DefinitionViolation::IncorrectlyDisclosedClaim {
                path,
                policy: SelectivelyDisclosable::Never,
            });
        }
    }
}

fn wrong_container(path: ClaimPath, expected: &str, value: &Value) -> DefinitionViolation {
    DefinitionViolation::WrongClaimType {
        path,
        expected: expected.to_string(),
        found: json_type_name(value).to_string(),
    }
}
