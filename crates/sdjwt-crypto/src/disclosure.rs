//! # Disclosure Wire Codec
//!
//! A disclosure reveals one hidden claim. Its wire form is the base64url
//! (no padding) encoding of a JSON array:
//!
//! - `[salt, claim_name, value]` for an object property,
//! - `[salt, value]` for an array element.
//!
//! A [`Disclosure`] keeps the exact encoded string it was created from or
//! decoded from; equality, hashing and digests are all defined on that
//! string.

use std::hash::{Hash, Hasher};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::CryptoError;
use crate::hash::{DisclosureDigest, HashAlgorithm};
use crate::salt::Salt;

/// Claim names a disclosure may never carry: they would be read back as a
/// digest list or an array wrapper.
pub const FORBIDDEN_DISCLOSURE_NAMES: [&str; 2] = ["_sd", "..."];

/// Deepest container nesting allowed in a payload, a disclosure or a
/// revealed claim set.
///
/// Stays below the 128 levels `serde_json` accepts when parsing, so every
/// issued document decodes again.
pub const MAX_NESTING_DEPTH: usize = 100;

/// Container nesting of `value`: zero for a scalar, one for a flat array or
/// object.
pub fn nesting_depth(value: &Value) -> usize {
    let mut deepest = 0;
    let mut pending = vec![(value, 0usize)];
    while let Some((value, depth)) = pending.pop() {
        match value {
            Value::Object(map) => {
                deepest = deepest.max(depth + 1);
                pending.extend(map.values().map(|v| (v, depth + 1)));
            }
            Value::Array(items) => {
                deepest = deepest.max(depth + 1);
                pending.extend(items.iter().map(|v| (v, depth + 1)));
            }
            _ => {}
        }
    }
    deepest
}

/// One decoded disclosure together with its encoded form.
#[derive(Debug, Clone)]
pub struct Disclosure {
    encoded: String,
    salt: Salt,
    name: Option<String>,
    value: Value,
}

impl Disclosure {
    /// Disclose an object property.
    pub fn object_property(
        salt: Salt,
        name: impl Into<String>,
        value: Value,
    ) -> Result<Self, CryptoError> {
        let name = name.into();
        check_name(&name)?;
        let encoded = encode(&Value::Array(vec![
            Value::String(salt.as_str().to_string()),
            Value::String(name.clone()),
            value.clone(),
        ]))?;
        Ok(Self {
            encoded,
            salt,
            name: Some(name),
            value,
        })
    }

    /// Disclose an array element.
    pub fn array_element(salt: Salt, value: Value) -> Result<Self, CryptoError> {
        let encoded = encode(&Value::Array(vec![
            Value::String(salt.as_str().to_string()),
            value.clone(),
        ]))?;
        Ok(Self {
            encoded,
            salt,
            name: None,
            value,
        })
    }

    /// Decode a disclosure from its wire form.
    pub fn decode(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| CryptoError::malformed(format!("invalid base64url: {e}")))?;
        let parsed: Value = serde_json::from_slice(&bytes)
            .map_err(|e| CryptoError::malformed(format!("invalid JSON: {e}")))?;
        let Value::Array(items) = parsed else {
            return Err(CryptoError::malformed("not a JSON array"));
        };

        let count = items.len();
        let mut items = items.into_iter();
        let (salt, name, value) = match (items.next(), items.next(), items.next(), items.next()) {
            (Some(salt), Some(value), None, None) => (salt, None, value),
            (Some(salt), Some(name), Some(value), None) => (salt, Some(name), value),
            _ => {
                return Err(CryptoError::malformed(format!(
                    "expected 2 or 3 elements, found {count}"
                )))
            }
        };

        let Value::String(salt) = salt else {
            return Err(CryptoError::malformed("salt is not a string"));
        };
        let name = match name {
            None => None,
            Some(Value::String(name)) => {
                check_name(&name)?;
                Some(name)
            }
            Some(_) => return Err(CryptoError::malformed("claim name is not a string")),
        };

        Ok(Self {
            encoded: encoded.to_string(),
            salt: Salt::new(salt),
            name,
            value,
        })
    }

    /// The wire form.
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// The salt.
    pub fn salt(&self) -> &Salt {
        &self.salt
    }

    /// The claim name; `None` for an array element.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The revealed value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Whether this discloses an object property.
    pub fn is_object_property(&self) -> bool {
        self.name.is_some()
    }

    /// The digest committing to this disclosure.
    pub fn digest(&self, algorithm: HashAlgorithm) -> DisclosureDigest {
        algorithm.digest(self.encoded.as_bytes())
    }
}

fn check_name(name: &str) -> Result<(), CryptoError> {
    if FORBIDDEN_DISCLOSURE_NAMES.contains(&name) {
        return Err(CryptoError::ReservedClaimName(name.to_string()));
    }
    Ok(())
}

fn encode(content: &Value) -> Result<String, CryptoError> {
    let json = serde_json::to_string(content).map_err(|e| CryptoError::Serialization(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json.as_bytes()))
}

impl PartialEq for Disclosure {
    fn eq(&self, other: &Self) -> bool {
        self.encoded == other.encoded
    }
}

impl Eq for Disclosure {}

impl Hash for Disclosure {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.encoded.hash(state);
    }
}

impl Serialize for Disclosure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encoded)
    }
}

impl<'de> Deserialize<'de> for Disclosure {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Disclosure::decode(&encoded).map_err(D::Error::custom)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn decode_rejects_or_accepts_without_panicking(input in ".{0,64}") {
            let _ = Disclosure::decode(&input);
        }

        #[test]
        fn decode_of_arbitrary_json_is_total(payload in prop::collection::vec(any::<u8>(), 0..64)) {
            let encoded = URL_SAFE_NO_PAD.encode(&payload);
            if let Ok(d) = Disclosure::decode(&encoded) {
                prop_assert_eq!(d.encoded(), encoded.as_str());
            }
        }

        #[test]
        fn distinct_salts_give_distinct_digests(a in "[A-Za-z0-9_-]{8,22}", b in "[A-Za-z0-9_-]{8,22}") {
            prop_assume!(a != b);
            let da = Disclosure::array_element(Salt::new(a), Value::from(1)).unwrap();
            let db = Disclosure::array_element(Salt::new(b), Value::from(1)).unwrap();
            prop_assert_ne!(da.digest(HashAlgorithm::Sha256), db.digest(HashAlgorithm::Sha256));
        }
    }
}
