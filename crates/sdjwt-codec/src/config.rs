//! # Issuance and Reconstruction Configuration
//!
//! Both configurations deserialize from JSON with every field optional:
//!
//! ```json
//! { "hash_algorithm": "sha-384", "fallback_minimum_digests": 5, "salt_length": 32 }
//! { "undisclosed_digests": "reject" }
//! ```

use serde::{Deserialize, Serialize};
use sdjwt_core::MinimumDigests;
use sdjwt_crypto::{HashAlgorithm, DEFAULT_SALT_LENGTH};

use crate::error::IssuanceError;

/// Smallest salt the factory accepts, in bytes.
pub const MIN_SALT_LENGTH: usize = 16;

/// Settings for an [`SdJwtFactory`](crate::SdJwtFactory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IssuanceConfig {
    /// Algorithm for every digest of the token.
    pub hash_algorithm: HashAlgorithm,
    /// Minimum digests for containers without their own hint.
    pub fallback_minimum_digests: Option<u32>,
    /// Random bytes per salt.
    pub salt_length: usize,
}

impl Default for IssuanceConfig {
    fn default() -> Self {
        Self {
            hash_algorithm: HashAlgorithm::default(),
            fallback_minimum_digests: None,
            salt_length: DEFAULT_SALT_LENGTH,
        }
    }
}

impl IssuanceConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, IssuanceError> {
        serde_json::from_str(json).map_err(|e| IssuanceError::Config(e.to_string()))
    }

    /// The fallback minimum as a validated hint.
    pub fn fallback_minimum(&self) -> Result<Option<MinimumDigests>, IssuanceError> {
        Ok(self
            .fallback_minimum_digests
            .map(MinimumDigests::new)
            .transpose()?)
    }

    /// Check the settings without building anything.
    pub fn validate(&self) -> Result<(), IssuanceError> {
        if self.salt_length < MIN_SALT_LENGTH {
            return Err(IssuanceError::Config(format!(
                "salt_length {} is below the minimum of {MIN_SALT_LENGTH} bytes",
                self.salt_length
            )));
        }
        self.fallback_minimum()?;
        Ok(())
    }
}

/// How reconstruction treats a digest with no matching disclosure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndisclosedDigests {
    /// Leave the claim hidden. Decoys and withheld claims look alike, so
    /// this is what holder presentations need.
    #[default]
    Tolerate,
    /// Report every unmatched digest as an inconsistency.
    Reject,
}

/// Settings for claim reconstruction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconstructionPolicy {
    /// Treatment of digests without a disclosure.
    pub undisclosed_digests: UndisclosedDigests,
}

impl ReconstructionPolicy {
    /// Tolerate undisclosed digests.
    pub fn tolerant() -> Self {
        Self {
            undisclosed_digests: UndisclosedDigests::Tolerate,
        }
    }

    /// Reject undisclosed digests.
    pub fn strict() -> Self {
        Self {
            undisclosed_digests: UndisclosedDigests::Reject,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config = IssuanceConfig::from_json("{}").unwrap();
        assert_eq!(config, IssuanceConfig::default());
        assert_eq!(config.hash_algorithm, HashAlgorithm::Sha256);
        assert_eq!(config.salt_length, 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_json() {
        let config = IssuanceConfig::from_json(
            r#"{"hash_algorithm": "sha-512", "fallback_minimum_digests": 3, "salt_length": 32}"#,
        )
        .unwrap();
        assert_eq!(config.hash_algorithm, HashAlgorithm::Sha512);
        assert_eq!(config.fallback_minimum().unwrap().map(MinimumDigests::get), Some(3));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        assert!(IssuanceConfig::from_json(r#"{"hash_algorithm": "md5"}"#).is_err());
        assert!(IssuanceConfig::from_json(r#"{"unknown": 1}"#).is_err());
        let zero = IssuanceConfig {
            fallback_minimum_digests: Some(0),
            ..IssuanceConfig::default()
        };
        assert!(matches!(zero.validate(), Err(IssuanceError::Tree(_))));
        let short = IssuanceConfig {
            salt_length: 8,
            ..IssuanceConfig::default()
        };
        assert!(matches!(short.validate(), Err(IssuanceError::Config(_))));
    }

    #[test]
    fn test_reconstruction_policy_json() {
        let policy: ReconstructionPolicy =
            serde_json::from_str(r#"{"undisclosed_digests": "reject"}"#).unwrap();
        assert_eq!(policy, ReconstructionPolicy::strict());
        let default: ReconstructionPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(default.undisclosed_digests, UndisclosedDigests::Tolerate);
    }
}
