//! # Signed Container and Signer Contracts
//!
//! An [`SdJwt`] pairs an opaque signed token with the payload it signs and
//! the disclosures issued or presented alongside it. Producing and checking
//! the token is delegated to a [`PayloadSigner`] / [`PayloadVerifier`]; this
//! crate never touches keys or token serialization.
//!
//! ## Security Invariant
//!
//! [`SdJwt::recreate_claims`] and [`SdJwt::present`] trust `payload`. An
//! `SdJwt` built from a received token must come out of a verifier first.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use sdjwt_core::ClaimPath;
use sdjwt_crypto::{Disclosure, HashAlgorithm};

use crate::config::ReconstructionPolicy;
use crate::error::{Inconsistency, ReconstructionError};
use crate::presentation::select_disclosures;
use crate::reconstruct::{payload_hash_algorithm, recreate_claims, RecreatedClaims};

/// Signs rendered payloads.
///
/// Implementations must be safe to share between threads.
pub trait PayloadSigner: Send + Sync {
    /// The signed token.
    type Token: Clone + Send + Sync;
    /// Signing failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sign `payload`.
    fn sign(&self, payload: &Map<String, Value>) -> Result<Self::Token, Self::Error>;
}

/// A payload whose signature checked out, with the identity that signed it.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedPayload<I> {
    /// The signed claim set.
    pub payload: Value,
    /// Who signed it.
    pub signer: I,
}

/// Checks signed tokens.
pub trait PayloadVerifier: Send + Sync {
    /// The signed token.
    type Token;
    /// Identity of a successful signer.
    type SignerIdentity: Clone + Send + Sync;
    /// Verification failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Verify `token`, returning its payload.
    fn verify(&self, token: &Self::Token)
        -> Result<VerifiedPayload<Self::SignerIdentity>, Self::Error>;
}

/// A signed payload with its disclosures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdJwt<J> {
    jwt: J,
    payload: Value,
    disclosures: Vec<Disclosure>,
}

impl<J> SdJwt<J> {
    /// Assemble a container. `payload` must be what `jwt` signs.
    pub fn new(jwt: J, payload: Value, disclosures: Vec<Disclosure>) -> Self {
        Self {
            jwt,
            payload,
            disclosures,
        }
    }

    /// The signed token.
    pub fn jwt(&self) -> &J {
        &self.jwt
    }

    /// The signed payload.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// The attached disclosures.
    pub fn disclosures(&self) -> &[Disclosure] {
        &self.disclosures
    }

    /// Split into token, payload and disclosures.
    pub fn into_parts(self) -> (J, Value, Vec<Disclosure>) {
        (self.jwt, self.payload, self.disclosures)
    }

    /// The algorithm the payload declares.
    pub fn hash_algorithm(&self) -> Result<HashAlgorithm, ReconstructionError> {
        match &self.payload {
            Value::Object(map) => payload_hash_algorithm(map).map_err(ReconstructionError::single),
            _ => Err(ReconstructionError::single(Inconsistency::PayloadNotAnObject)),
        }
    }

    /// Rebuild the claims, tolerating digests without a disclosure.
    pub fn recreate_claims(&self) -> Result<RecreatedClaims, ReconstructionError> {
        self.recreate_claims_with(ReconstructionPolicy::default())
    }

    /// Rebuild the claims under `policy`.
    pub fn recreate_claims_with(
        &self,
        policy: ReconstructionPolicy,
    ) -> Result<RecreatedClaims, ReconstructionError> {
        recreate_claims(&self.payload, &self.disclosures, policy)
    }
}

impl<J: Clone> SdJwt<J> {
    /// A presentation revealing only `targets`: same token and payload,
    /// reduced disclosures.
    pub fn present(&self, targets: &[ClaimPath]) -> Result<SdJwt<J>, ReconstructionError> {
        let recreated = self.recreate_claims()?;
        let disclosures =
            select_disclosures(&self.disclosures, &recreated.disclosures_per_claim, targets);
        Ok(Self::new(self.jwt.clone(), self.payload.clone(), disclosures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IssuanceError;
    use crate::generator::SdJwtFactory;
    use crate::testing::{CountingDecoys, SequentialSalts};
    use sdjwt_core::SdObjectBuilder;
    use serde_json::json;
    use std::fmt;

    #[derive(Debug)]
    struct Refused;

    impl fmt::Display for Refused {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("refused")
        }
    }

    impl std::error::Error for Refused {}

    /// "Signs" by serializing; verifies by parsing.
    struct PlainSigner {
        refuse: bool,
    }

    impl PayloadSigner for PlainSigner {
        type Token = String;
        type Error = Refused;

        fn sign(&self, payload: &Map<String, Value>) -> Result<String, Refused> {
            if self.refuse {
                return Err(Refused);
            }
            Ok(Value::Object(payload.clone()).to_string())
        }
    }

    impl PayloadVerifier for PlainSigner {
        type Token = String;
        type SignerIdentity = &'static str;
        type Error = Refused;

        fn verify(&self, token: &String) -> Result<VerifiedPayload<&'static str>, Refused> {
            let payload = serde_json::from_str(token).map_err(|_| Refused)?;
            Ok(VerifiedPayload {
                payload,
                signer: "plain",
            })
        }
    }

    fn factory() -> SdJwtFactory<SequentialSalts, CountingDecoys> {
        SdJwtFactory::new()
            .with_salt_provider(SequentialSalts::default())
            .with_decoy_generator(CountingDecoys::default())
    }

    fn claims() -> sdjwt_core::SdObject {
        let address = SdObjectBuilder::new()
            .sd_claim("region", json!("Sachsen-Anhalt"))
            .sd_claim("country", json!("DE"))
            .build()
            .unwrap();
        SdObjectBuilder::new()
            .claim("iss", json!("https://issuer.example.com"))
            .sd_claim("given_name", json!("Erika"))
            .always("address", address)
            .build()
            .unwrap()
    }

    #[test]
    fn test_issue_verify_recreate() {
        let signer = PlainSigner { refuse: false };
        let issued = factory().issue(&claims(), &signer).unwrap();
        let verified = signer.verify(issued.jwt()).unwrap();
        assert_eq!(&verified.payload, issued.payload());

        let received = SdJwt::new(
            issued.jwt().clone(),
            verified.payload,
            issued.disclosures().to_vec(),
        );
        let recreated = received.recreate_claims().unwrap();
        assert_eq!(Value::Object(recreated.claims), claims().to_plain());
        assert_eq!(received.hash_algorithm().unwrap(), HashAlgorithm::Sha256);
    }

    #[test]
    fn test_signing_failure_propagates() {
        let err = factory()
            .issue(&claims(), &PlainSigner { refuse: true })
            .unwrap_err();
        assert!(matches!(err, IssuanceError::Signing(_)));
    }

    #[test]
    fn test_present_keeps_token_and_payload() {
        let issued = factory()
            .issue(&claims(), &PlainSigner { refuse: false })
            .unwrap();
        let region = ClaimPath::claim("address").child("region");
        let presented = issued.present(&[region]).unwrap();
        assert_eq!(presented.jwt(), issued.jwt());
        assert_eq!(presented.payload(), issued.payload());
        assert_eq!(presented.disclosures().len(), 2);

        let revealed = presented.recreate_claims().unwrap();
        assert_eq!(
            Value::Object(revealed.claims),
            json!({"iss": "https://issuer.example.com", "address": {"region": "Sachsen-Anhalt"}})
        );
    }

    #[test]
    fn test_serde_shape() {
        let issued = factory()
            .issue(&claims(), &PlainSigner { refuse: false })
            .unwrap();
        let json = serde_json::to_value(&issued).unwrap();
        assert_eq!(json["disclosures"].as_array().map(Vec::len), Some(4));
        let back: SdJwt<String> = serde_json::from_value(json).unwrap();
        assert_eq!(back, issued);
    }
}
