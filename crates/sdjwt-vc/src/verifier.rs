//! # Credential Verification Pipeline
//!
//! [`SdJwtVcVerifier::verify`] takes a received token and its encoded
//! disclosures through every check in order, stopping at the first failing
//! stage:
//!
//! 1. signature, through the [`PayloadVerifier`] collaborator;
//! 2. disclosure decoding;
//! 3. claim reconstruction under the configured [`ReconstructionPolicy`];
//! 4. type metadata resolution for the revealed `vct`, following `extends`;
//! 5. metadata to definition conversion;
//! 6. definition-based validation.

use serde_json::Value;
use tracing::{debug, warn};

use sdjwt_codec::{
    decode_disclosures, PayloadVerifier, ReconstructionPolicy, RecreatedClaims, SdJwt,
};

use crate::definition::SdJwtDefinition;
use crate::error::VerificationError;
use crate::resolver::{resolve_type_metadata, TypeMetadataResolver};
use crate::validator::{validate, DefinitionViolation, DefinitionViolations};
use crate::well_known::VCT;

/// A credential that passed every check.
#[derive(Debug, Clone)]
pub struct VerifiedCredential<J, I> {
    /// The token with its payload and the presented disclosures.
    pub sd_jwt: SdJwt<J>,
    /// Who signed it.
    pub signer: I,
    /// The revealed claims.
    pub claims: RecreatedClaims,
    /// The definition it conforms to.
    pub definition: SdJwtDefinition,
}

/// Verifies SD-JWT credentials against the definitions of their types.
#[derive(Debug, Clone)]
pub struct SdJwtVcVerifier<V, R> {
    verifier: V,
    resolver: R,
    policy: ReconstructionPolicy,
}

impl<V: PayloadVerifier, R: TypeMetadataResolver> SdJwtVcVerifier<V, R> {
    /// A verifier tolerating undisclosed digests.
    pub fn new(verifier: V, resolver: R) -> Self {
        Self {
            verifier,
            resolver,
            policy: ReconstructionPolicy::default(),
        }
    }

    /// Use `policy` for reconstruction.
    pub fn with_policy(mut self, policy: ReconstructionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run the whole pipeline on `token` and its `disclosures`.
    pub fn verify<S: AsRef<str>>(
        &self,
        token: &V::Token,
        disclosures: &[S],
    ) -> Result<VerifiedCredential<V::Token, V::SignerIdentity>, VerificationError>
    where
        V::Token: Clone,
    {
        let verified = self
            .verifier
            .verify(token)
            .map_err(|e| VerificationError::Signature(Box::new(e)))?;
        let disclosures = decode_disclosures(disclosures).map_err(inconsistent)?;
        let sd_jwt = SdJwt::new(token.clone(), verified.payload, disclosures);
        let claims = sd_jwt.recreate_claims_with(self.policy).map_err(inconsistent)?;

        let vct = match claims.claims.get(VCT).and_then(Value::as_str) {
            Some(vct) => vct.to_string(),
            None => {
                warn!("credential carries no vct");
                return Err(DefinitionViolations::single(
                    DefinitionViolation::MissingRequiredClaim(VCT.to_string()),
                )
                .into());
            }
        };
        let metadata = resolve_type_metadata(&self.resolver, &vct)?;
        let definition = SdJwtDefinition::from_metadata(&metadata)?;
        if let Err(violations) = validate(&definition, &claims.claims, &claims.disclosures_per_claim)
        {
            warn!(vct = %vct, violations = violations.len(), "credential violates its definition");
            return Err(violations.into());
        }

        debug!(
            vct = %vct,
            disclosures = sd_jwt.disclosures().len(),
            claims = claims.disclosures_per_claim.len(),
            "verified credential"
        );
        Ok(VerifiedCredential {
            sd_jwt,
            signer: verified.signer,
            claims,
            definition,
        })
    }
}

fn inconsistent(error: sdjwt_codec::ReconstructionError) -> VerificationError {
    warn!(inconsistencies = error.len(), "disclosures rejected");
    VerificationError::Invalid(DefinitionViolations::single(
        DefinitionViolation::DisclosureInconsistencies(error),
    ))
}
