//! # Registered Claims
//!
//! Claims whose meaning the credential format fixes. They are checked on
//! their own rules and never against a type's declared claims.

/// Issuer.
pub const ISS: &str = "iss";
/// Credential type identifier.
pub const VCT: &str = "vct";
/// Integrity hash of the type metadata.
pub const VCT_INTEGRITY: &str = "vct#integrity";
/// Not valid before.
pub const NBF: &str = "nbf";
/// Expiry.
pub const EXP: &str = "exp";
/// Holder key confirmation.
pub const CNF: &str = "cnf";
/// Status list reference.
pub const STATUS: &str = "status";
/// Issued at.
pub const IAT: &str = "iat";
/// Subject.
pub const SUB: &str = "sub";

/// Claims every credential must carry.
pub const REQUIRED_CLAIMS: [&str; 2] = [ISS, VCT];

/// Claims that must never be selectively disclosed.
pub const NEVER_SELECTIVELY_DISCLOSED: [&str; 7] = [ISS, VCT, VCT_INTEGRITY, NBF, EXP, CNF, STATUS];

/// Whether `name` is a registered claim.
pub fn is_well_known(name: &str) -> bool {
    NEVER_SELECTIVELY_DISCLOSED.contains(&name) || name == IAT || name == SUB
}
