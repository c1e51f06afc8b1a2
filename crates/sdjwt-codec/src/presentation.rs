//! # Presentation Selection
//!
//! Given a fully disclosed issuance, compute the smallest disclosure set
//! that reveals a chosen set of claims.
//!
//! For one target path, every ancestor (the path itself included) that
//! needs strictly more disclosures than its own parent was revealed by a
//! disclosure of its own, and that disclosure is required. Targets are
//! unioned. Wildcard targets select every matching element; targets that are
//! plain or absent select nothing. Selecting a container reveals only the
//! container: selectively disclosable members inside it must be targeted
//! themselves.

use std::collections::HashSet;

use tracing::debug;

use sdjwt_core::ClaimPath;
use sdjwt_crypto::Disclosure;

use crate::reconstruct::DisclosuresPerClaimPath;

/// Disclosures from `issued` needed to reveal `targets`, in issued order.
pub fn select_disclosures(
    issued: &[Disclosure],
    per_claim: &DisclosuresPerClaimPath,
    targets: &[ClaimPath],
) -> Vec<Disclosure> {
    let mut required: HashSet<&Disclosure> = HashSet::new();
    for target in targets {
        for path in per_claim.matching(target) {
            for ancestor in path.ancestors_inclusive() {
                if !per_claim.is_selectively_disclosed(&ancestor) {
                    continue;
                }
                if let Some(introducing) = per_claim.get(&ancestor).and_then(<[Disclosure]>::last) {
                    required.insert(introducing);
                }
            }
        }
    }

    let selected: Vec<Disclosure> = issued
        .iter()
        .filter(|d| required.contains(d))
        .cloned()
        .collect();
    debug!(
        targets = targets.len(),
        issued = issued.len(),
        selected = selected.len(),
        "selected disclosures for presentation"
    );
    selected
}
