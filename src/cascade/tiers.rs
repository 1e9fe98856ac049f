//! Site-scoped tier resolution.
//!
//! Tier order is `development < dev < qa < uat < release`. A candidate's
//! destination is always exactly one tier above its source.

use tracing::{debug, warn};

use crate::types::{BranchCatalog, MergeEvent, site_token};

use super::policy::CascadePolicy;
use super::resolver::{PropagationCandidate, PropagationMode, propagation_mode};

pub(super) fn resolve(
    event: &MergeEvent,
    catalog: &BranchCatalog,
    policy: &CascadePolicy,
) -> Vec<PropagationCandidate> {
    let destination = event.destination_branch.as_str();

    let Some(tier) = policy.tier_of(destination) else {
        debug!(destination, "Merge destination has no tier; nothing to cascade");
        return Vec::new();
    };
    let Some(next_tier) = tier.next() else {
        debug!(destination, "Merge destination is the last tier; cascade ends");
        return Vec::new();
    };

    let site = site_token(destination);
    let from_development = policy.is_development(destination);

    // The development branch has no site and fans out to every first-tier branch.
    let next_hops: Vec<&str> = catalog
        .iter()
        .filter(|name| policy.tier_of(name) == Some(next_tier))
        .filter(|name| from_development || site_token(name) == site)
        .collect();

    match propagation_mode(event, policy) {
        PropagationMode::SiteScoped => {
            let Some((first, rest)) = next_hops.split_first() else {
                debug!(destination, %next_tier, "No downstream branch for this site");
                return Vec::new();
            };
            if !rest.is_empty() {
                warn!(
                    destination,
                    chosen = first,
                    ignored = ?rest,
                    "Several next-tier branches share this site; using the first"
                );
            }
            vec![PropagationCandidate::new(event, first)]
        }
        PropagationMode::Broadcast => next_hops
            .into_iter()
            .map(|name| PropagationCandidate::new(event, name))
            .collect(),
    }
}
