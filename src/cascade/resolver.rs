//! Cascade resolution entry point.
//!
//! Maps a merge event onto the propagation pull requests it requires. Pure and
//! total: branches that match no tier are ignored, and an unmatched merge
//! simply resolves to nothing.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{BranchCatalog, MergeEvent};

use super::policy::{CascadePolicy, CascadeStrategy};
use super::sentinel::{carries_sentinel, strip_sentinel};
use super::{releases, tiers};

/// A pull request the cascade needs to exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagationCandidate {
    /// The branch that just moved (the merge destination).
    pub source: String,
    /// The next branch in the chain.
    pub destination: String,
    /// The merge title with any leading sentinels removed.
    pub title: String,
}

impl PropagationCandidate {
    pub(super) fn new(event: &MergeEvent, destination: &str) -> Self {
        PropagationCandidate {
            source: event.destination_branch.clone(),
            destination: destination.to_string(),
            title: strip_sentinel(&event.title).to_string(),
        }
    }
}

/// How far a single merge fans out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropagationMode {
    /// An original merge into a tiered branch: one next hop, same site.
    SiteScoped,
    /// A merge into the development branch, or a merge that was itself a
    /// cascade step: every next-tier branch (of the same site, unless
    /// stepping off the development branch).
    Broadcast,
}

/// Decides the propagation mode for a merge.
pub fn propagation_mode(event: &MergeEvent, policy: &CascadePolicy) -> PropagationMode {
    if !policy.is_development(&event.destination_branch) && !carries_sentinel(&event.title) {
        PropagationMode::SiteScoped
    } else {
        PropagationMode::Broadcast
    }
}

/// Resolves the propagation candidates for a merge.
///
/// Candidates are returned in catalog (name) order.
pub fn resolve_cascade(
    event: &MergeEvent,
    catalog: &BranchCatalog,
    policy: &CascadePolicy,
) -> Vec<PropagationCandidate> {
    let candidates = match policy.strategy {
        CascadeStrategy::SiteScopedTiers => tiers::resolve(event, catalog, policy),
        CascadeStrategy::VersionOrderedReleases => releases::resolve(event, catalog, policy),
    };

    debug!(
        repo = %event.repo,
        destination = %event.destination_branch,
        strategy = %policy.strategy,
        candidates = candidates.len(),
        "Resolved cascade"
    );

    candidates
}
