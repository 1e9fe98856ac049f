//! Cascade resolution.
//!
//! Decides, from a completed merge, which downstream environment branches
//! need a propagating pull request.
//!
//! # Strategies
//!
//! - [`CascadeStrategy::SiteScopedTiers`]: `development → dev → qa → uat →
//!   release`, with each site's branches kept in their own lane.
//! - [`CascadeStrategy::VersionOrderedReleases`]: release branches in
//!   ascending version order, then back to the development branch.
//!
//! # Key Invariants
//!
//! 1. **Tier monotonicity**: under the tier strategy every candidate's
//!    destination is exactly one tier above its source.
//! 2. **No sentinel accumulation**: candidate titles never carry a leading
//!    sentinel, however many hops a change has travelled.
//! 3. **Totality**: resolution never fails; unmatched input yields no
//!    candidates.

pub mod policy;
mod releases;
pub mod resolver;
pub mod sentinel;
mod tiers;

#[cfg(test)]
mod resolver_tests;

pub use policy::{
    CascadePolicy, CascadeStrategy, DEFAULT_DEVELOPMENT_BRANCH, DEFAULT_RELEASE_PREFIX,
    UnknownStrategy,
};
pub use releases::ReleaseVersion;
pub use resolver::{PropagationCandidate, PropagationMode, propagation_mode, resolve_cascade};
pub use sentinel::{
    SENTINEL, carries_sentinel, is_trigger_comment, strip_sentinel, tagged_description,
    tagged_title,
};
