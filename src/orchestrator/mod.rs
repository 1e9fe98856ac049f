//! Pull request lifecycle orchestration.
//!
//! Two operations drive every cascade:
//!
//! - **Propagation** ([`PullRequestOrchestrator::propagate_merge`]): fetch the
//!   branch catalog, resolve the cascade, and ensure one sentinel-tagged pull
//!   request per candidate.
//! - **Sweep** ([`PullRequestOrchestrator::sweep_approvals`]): approve every
//!   open automation pull request and merge those whose destination is not a
//!   gated tier.
//!
//! # Key Invariants
//!
//! 1. **Idempotent creation**: an open pull request with the same source and
//!    destination is reused, never duplicated by a sequential caller.
//! 2. **Gated tiers are never auto-merged**: `uat` and `release` pull
//!    requests are approved and held.
//! 3. **Failures are isolated**: one candidate or pull request failing does not
//!    stop its siblings; every failure is reported.

mod dedupe;
mod ensure;
mod error;
mod propagate;
mod sweep;


use std::sync::Arc;

use crate::cascade::CascadePolicy;
use crate::host::RepositoryHost;

pub use dedupe::{Admission, DedupeKey, DedupeTicket, DedupeWindow};
pub use ensure::{EnsureOutcome, propagation_request};
pub use error::{OrchestrationError, Stage};
pub use propagate::{PropagationReport, Trigger, reviewer_for};
pub use sweep::SweepReport;

/// Runs cascade operations against a repository host.
///
/// Cheap to clone; clones share the host, the policy, and the de-duplication
/// window.
pub struct PullRequestOrchestrator<H> {
    host: Arc<H>,
    policy: Arc<CascadePolicy>,
    dedupe: Option<Arc<DedupeWindow>>,
}

impl<H> Clone for PullRequestOrchestrator<H> {
    fn clone(&self) -> Self {
        Self {
            host: Arc::clone(&self.host),
            policy: Arc::clone(&self.policy),
            dedupe: self.dedupe.clone(),
        }
    }
}

impl<H: RepositoryHost> PullRequestOrchestrator<H> {
    pub fn new(host: Arc<H>, policy: CascadePolicy) -> Self {
        Self {
            host,
            policy: Arc::new(policy),
            dedupe: None,
        }
    }

    /// Enables local de-duplication of propagation requests.
    pub fn with_dedupe(mut self, window: DedupeWindow) -> Self {
        self.dedupe = Some(Arc::new(window));
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn policy(&self) -> &CascadePolicy {
        &self.policy
    }
}
