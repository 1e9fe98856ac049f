//! Approval sweep over open automation pull requests.

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::host::RepositoryHost;
use crate::types::{PullRequestId, RepoId};

use super::PullRequestOrchestrator;
use super::error::{OrchestrationError, Stage};

/// What one sweep did.
#[derive(Debug, Default, Serialize)]
pub struct SweepReport {
    /// Pull requests approved in this sweep.
    pub approved: Vec<PullRequestId>,
    /// Approved pull requests that were then merged.
    pub merged: Vec<PullRequestId>,
    /// Approved pull requests left open because they target a gated tier.
    pub held: Vec<PullRequestId>,
    #[serde(skip)]
    pub failures: Vec<OrchestrationError>,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl<H: RepositoryHost> PullRequestOrchestrator<H> {
    /// Approves every open automation pull request and merges those whose
    /// destination is not a gated tier.
    ///
    /// Listing failure aborts the sweep with [`Stage::Sweep`]. Per pull
    /// request failures are collected and the sweep moves on; an approval is
    /// never rolled back, and a pull request whose approval failed is not
    /// merged.
    #[instrument(skip(self), fields(repo = %repo))]
    pub async fn sweep_approvals(&self, repo: &RepoId) -> Result<SweepReport, OrchestrationError> {
        let open = self
            .host
            .list_open_sentinel_pull_requests(repo)
            .await
            .map_err(|e| OrchestrationError::new(Stage::Sweep, e))?;
        debug!(count = open.len(), "Sweeping automation pull requests");

        let mut report = SweepReport::default();

        for pr in open {
            if let Err(cause) = self.host.approve_pull_request(repo, pr.id).await {
                warn!(pr = %pr.id, error = %cause, "Failed to approve automation pull request");
                report
                    .failures
                    .push(OrchestrationError::for_pull_request(Stage::Approve, pr.id, cause));
                continue;
            }
            report.approved.push(pr.id);

            let gated = self
                .policy
                .tier_of(&pr.destination)
                .is_some_and(|tier| tier.is_gated());
            if gated {
                info!(pr = %pr.id, destination = %pr.destination, "Approved; gated tier held for manual merge");
                report.held.push(pr.id);
                continue;
            }

            match self.host.merge_pull_request(repo, pr.id).await {
                Ok(()) => {
                    info!(pr = %pr.id, destination = %pr.destination, "Merged automation pull request");
                    report.merged.push(pr.id);
                }
                Err(cause) => {
                    warn!(pr = %pr.id, error = %cause, "Failed to merge automation pull request");
                    report
                        .failures
                        .push(OrchestrationError::for_pull_request(Stage::Merge, pr.id, cause));
                }
            }
        }

        Ok(report)
    }
}
