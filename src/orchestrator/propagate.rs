//! Propagation of a completed merge.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::cascade::{PropagationCandidate, carries_sentinel, resolve_cascade};
use crate::host::RepositoryHost;
use crate::types::{BranchCatalog, MergeEvent, PullRequestId, UserId};

use super::PullRequestOrchestrator;
use super::dedupe::DedupeKey;
use super::ensure::EnsureOutcome;
use super::error::{OrchestrationError, Stage};

/// What propagating one merge did.
#[derive(Debug, Default, Serialize)]
pub struct PropagationReport {
    /// Resolved candidates, in catalog order.
    pub candidates: Vec<PropagationCandidate>,
    pub created: Vec<PullRequestId>,
    pub skipped: Vec<PullRequestId>,
    /// Destinations suppressed by the de-duplication window.
    pub deduplicated: Vec<String>,
    #[serde(skip)]
    pub failures: Vec<OrchestrationError>,
}

impl PropagationReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Picks the reviewer for the pull requests a merge propagates to.
///
/// The merge author reviews, except when the merged pull request was itself an
/// automation pull request: its author is the bot account, which cannot be a
/// reviewer of its own pull requests.
pub fn reviewer_for(event: &MergeEvent) -> Option<UserId> {
    if carries_sentinel(&event.title) {
        None
    } else {
        Some(event.author.clone())
    }
}

/// What asked for a propagation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// A pull request was merged.
    #[default]
    Merge,
    /// A human commented the bare sentinel on the merged pull request.
    Comment,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Trigger::Merge => "merge",
            Trigger::Comment => "comment",
        })
    }
}

impl<H: RepositoryHost> PullRequestOrchestrator<H> {
    /// Resolves the cascade for a merge and ensures its pull requests.
    ///
    /// The branch catalog is fetched fresh. A catalog failure aborts with
    /// [`Stage::Catalog`]; a failure for one candidate is recorded in the
    /// report and the remaining candidates are still attempted.
    ///
    /// With a de-duplication window, merge-triggered candidates wait for any
    /// in-flight attempt on the same key and are suppressed after a recent
    /// success. Comment re-triggers bypass the window.
    #[instrument(
        skip(self, event, trigger),
        fields(repo = %event.repo, destination = %event.destination_branch, %trigger)
    )]
    pub async fn propagate_merge(
        &self,
        event: &MergeEvent,
        trigger: Trigger,
    ) -> Result<PropagationReport, OrchestrationError> {
        let branches = self
            .host
            .list_branches(&event.repo)
            .await
            .map_err(|e| OrchestrationError::new(Stage::Catalog, e))?;
        let catalog = BranchCatalog::new(branches);

        let candidates = resolve_cascade(event, &catalog, &self.policy);
        let reviewer = reviewer_for(event);
        let window = match trigger {
            Trigger::Merge => self.dedupe.as_deref(),
            Trigger::Comment => None,
        };
        let mut report = PropagationReport::default();

        for candidate in &candidates {
            let ticket = match window {
                Some(window) => {
                    let key = DedupeKey {
                        repo: event.repo.clone(),
                        source: candidate.source.clone(),
                        destination: candidate.destination.clone(),
                        author: event.author.clone(),
                    };
                    match window.acquire(&key).await {
                        Some(ticket) => Some(ticket),
                        None => {
                            info!(destination = %candidate.destination, "Suppressing duplicate propagation");
                            report.deduplicated.push(candidate.destination.clone());
                            continue;
                        }
                    }
                }
                None => None,
            };

            let result = self
                .ensure_pull_request(&event.repo, candidate, reviewer.as_ref())
                .await;
            if let (Some(window), Some(ticket)) = (window, ticket) {
                window.settle(ticket, result.is_ok(), Utc::now());
            }

            match result {
                Ok(EnsureOutcome::Created(id)) => report.created.push(id),
                Ok(EnsureOutcome::Skipped(id)) => report.skipped.push(id),
                Err(error) => {
                    warn!(
                        destination = %candidate.destination,
                        error = %error,
                        "Failed to ensure propagation pull request"
                    );
                    report.failures.push(error);
                }
            }
        }

        report.candidates = candidates;
        Ok(report)
    }
}
