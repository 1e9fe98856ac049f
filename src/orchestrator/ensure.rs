//! Idempotent creation of propagation pull requests.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::cascade::{PropagationCandidate, tagged_description, tagged_title};
use crate::host::{NewPullRequest, RepositoryHost};
use crate::types::{PullRequestId, RepoId, UserId};

use super::PullRequestOrchestrator;
use super::error::{OrchestrationError, Stage};

/// Result of ensuring a propagation pull request exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "pull_request", rename_all = "snake_case")]
pub enum EnsureOutcome {
    /// A new pull request was opened.
    Created(PullRequestId),
    /// An open pull request for the same branches already existed.
    Skipped(PullRequestId),
}

impl EnsureOutcome {
    pub fn pull_request(&self) -> PullRequestId {
        match self {
            EnsureOutcome::Created(id) | EnsureOutcome::Skipped(id) => *id,
        }
    }
}

/// Builds the sentinel-tagged pull request for a propagation candidate.
pub fn propagation_request(
    candidate: &PropagationCandidate,
    reviewer: Option<&UserId>,
) -> NewPullRequest {
    NewPullRequest {
        source: candidate.source.clone(),
        destination: candidate.destination.clone(),
        title: tagged_title(&candidate.title, &candidate.source, &candidate.destination),
        description: tagged_description(&candidate.source, &candidate.destination),
        reviewer: reviewer.cloned(),
    }
}

impl<H: RepositoryHost> PullRequestOrchestrator<H> {
    /// Ensures an open pull request exists from `candidate.source` into
    /// `candidate.destination`.
    ///
    /// Queries the host first and reuses any open pull request between the
    /// same branches. Otherwise opens one tagged with the sentinel, requesting
    /// `reviewer` when given. Host failures are reported with
    /// [`Stage::Create`] and not retried.
    #[instrument(
        skip(self, candidate, reviewer),
        fields(repo = %repo, source = %candidate.source, destination = %candidate.destination)
    )]
    pub async fn ensure_pull_request(
        &self,
        repo: &RepoId,
        candidate: &PropagationCandidate,
        reviewer: Option<&UserId>,
    ) -> Result<EnsureOutcome, OrchestrationError> {
        let existing = self
            .host
            .find_open_pull_request(repo, &candidate.source, &candidate.destination)
            .await
            .map_err(|e| OrchestrationError::new(Stage::Create, e))?;

        if let Some(id) = existing {
            debug!(pr = %id, "Propagation pull request already open");
            return Ok(EnsureOutcome::Skipped(id));
        }

        let request = propagation_request(candidate, reviewer);
        let id = self
            .host
            .create_pull_request(repo, &request)
            .await
            .map_err(|e| OrchestrationError::new(Stage::Create, e))?;

        info!(pr = %id, title = %request.title, "Opened propagation pull request");
        Ok(EnsureOutcome::Created(id))
    }
}
