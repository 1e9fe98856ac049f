//! Repository host collaborator.
//!
//! The orchestrator talks to the source-control host only through
//! [`RepositoryHost`]. [`BitbucketClient`] implements it against the Bitbucket
//! Cloud REST API; tests use the in-memory fake in `test_utils`.
//!
//! Every call is scoped by a [`RepoId`] and returns typed data. Nothing is
//! cached between calls.

mod bitbucket;
mod client;
mod error;
mod schema;

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::types::{PullRequestId, RepoId, UserId};

pub use client::{BitbucketClient, ClientError};
pub use error::{HostApiError, HostErrorKind};

/// A pull request to be opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPullRequest {
    pub source: String,
    pub destination: String,
    pub title: String,
    pub description: String,
    /// Requested reviewer. `None` when the only sensible reviewer would be
    /// the pull request's own author, which the host rejects.
    pub reviewer: Option<UserId>,
}

/// An open automation pull request, as seen by the approval sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenPullRequest {
    pub id: PullRequestId,
    pub destination: String,
}

/// Operations the cascade needs from the repository host.
///
/// # Example (fake for testing)
///
/// ```ignore
/// struct FixedBranches(Vec<String>);
///
/// impl RepositoryHost for FixedBranches {
///     async fn list_branches(&self, _repo: &RepoId) -> Result<Vec<String>, HostApiError> {
///         Ok(self.0.clone())
///     }
///     // ...
/// }
/// ```
pub trait RepositoryHost: Send + Sync {
    /// Lists every branch name in the repository.
    fn list_branches(
        &self,
        repo: &RepoId,
    ) -> impl Future<Output = Result<Vec<String>, HostApiError>> + Send;

    /// Finds the open pull request from `source` into `destination`, if any.
    fn find_open_pull_request(
        &self,
        repo: &RepoId,
        source: &str,
        destination: &str,
    ) -> impl Future<Output = Result<Option<PullRequestId>, HostApiError>> + Send;

    /// Opens a pull request and returns its id.
    fn create_pull_request(
        &self,
        repo: &RepoId,
        request: &NewPullRequest,
    ) -> impl Future<Output = Result<PullRequestId, HostApiError>> + Send;

    /// Lists every open pull request whose title carries the sentinel.
    fn list_open_sentinel_pull_requests(
        &self,
        repo: &RepoId,
    ) -> impl Future<Output = Result<Vec<OpenPullRequest>, HostApiError>> + Send;

    /// Approves a pull request as the bot account. Approving twice succeeds.
    fn approve_pull_request(
        &self,
        repo: &RepoId,
        id: PullRequestId,
    ) -> impl Future<Output = Result<(), HostApiError>> + Send;

    /// Merges a pull request, keeping its source branch.
    fn merge_pull_request(
        &self,
        repo: &RepoId,
        id: PullRequestId,
    ) -> impl Future<Output = Result<(), HostApiError>> + Send;
}
