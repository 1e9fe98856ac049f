//! The merge event that drives a cascade.

use serde::{Deserialize, Serialize};

use super::ids::{RepoId, UserId};

/// A completed merge of a pull request.
///
/// Produced once per delivery by the webhook decoder and consumed once by the
/// cascade resolver. For a manual re-trigger (an `#AutoCascade` comment) the
/// event describes the pull request the comment was made on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeEvent {
    /// The repository the pull request belongs to.
    pub repo: RepoId,
    /// The branch that was merged.
    pub source_branch: String,
    /// The branch that received the merge.
    pub destination_branch: String,
    /// The pull request author; becomes the reviewer of propagated pull requests.
    pub author: UserId,
    /// The merged pull request's title.
    pub title: String,
}
