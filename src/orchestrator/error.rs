//! Orchestration error types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::host::HostApiError;
use crate::types::PullRequestId;

/// The orchestration step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Fetching the branch catalog before resolving a cascade.
    Catalog,
    /// Looking up or opening a propagation pull request.
    Create,
    /// Listing open automation pull requests for a sweep.
    Sweep,
    /// Approving an automation pull request.
    Approve,
    /// Merging an automation pull request.
    Merge,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Catalog => "catalog",
            Stage::Create => "create",
            Stage::Sweep => "sweep",
            Stage::Approve => "approve",
            Stage::Merge => "merge",
        })
    }
}

/// A failed orchestration step.
#[derive(Debug, Error)]
pub struct OrchestrationError {
    pub stage: Stage,

    /// The pull request being acted on, when there is one.
    pub pull_request: Option<PullRequestId>,

    #[source]
    pub cause: HostApiError,
}

impl OrchestrationError {
    pub fn new(stage: Stage, cause: HostApiError) -> Self {
        Self {
            stage,
            pull_request: None,
            cause,
        }
    }

    pub fn for_pull_request(stage: Stage, pull_request: PullRequestId, cause: HostApiError) -> Self {
        Self {
            stage,
            pull_request: Some(pull_request),
            cause,
        }
    }
}

impl fmt::Display for OrchestrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pull_request {
            Some(pr) => write!(f, "{} failed for pull request {}: {}", self.stage, pr, self.cause),
            None => write!(f, "{} failed: {}", self.stage, self.cause),
        }
    }
}
