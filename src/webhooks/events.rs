//! Bitbucket webhook event types.
//!
//! This module defines the typed representation of the webhook deliveries the
//! bot handles. The event kind comes from the `X-Event-Key` header; the body
//! is decoded by [`parse_webhook`](super::parse_webhook).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{MergeEvent, RepoId, UserId};

/// `X-Event-Key` of a merged pull request.
pub const EVENT_MERGE_COMPLETED: &str = "pullrequest:fulfilled";

/// `X-Event-Key` of a new pull request comment.
pub const EVENT_COMMENT_CREATED: &str = "pullrequest:comment_created";

/// The kind of a webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum EventKind {
    /// A pull request was merged.
    MergeCompleted,
    /// A comment was added to a pull request.
    CommentCreated,
    /// Any other event (approvals, updates, build status, pushes, ...).
    Other(String),
}

impl EventKind {
    /// Maps an `X-Event-Key` header value onto an event kind.
    pub fn from_event_key(key: &str) -> Self {
        match key {
            EVENT_MERGE_COMPLETED => EventKind::MergeCompleted,
            EVENT_COMMENT_CREATED => EventKind::CommentCreated,
            other => EventKind::Other(other.to_string()),
        }
    }

    /// Returns the `X-Event-Key` this kind corresponds to.
    pub fn as_event_key(&self) -> &str {
        match self {
            EventKind::MergeCompleted => EVENT_MERGE_COMPLETED,
            EventKind::CommentCreated => EVENT_COMMENT_CREATED,
            EventKind::Other(key) => key,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_event_key())
    }
}

/// The pull request a delivery refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestInfo {
    /// The branch being merged.
    pub source_branch: String,
    /// The branch being merged into.
    pub destination_branch: String,
    /// The pull request author.
    pub author: UserId,
    /// The pull request title.
    pub title: String,
}

/// A decoded webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// What happened.
    pub kind: EventKind,

    /// The repository the event belongs to.
    pub repo: RepoId,

    /// The pull request, for pull request events.
    pub pull_request: Option<PullRequestInfo>,

    /// The raw comment text, for comment events.
    pub comment: Option<String>,
}

impl WebhookEvent {
    /// Builds the merge event this delivery describes.
    ///
    /// Returns `None` when the delivery carries no pull request.
    pub fn merge_event(&self) -> Option<MergeEvent> {
        let pr = self.pull_request.as_ref()?;
        Some(MergeEvent {
            repo: self.repo.clone(),
            source_branch: pr.source_branch.clone(),
            destination_branch: pr.destination_branch.clone(),
            author: pr.author.clone(),
            title: pr.title.clone(),
        })
    }
}
