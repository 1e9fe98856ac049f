//! Bitbucket webhook payload parser.
//!
//! Decodes raw webhook JSON into a typed [`WebhookEvent`]. Unknown fields are
//! ignored; the handful of fields the bot relies on are validated explicitly so
//! that a malformed delivery is rejected with a precise reason.
//!
//! # Headers
//!
//! Bitbucket Cloud webhooks include:
//! - `X-Event-Key` - event kind (e.g. `pullrequest:fulfilled`)
//! - `X-Request-UUID` - unique delivery id
//!
//! Authentication happens before parsing, via the `key` query parameter.

use serde::Deserialize;
use thiserror::Error;

use crate::types::{RepoId, UserId};

use super::events::{EventKind, PullRequestInfo, WebhookEvent};

/// Error type for webhook parsing failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The body is not valid JSON, or a field has the wrong type.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A field the bot needs is absent or empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// Parses a webhook payload into a typed event.
///
/// `event_key` is the value of the `X-Event-Key` header. Every key parses;
/// keys the bot does not act on specially become [`EventKind::Other`].
///
/// # Examples
///
/// ```
/// use auto_cascade::webhooks::{EventKind, parse_webhook};
///
/// let payload = br#"{
///     "pullrequest": {
///         "title": "Fix login",
///         "author": { "uuid": "{a1}" },
///         "source": { "branch": { "name": "feature/login" } },
///         "destination": { "branch": { "name": "dev/teamA" } }
///     },
///     "repository": { "name": "portal", "full_name": "acme/portal" }
/// }"#;
///
/// let event = parse_webhook("pullrequest:fulfilled", payload).unwrap();
/// assert_eq!(event.kind, EventKind::MergeCompleted);
/// assert_eq!(event.repo.to_string(), "acme/portal");
/// ```
pub fn parse_webhook(event_key: &str, payload: &[u8]) -> Result<WebhookEvent, ParseError> {
    let raw: RawPayload = serde_json::from_slice(payload)?;

    let repo = raw
        .repository
        .ok_or(ParseError::MissingField("repository"))?
        .into_repo_id()?;

    let pull_request = raw
        .pullrequest
        .map(RawPullRequest::into_info)
        .transpose()?;

    let comment = raw
        .comment
        .and_then(|c| c.content)
        .and_then(|content| content.raw);

    Ok(WebhookEvent {
        kind: EventKind::from_event_key(event_key),
        repo,
        pull_request,
        comment,
    })
}

// ─── Raw payload structures ───
//
// These mirror Bitbucket's JSON shape. Fields are optional where Bitbucket is
// known to omit them; required ones are checked when converting.

#[derive(Debug, Deserialize)]
struct RawPayload {
    repository: Option<RawRepository>,
    pullrequest: Option<RawPullRequest>,
    comment: Option<RawComment>,
}

#[derive(Debug, Deserialize)]
struct RawRepository {
    name: Option<String>,
    full_name: Option<String>,
    owner: Option<RawAccount>,
}

#[derive(Debug, Deserialize)]
struct RawAccount {
    username: Option<String>,
    uuid: Option<String>,
    account_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPullRequest {
    title: Option<String>,
    author: Option<RawAccount>,
    source: Option<RawEndpoint>,
    destination: Option<RawEndpoint>,
}

#[derive(Debug, Deserialize)]
struct RawEndpoint {
    branch: Option<RawBranch>,
}

#[derive(Debug, Deserialize)]
struct RawBranch {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    content: Option<RawContent>,
}

#[derive(Debug, Deserialize)]
struct RawContent {
    raw: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl RawRepository {
    fn into_repo_id(self) -> Result<RepoId, ParseError> {
        if let Some(repo) = self.full_name.as_deref().and_then(RepoId::from_full_name) {
            return Ok(repo);
        }

        let name = non_empty(self.name).ok_or(ParseError::MissingField("repository.name"))?;
        let owner = self
            .owner
            .and_then(|owner| non_empty(owner.username).or_else(|| non_empty(owner.uuid)))
            .ok_or(ParseError::MissingField("repository.owner"))?;

        Ok(RepoId::new(owner, name))
    }
}

impl RawEndpoint {
    fn branch_name(endpoint: Option<Self>, field: &'static str) -> Result<String, ParseError> {
        endpoint
            .and_then(|e| e.branch)
            .and_then(|b| non_empty(b.name))
            .ok_or(ParseError::MissingField(field))
    }
}

impl RawPullRequest {
    fn into_info(self) -> Result<PullRequestInfo, ParseError> {
        let source_branch =
            RawEndpoint::branch_name(self.source, "pullrequest.source.branch.name")?;
        let destination_branch =
            RawEndpoint::branch_name(self.destination, "pullrequest.destination.branch.name")?;
        let author = self
            .author
            .and_then(|a| non_empty(a.uuid).or_else(|| non_empty(a.account_id)))
            .ok_or(ParseError::MissingField("pullrequest.author.uuid"))?;

        Ok(PullRequestInfo {
            source_branch,
            destination_branch,
            author: UserId::new(author),
            title: self.title.unwrap_or_default(),
        })
    }
}
