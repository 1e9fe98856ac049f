//! Bitbucket Cloud REST response and request schemas.
//!
//! Only the fields the bot reads are modelled; everything else in Bitbucket's
//! responses is ignored.

use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// One page of a paginated collection.
#[derive(Debug, Deserialize)]
pub(super) struct Page<T> {
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
    /// Absolute URL of the next page; absent on the last page.
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BranchRef {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct PullRequestSummary {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    pub destination: EndpointRef,
}

#[derive(Debug, Deserialize)]
pub(super) struct EndpointRef {
    pub branch: BranchRef,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreatedPullRequest {
    pub id: u64,
}

#[derive(Debug, Serialize)]
pub(super) struct CreatePullRequestBody<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub source: EndpointBody<'a>,
    pub destination: EndpointBody<'a>,
    pub reviewers: Vec<ReviewerBody<'a>>,
    pub close_source_branch: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct EndpointBody<'a> {
    pub branch: BranchBody<'a>,
}

impl<'a> EndpointBody<'a> {
    pub fn branch(name: &'a str) -> Self {
        EndpointBody {
            branch: BranchBody { name },
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct BranchBody<'a> {
    pub name: &'a str,
}

/// A reviewer reference. Bitbucket user uuids are brace-wrapped; anything
/// else is an Atlassian account id.
#[derive(Debug, Serialize)]
pub(super) struct ReviewerBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<&'a str>,
}

impl<'a> ReviewerBody<'a> {
    pub fn for_user(user: &'a UserId) -> Self {
        let id = user.as_str();
        if id.starts_with('{') {
            ReviewerBody {
                uuid: Some(id),
                account_id: None,
            }
        } else {
            ReviewerBody {
                uuid: None,
                account_id: Some(id),
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct MergeBody {
    pub close_source_branch: bool,
}
