//! [`RepositoryHost`] implementation for Bitbucket Cloud.

use reqwest::StatusCode;
use tracing::debug;

use crate::cascade::{SENTINEL, carries_sentinel};
use crate::types::{PullRequestId, RepoId};

use super::client::{BitbucketClient, status_error};
use super::error::HostApiError;
use super::schema::{
    BranchRef, CreatePullRequestBody, CreatedPullRequest, EndpointBody, MergeBody, Page,
    PullRequestSummary, ReviewerBody,
};
use super::{NewPullRequest, OpenPullRequest, RepositoryHost};

const BRANCH_PAGE_LEN: &str = "100";
const PULL_REQUEST_PAGE_LEN: &str = "50";

/// Quotes a value as a Bitbucket query-language string literal.
fn bbql_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn open_between_query(source: &str, destination: &str) -> String {
    format!(
        "source.branch.name = {} AND destination.branch.name = {} AND state = \"OPEN\"",
        bbql_string(source),
        bbql_string(destination)
    )
}

fn open_sentinel_query() -> String {
    format!("title ~ {} AND state = \"OPEN\"", bbql_string(SENTINEL))
}

impl RepositoryHost for BitbucketClient {
    async fn list_branches(&self, repo: &RepoId) -> Result<Vec<String>, HostApiError> {
        let mut url = self.repo_url(repo, &["refs", "branches"])?;
        url.query_pairs_mut().append_pair("pagelen", BRANCH_PAGE_LEN);

        let branches: Vec<BranchRef> = self.get_all_pages("list branches", url).await?;
        debug!(%repo, count = branches.len(), "Listed branches");
        Ok(branches.into_iter().map(|b| b.name).collect())
    }

    async fn find_open_pull_request(
        &self,
        repo: &RepoId,
        source: &str,
        destination: &str,
    ) -> Result<Option<PullRequestId>, HostApiError> {
        let mut url = self.repo_url(repo, &["pullrequests"])?;
        url.query_pairs_mut()
            .append_pair("q", &open_between_query(source, destination))
            .append_pair("pagelen", PULL_REQUEST_PAGE_LEN);

        let page: Page<PullRequestSummary> = self
            .send_json("find open pull request", self.get(url))
            .await?;
        Ok(page.values.first().map(|pr| PullRequestId(pr.id)))
    }

    async fn create_pull_request(
        &self,
        repo: &RepoId,
        request: &NewPullRequest,
    ) -> Result<PullRequestId, HostApiError> {
        let url = self.repo_url(repo, &["pullrequests"])?;
        let body = CreatePullRequestBody {
            title: &request.title,
            description: &request.description,
            source: EndpointBody::branch(&request.source),
            destination: EndpointBody::branch(&request.destination),
            reviewers: request
                .reviewer
                .iter()
                .map(ReviewerBody::for_user)
                .collect(),
            close_source_branch: false,
        };

        let created: CreatedPullRequest = self
            .send_json("create pull request", self.post(url).json(&body))
            .await?;
        Ok(PullRequestId(created.id))
    }

    async fn list_open_sentinel_pull_requests(
        &self,
        repo: &RepoId,
    ) -> Result<Vec<OpenPullRequest>, HostApiError> {
        let mut url = self.repo_url(repo, &["pullrequests"])?;
        url.query_pairs_mut()
            .append_pair("q", &open_sentinel_query())
            .append_pair("pagelen", PULL_REQUEST_PAGE_LEN);

        let summaries: Vec<PullRequestSummary> = self
            .get_all_pages("list automation pull requests", url)
            .await?;

        // `~` matches case-insensitively; only the exact sentinel counts.
        Ok(summaries
            .into_iter()
            .filter(|pr| carries_sentinel(&pr.title))
            .map(|pr| OpenPullRequest {
                id: PullRequestId(pr.id),
                destination: pr.destination.branch.name,
            })
            .collect())
    }

    async fn approve_pull_request(
        &self,
        repo: &RepoId,
        id: PullRequestId,
    ) -> Result<(), HostApiError> {
        const OPERATION: &str = "approve pull request";
        let id_segment = id.0.to_string();
        let url = self.repo_url(repo, &["pullrequests", &id_segment, "approve"])?;

        let response = self.execute(OPERATION, self.post(url)).await?;
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::CONFLICT => {
                debug!(%repo, pr = %id, "Pull request already approved");
                Ok(())
            }
            status => Err(status_error(OPERATION, status, response).await),
        }
    }

    async fn merge_pull_request(
        &self,
        repo: &RepoId,
        id: PullRequestId,
    ) -> Result<(), HostApiError> {
        let id_segment = id.0.to_string();
        let url = self.repo_url(repo, &["pullrequests", &id_segment, "merge"])?;
        let body = MergeBody {
            close_source_branch: false,
        };

        self.send("merge pull request", self.post(url).json(&body))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbql_strings_are_escaped() {
        assert_eq!(bbql_string("dev/teamA"), "\"dev/teamA\"");
        assert_eq!(bbql_string("a\"b"), "\"a\\\"b\"");
        assert_eq!(bbql_string("a\\b"), "\"a\\\\b\"");
    }

    #[test]
    fn open_between_query_shape() {
        assert_eq!(
            open_between_query("dev/teamA", "qa/teamA"),
            "source.branch.name = \"dev/teamA\" AND destination.branch.name = \"qa/teamA\" AND state = \"OPEN\""
        );
    }

    #[test]
    fn sentinel_query_shape() {
        assert_eq!(
            open_sentinel_query(),
            "title ~ \"#AutoCascade\" AND state = \"OPEN\""
        );
    }
}
