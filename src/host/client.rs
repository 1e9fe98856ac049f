//! Bitbucket Cloud HTTP client.
//!
//! Wraps a `reqwest::Client` with the API base URL and the bot account's
//! credentials. Requests authenticate with HTTP basic auth (username plus app
//! password).

use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{trace, warn};

use crate::types::RepoId;

use super::error::HostApiError;
use super::schema::Page;

/// Upper bound on pages followed for one listing.
const MAX_PAGES: usize = 100;

/// Error type for client construction failures.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The base URL does not parse or cannot carry path segments.
    #[error("invalid Bitbucket API URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The underlying HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// A Bitbucket Cloud REST client authenticated as the bot account.
#[derive(Clone)]
pub struct BitbucketClient {
    http: Client,
    base_url: Url,
    username: String,
    password: SecretString,
}

impl BitbucketClient {
    /// Creates a client for the API rooted at `base_url`
    /// (e.g. `https://api.bitbucket.org/2.0/`).
    pub fn new(
        base_url: &str,
        username: impl Into<String>,
        password: SecretString,
    ) -> Result<Self, ClientError> {
        let http = Client::builder()
            .user_agent(concat!("auto-cascade/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_http_client(http, base_url, username, password)
    }

    /// Creates a client around a pre-configured `reqwest::Client`.
    pub fn with_http_client(
        http: Client,
        base_url: &str,
        username: impl Into<String>,
        password: SecretString,
    ) -> Result<Self, ClientError> {
        let invalid = |reason: String| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason,
        };
        let base_url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid("URL cannot carry a path".to_string()));
        }
        Ok(Self {
            http,
            base_url,
            username: username.into(),
            password,
        })
    }

    /// Returns the API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds `<base>/repositories/<owner>/<repo>/<segments...>`.
    ///
    /// Each segment is percent-encoded, so workspace uuids (`{...}`) and
    /// branch-free ids are safe to pass through verbatim.
    pub(super) fn repo_url(&self, repo: &RepoId, segments: &[&str]) -> Result<Url, HostApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| HostApiError::permanent("API base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(["repositories", repo.owner.as_str(), repo.repo.as_str()])
            .extend(segments);
        Ok(url)
    }

    /// Starts an authenticated GET request.
    pub(super) fn get(&self, url: Url) -> RequestBuilder {
        self.authenticated(self.http.get(url))
    }

    /// Starts an authenticated POST request.
    pub(super) fn post(&self, url: Url) -> RequestBuilder {
        self.authenticated(self.http.post(url))
    }

    fn authenticated(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.username, Some(self.password.expose_secret()))
    }

    /// Sends a request, returning the response whatever its status.
    pub(super) async fn execute(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<Response, HostApiError> {
        request
            .send()
            .await
            .map_err(|e| HostApiError::from_reqwest(operation, e))
    }

    /// Sends a request and fails on any non-success status.
    pub(super) async fn send(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<Response, HostApiError> {
        let response = self.execute(operation, request).await?;
        ensure_success(operation, response).await
    }

    /// Sends a request and decodes a JSON response body.
    pub(super) async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<T, HostApiError> {
        self.send(operation, request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| HostApiError::from_reqwest(operation, e))
    }

    /// Fetches every page of a paginated collection starting at `first`.
    pub(super) async fn get_all_pages<T: DeserializeOwned>(
        &self,
        operation: &str,
        first: Url,
    ) -> Result<Vec<T>, HostApiError> {
        let mut values = Vec::new();
        let mut next = Some(first);
        let mut pages = 0;

        while let Some(url) = next.take() {
            if pages == MAX_PAGES {
                warn!(operation, pages, "Pagination limit reached; listing truncated");
                break;
            }
            pages += 1;
            trace!(operation, %url, "Fetching page");

            let page: Page<T> = self.send_json(operation, self.get(url)).await?;
            values.extend(page.values);
            next = page
                .next
                .map(|link| {
                    Url::parse(&link).map_err(|e| {
                        HostApiError::permanent(format!(
                            "{operation} failed: invalid next link {link:?}: {e}"
                        ))
                    })
                })
                .transpose()?;
        }

        Ok(values)
    }
}

/// Turns a non-success response into a [`HostApiError`].
pub(super) async fn ensure_success(
    operation: &str,
    response: Response,
) -> Result<Response, HostApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(status_error(operation, status, response).await)
}

pub(super) async fn status_error(
    operation: &str,
    status: StatusCode,
    response: Response,
) -> HostApiError {
    let body = response.text().await.unwrap_or_default();
    HostApiError::from_status(status.as_u16(), operation, &body)
}

impl std::fmt::Debug for BitbucketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitbucketClient")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
