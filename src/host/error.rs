//! Repository host error types.
//!
//! Host failures are classified as transient or permanent from the HTTP
//! status (or the absence of one). No call is retried automatically; the
//! classification is carried so that logs and delivery outcomes say whether a
//! redelivery is likely to succeed.

use std::fmt;
use thiserror::Error;

/// Longest response-body excerpt kept in an error message.
const BODY_EXCERPT_LEN: usize = 200;

/// The kind of host API error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostErrorKind {
    /// Likely to succeed if attempted again.
    ///
    /// Examples:
    /// - HTTP 5xx (server errors)
    /// - HTTP 429 (rate limited)
    /// - Connection failures and timeouts
    Transient,

    /// Requires a change before it can succeed.
    ///
    /// Examples:
    /// - HTTP 4xx (bad credentials, missing repository, merge conflicts)
    /// - A response body that does not match the expected schema
    Permanent,
}

impl HostErrorKind {
    /// Classifies an HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => HostErrorKind::Transient,
            code if (500..600).contains(&code) => HostErrorKind::Transient,
            _ => HostErrorKind::Permanent,
        }
    }

    /// Returns true for [`HostErrorKind::Transient`].
    pub fn is_transient(&self) -> bool {
        matches!(self, HostErrorKind::Transient)
    }
}

/// A failed call against the repository host.
#[derive(Debug, Error)]
pub struct HostApiError {
    /// Transient or permanent.
    pub kind: HostErrorKind,

    /// The HTTP status code, if a response was received.
    pub status_code: Option<u16>,

    /// A human-readable description of the error.
    pub message: String,

    /// The underlying transport error, if any.
    #[source]
    pub source: Option<reqwest::Error>,
}

impl fmt::Display for HostApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "Bitbucket API error (HTTP {}): {}", code, self.message),
            None => write!(f, "Bitbucket API error: {}", self.message),
        }
    }
}

impl HostApiError {
    /// Creates an error from a non-success HTTP response.
    pub fn from_status(status: u16, operation: &str, body: &str) -> Self {
        let excerpt = excerpt(body);
        let message = if excerpt.is_empty() {
            format!("{operation} failed")
        } else {
            format!("{operation} failed: {excerpt}")
        };
        Self {
            kind: HostErrorKind::from_status(status),
            status_code: Some(status),
            message,
            source: None,
        }
    }

    /// Creates an error from a reqwest failure.
    ///
    /// Connection failures and timeouts are transient; decode failures are
    /// permanent.
    pub fn from_reqwest(operation: &str, err: reqwest::Error) -> Self {
        let status_code = err.status().map(|s| s.as_u16());
        let kind = match status_code {
            Some(code) => HostErrorKind::from_status(code),
            None if err.is_timeout() || err.is_connect() || err.is_request() => {
                HostErrorKind::Transient
            }
            None => HostErrorKind::Permanent,
        };
        Self {
            kind,
            status_code,
            message: format!("{operation} failed: {err}"),
            source: Some(err),
        }
    }

    /// Creates a permanent error without a transport source.
    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: HostErrorKind::Permanent,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a transient error without a transport source.
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: HostErrorKind::Transient,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if this error is transient.
    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

/// Collapses whitespace and truncates a response body for logging.
fn excerpt(body: &str) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => format!("{}...", &collapsed[..idx]),
        None => collapsed,
    }
}
