//! Webhook endpoint handler.
//!
//! Accepts Bitbucket webhook deliveries, checks the shared key, decodes and
//! classifies the payload, and dispatches the resulting work before returning
//! 200 OK. The cascade itself runs on a detached task.

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::AppState;
use crate::dispatch::WorkItem;
use crate::host::RepositoryHost;
use crate::types::DeliveryId;
use crate::webhooks::{EventKind, Intent, ParseError, classify, parse_webhook, verify_shared_key};

/// Header name for the Bitbucket event key.
pub const HEADER_EVENT_KEY: &str = "x-event-key";
/// Header name for the Bitbucket delivery id.
pub const HEADER_REQUEST_UUID: &str = "x-request-uuid";

/// Errors that can occur when processing a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The `key` query parameter is missing or wrong.
    #[error("forbidden")]
    Forbidden,

    /// Missing required header.
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    /// The body could not be decoded.
    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] ParseError),

    /// A propagation was requested by a delivery that carries no pull request.
    #[error("payload has no pull request to propagate")]
    MissingPullRequest,
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::Forbidden => StatusCode::FORBIDDEN,
            WebhookError::MissingHeader(_)
            | WebhookError::InvalidPayload(_)
            | WebhookError::MissingPullRequest => StatusCode::BAD_REQUEST,
        };

        (status, self.to_string()).into_response()
    }
}

/// Query parameters of the webhook endpoint.
#[derive(Debug, Deserialize)]
pub struct WebhookQuery {
    pub key: Option<String>,
}

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - Query: `key=<shared key>`
/// - Required headers:
///   - `X-Event-Key`: event kind (e.g. `pullrequest:fulfilled`)
/// - Optional headers:
///   - `X-Request-UUID`: delivery id (generated when absent)
/// - Body: JSON webhook payload
///
/// # Response
///
/// - 200 OK: work dispatched, or nothing to do
/// - 400 Bad Request: missing header, undecodable payload, or a propagation
///   request without a pull request
/// - 403 Forbidden: missing or wrong key
pub async fn webhook_handler<H: RepositoryHost + 'static>(
    State(app_state): State<AppState<H>>,
    query: Result<Query<WebhookQuery>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), WebhookError> {
    // Authenticate before reading anything else from the request. A query
    // string that does not decode carries no usable key.
    let key = query.ok().and_then(|Query(query)| query.key);
    if !verify_shared_key(key.as_deref(), app_state.shared_key()) {
        warn!("Rejected webhook with missing or invalid key");
        return Err(WebhookError::Forbidden);
    }

    let event_key = get_header(&headers, HEADER_EVENT_KEY)?;
    let delivery_id = get_header(&headers, HEADER_REQUEST_UUID)
        .map(DeliveryId::new)
        .unwrap_or_else(|_| DeliveryId::generate());

    debug!(delivery_id = %delivery_id, event_key = %event_key, "Received webhook");

    let event = parse_webhook(&event_key, &body).inspect_err(|e| {
        warn!(delivery_id = %delivery_id, error = %e, "Rejected undecodable webhook");
    })?;
    let intent = classify(&event.kind, event.comment.as_deref());

    let item = match intent {
        Intent::Ignore => {
            debug!(delivery_id = %delivery_id, repo = %event.repo, "Ignoring delivery");
            return Ok((StatusCode::OK, "Ignored"));
        }
        Intent::PropagateMerge => {
            let merge = event.merge_event().ok_or_else(|| {
                warn!(delivery_id = %delivery_id, "Propagation requested without a pull request");
                WebhookError::MissingPullRequest
            })?;
            if event.kind == EventKind::CommentCreated {
                WorkItem::retrigger(delivery_id.clone(), merge)
            } else {
                WorkItem::propagate(delivery_id.clone(), merge)
            }
        }
        Intent::SweepApprovals => WorkItem::sweep(delivery_id.clone(), event.repo.clone()),
    };

    info!(
        delivery_id = %delivery_id,
        repo = %event.repo,
        event_key = %event_key,
        %intent,
        "Dispatching delivery"
    );
    // The task runs detached; its outcome arrives through the outcome sink.
    drop(app_state.dispatcher().submit(item));

    Ok((StatusCode::OK, "Accepted"))
}

/// Extracts a required header value as a string.
fn get_header(headers: &HeaderMap, name: &'static str) -> Result<String, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .ok_or(WebhookError::MissingHeader(name))
}
