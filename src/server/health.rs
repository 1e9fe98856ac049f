//! Liveness endpoint.

use axum::http::StatusCode;

/// Returns `200 OK` with the body `OK` while the process is serving.
///
/// Does not touch Bitbucket; a healthy response says nothing about the
/// credentials or the host's availability.
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
