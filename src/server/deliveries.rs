//! Recent delivery outcomes.

use axum::Json;
use axum::extract::State;

use super::AppState;
use crate::dispatch::DeliveryOutcome;
use crate::host::RepositoryHost;

/// Deliveries handler.
///
/// Returns the retained [`DeliveryOutcome`] records as a JSON array, newest
/// last. Only outcomes of finished work appear; a delivery still running is
/// not listed.
pub async fn deliveries_handler<H: RepositoryHost + 'static>(
    State(app_state): State<AppState<H>>,
) -> Json<Vec<DeliveryOutcome>> {
    Json(app_state.outcomes().recent())
}
