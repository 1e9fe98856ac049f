//! Detached execution of webhook work.
//!
//! The HTTP layer acknowledges a delivery as soon as it is authenticated and
//! decoded. The work itself runs on its own tokio task via the [`Dispatcher`],
//! which reports a [`DeliveryOutcome`] on a result channel. The outcome sink
//! drains that channel, logs every outcome, and keeps the most recent ones in
//! an [`OutcomeLog`] for the deliveries endpoint.
//!
//! ```text
//! ┌─────────────┐     ┌────────────┐  spawn   ┌──────────────┐
//! │   axum      │ ──► │ Dispatcher │ ───────► │ orchestrator │
//! │  (200 OK)   │     └────────────┘          └──────┬───────┘
//! └─────────────┘                                    │ DeliveryOutcome
//!                                                    ▼
//!                                            ┌──────────────┐
//!                                            │ outcome sink │ ──► OutcomeLog
//!                                            └──────────────┘
//! ```
//!
//! Deliveries run concurrently with no ordering between them.

mod dispatcher;
mod outcome;
mod work;

pub use dispatcher::{DEFAULT_OUTCOME_CHANNEL_CAPACITY, Dispatcher, run_work};
pub use outcome::{
    DEFAULT_OUTCOME_LOG_CAPACITY, DeliveryOutcome, FailureRecord, OutcomeLog, OutcomeResult,
    spawn_outcome_sink,
};
pub use work::{Work, WorkItem};
