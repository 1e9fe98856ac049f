//! The detached-task boundary.

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info_span, warn};

use crate::host::RepositoryHost;
use crate::orchestrator::PullRequestOrchestrator;

use super::outcome::{DeliveryOutcome, OutcomeResult};
use super::work::{Work, WorkItem};

/// Capacity of the outcome channel between dispatched tasks and the sink.
pub const DEFAULT_OUTCOME_CHANNEL_CAPACITY: usize = 256;

/// Runs webhook work on detached tokio tasks.
pub struct Dispatcher<H> {
    orchestrator: PullRequestOrchestrator<H>,
    outcomes: mpsc::Sender<DeliveryOutcome>,
}

impl<H> Clone for Dispatcher<H> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: self.orchestrator.clone(),
            outcomes: self.outcomes.clone(),
        }
    }
}

impl<H: RepositoryHost + 'static> Dispatcher<H> {
    pub fn new(
        orchestrator: PullRequestOrchestrator<H>,
        outcomes: mpsc::Sender<DeliveryOutcome>,
    ) -> Self {
        Self {
            orchestrator,
            outcomes,
        }
    }

    pub fn orchestrator(&self) -> &PullRequestOrchestrator<H> {
        &self.orchestrator
    }

    /// Spawns `item` and returns immediately.
    ///
    /// The outcome is sent on the result channel when the work finishes. The
    /// returned handle may be dropped; the task keeps running.
    pub fn submit(&self, item: WorkItem) -> JoinHandle<()> {
        let orchestrator = self.orchestrator.clone();
        let outcomes = self.outcomes.clone();
        let span = info_span!(
            "delivery",
            delivery_id = %item.delivery,
            repo = %item.repo(),
            intent = %item.intent()
        );

        tokio::spawn(
            async move {
                let outcome = run_work(&orchestrator, item).await;
                if outcomes.send(outcome).await.is_err() {
                    warn!("Outcome sink has shut down; dropping delivery outcome");
                }
            }
            .instrument(span),
        )
    }
}

/// Runs one unit of work to completion and describes what happened.
pub async fn run_work<H: RepositoryHost>(
    orchestrator: &PullRequestOrchestrator<H>,
    item: WorkItem,
) -> DeliveryOutcome {
    let intent = item.intent();
    let repo = item.repo().clone();
    debug!(%repo, %intent, "Running delivery");

    let result = match &item.work {
        Work::Propagate { event, trigger } => {
            OutcomeResult::from(orchestrator.propagate_merge(event, *trigger).await)
        }
        Work::Sweep { repo } => OutcomeResult::from(orchestrator.sweep_approvals(repo).await),
    };

    DeliveryOutcome {
        delivery: item.delivery,
        repo,
        intent,
        result,
        finished_at: Utc::now(),
    }
}
