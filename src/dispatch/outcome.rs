//! Delivery outcomes and the sink that records them.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::cascade::PropagationCandidate;
use crate::host::HostErrorKind;
use crate::orchestrator::{OrchestrationError, PropagationReport, Stage, SweepReport};
use crate::types::{DeliveryId, PullRequestId, RepoId};
use crate::webhooks::Intent;

/// Number of outcomes the log keeps by default.
pub const DEFAULT_OUTCOME_LOG_CAPACITY: usize = 100;

/// A serializable record of an [`OrchestrationError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<PullRequestId>,
    pub kind: HostErrorKind,
    pub message: String,
}

impl From<&OrchestrationError> for FailureRecord {
    fn from(err: &OrchestrationError) -> Self {
        FailureRecord {
            stage: err.stage,
            pull_request: err.pull_request,
            kind: err.cause.kind,
            message: err.to_string(),
        }
    }
}

fn records(failures: &[OrchestrationError]) -> Vec<FailureRecord> {
    failures.iter().map(FailureRecord::from).collect()
}

/// The result of one delivery's work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeResult {
    Propagated {
        candidates: Vec<PropagationCandidate>,
        created: Vec<PullRequestId>,
        skipped: Vec<PullRequestId>,
        deduplicated: Vec<String>,
        failures: Vec<FailureRecord>,
    },
    Swept {
        approved: Vec<PullRequestId>,
        merged: Vec<PullRequestId>,
        held: Vec<PullRequestId>,
        failures: Vec<FailureRecord>,
    },
    /// The operation aborted before touching any pull request.
    Failed { failure: FailureRecord },
}

impl OutcomeResult {
    /// Returns every failure this result carries.
    pub fn failures(&self) -> &[FailureRecord] {
        match self {
            OutcomeResult::Propagated { failures, .. } | OutcomeResult::Swept { failures, .. } => {
                failures
            }
            OutcomeResult::Failed { failure } => std::slice::from_ref(failure),
        }
    }
}

impl From<Result<PropagationReport, OrchestrationError>> for OutcomeResult {
    fn from(result: Result<PropagationReport, OrchestrationError>) -> Self {
        match result {
            Ok(report) => OutcomeResult::Propagated {
                failures: records(&report.failures),
                candidates: report.candidates,
                created: report.created,
                skipped: report.skipped,
                deduplicated: report.deduplicated,
            },
            Err(err) => OutcomeResult::Failed {
                failure: FailureRecord::from(&err),
            },
        }
    }
}

impl From<Result<SweepReport, OrchestrationError>> for OutcomeResult {
    fn from(result: Result<SweepReport, OrchestrationError>) -> Self {
        match result {
            Ok(report) => OutcomeResult::Swept {
                failures: records(&report.failures),
                approved: report.approved,
                merged: report.merged,
                held: report.held,
            },
            Err(err) => OutcomeResult::Failed {
                failure: FailureRecord::from(&err),
            },
        }
    }
}

/// The observable record of one detached unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub delivery: DeliveryId,
    pub repo: RepoId,
    pub intent: Intent,
    pub result: OutcomeResult,
    pub finished_at: DateTime<Utc>,
}

impl DeliveryOutcome {
    /// Returns true if nothing failed.
    pub fn is_success(&self) -> bool {
        self.result.failures().is_empty()
    }
}

/// Bounded in-memory history of recent outcomes, oldest first.
#[derive(Debug, Clone)]
pub struct OutcomeLog {
    inner: Arc<Mutex<VecDeque<DeliveryOutcome>>>,
    capacity: usize,
}

impl OutcomeLog {
    pub fn new(capacity: usize) -> Self {
        OutcomeLog {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Appends an outcome, evicting the oldest when full.
    pub fn record(&self, outcome: DeliveryOutcome) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(outcome);
    }

    /// Returns the retained outcomes, newest last.
    pub fn recent(&self) -> Vec<DeliveryOutcome> {
        let entries = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for OutcomeLog {
    fn default() -> Self {
        OutcomeLog::new(DEFAULT_OUTCOME_LOG_CAPACITY)
    }
}

fn log_outcome(outcome: &DeliveryOutcome) {
    let delivery_id = outcome.delivery.as_str();
    let repo = &outcome.repo;
    let intent = outcome.intent;

    match &outcome.result {
        OutcomeResult::Failed { failure } => {
            error!(
                delivery_id,
                %repo,
                %intent,
                stage = %failure.stage,
                error = %failure.message,
                "Delivery failed"
            );
        }
        result if !result.failures().is_empty() => {
            for failure in result.failures() {
                warn!(
                    delivery_id,
                    %repo,
                    %intent,
                    stage = %failure.stage,
                    pr = ?failure.pull_request,
                    error = %failure.message,
                    "Delivery completed with failure"
                );
            }
        }
        OutcomeResult::Propagated {
            candidates,
            created,
            skipped,
            ..
        } => {
            info!(
                delivery_id,
                %repo,
                candidates = candidates.len(),
                created = created.len(),
                skipped = skipped.len(),
                "Propagation complete"
            );
        }
        OutcomeResult::Swept {
            approved,
            merged,
            held,
            ..
        } => {
            info!(
                delivery_id,
                %repo,
                approved = approved.len(),
                merged = merged.len(),
                held = held.len(),
                "Sweep complete"
            );
        }
    }
}

/// Spawns the task that drains the outcome channel into `log`.
///
/// The task ends once every sender has been dropped.
pub fn spawn_outcome_sink(
    mut outcomes: mpsc::Receiver<DeliveryOutcome>,
    log: OutcomeLog,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(outcome) = outcomes.recv().await {
            log_outcome(&outcome);
            log.record(outcome);
        }
        debug!("Outcome channel closed; sink exiting");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostApiError;

    fn outcome(n: u64, result: OutcomeResult) -> DeliveryOutcome {
        DeliveryOutcome {
            delivery: DeliveryId::new(format!("d-{n}")),
            repo: RepoId::new("acme", "portal"),
            intent: Intent::SweepApprovals,
            result,
            finished_at: Utc::now(),
        }
    }

    fn swept() -> OutcomeResult {
        OutcomeResult::Swept {
            approved: vec![],
            merged: vec![],
            held: vec![],
            failures: vec![],
        }
    }

    #[test]
    fn log_keeps_newest_last_and_evicts_oldest() {
        let log = OutcomeLog::new(2);
        for n in 1..=3 {
            log.record(outcome(n, swept()));
        }

        let recent = log.recent();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].delivery, DeliveryId::new("d-2"));
        assert_eq!(recent[1].delivery, DeliveryId::new("d-3"));
    }

    #[test]
    fn zero_capacity_log_keeps_nothing() {
        let log = OutcomeLog::new(0);
        log.record(outcome(1, swept()));
        assert!(log.is_empty());
    }

    #[test]
    fn failed_result_reports_its_failure() {
        let err = OrchestrationError::new(Stage::Sweep, HostApiError::transient("timed out"));
        let result = OutcomeResult::from(Err::<SweepReport, _>(err));

        let failures = result.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].stage, Stage::Sweep);
        assert_eq!(failures[0].kind, HostErrorKind::Transient);
        assert!(!outcome(1, result).is_success());
    }

    #[test]
    fn sweep_report_converts() {
        let report = SweepReport {
            approved: vec![PullRequestId(1), PullRequestId(2)],
            merged: vec![PullRequestId(2)],
            held: vec![PullRequestId(1)],
            failures: vec![],
        };
        let result = OutcomeResult::from(Ok::<_, OrchestrationError>(report));

        assert_eq!(
            result,
            OutcomeResult::Swept {
                approved: vec![PullRequestId(1), PullRequestId(2)],
                merged: vec![PullRequestId(2)],
                held: vec![PullRequestId(1)],
                failures: vec![],
            }
        );
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(outcome(7, swept())).unwrap();
        assert_eq!(json["delivery"], "d-7");
        assert_eq!(json["intent"], "sweep_approvals");
        assert_eq!(json["result"]["status"], "swept");
        assert_eq!(json["repo"]["owner"], "acme");
    }

    #[tokio::test]
    async fn sink_records_until_channel_closes() {
        let (tx, rx) = mpsc::channel(4);
        let log = OutcomeLog::new(10);
        let sink = spawn_outcome_sink(rx, log.clone());

        tx.send(outcome(1, swept())).await.unwrap();
        tx.send(outcome(2, swept())).await.unwrap();
        drop(tx);
        sink.await.unwrap();

        assert_eq!(log.len(), 2);
    }
}
