//! Shared test utilities: an in-memory repository host and arbitrary
//! generators for property-based testing.

use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use proptest::prelude::*;

use crate::cascade::carries_sentinel;
use crate::host::{HostApiError, NewPullRequest, OpenPullRequest, RepositoryHost};
use crate::types::{MergeEvent, PullRequestId, RepoId, UserId};

// ─── Arbitrary generators ───

pub fn arb_site() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z0-9]{0,8}".prop_map(String::from)
}

pub fn arb_title() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z0-9 ]{0,30}".prop_map(String::from),
        "[A-Za-z0-9 ]{0,30}".prop_map(|t| format!("#AutoCascade {t}")),
    ]
}

pub fn arb_merge_into(destination: String) -> impl Strategy<Value = MergeEvent> {
    (arb_title(), "\\{[a-f0-9]{8}\\}").prop_map(move |(title, author)| MergeEvent {
        repo: RepoId::new("acme", "portal"),
        source_branch: "feature/x".to_string(),
        destination_branch: destination.clone(),
        author: UserId::new(author),
        title,
    })
}

pub fn merge_event(destination: &str, title: &str) -> MergeEvent {
    MergeEvent {
        repo: RepoId::new("acme", "portal"),
        source_branch: "feature/x".to_string(),
        destination_branch: destination.to_string(),
        author: UserId::new("{author}"),
        title: title.to_string(),
    }
}

// ─── FakeHost ───

/// A host operation, for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeOp {
    ListBranches,
    FindOpen,
    Create,
    ListSentinel,
    Approve,
    Merge,
}

/// A pull request held by [`FakeHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakePullRequest {
    pub id: PullRequestId,
    pub source: String,
    pub destination: String,
    pub title: String,
    pub description: String,
    pub reviewer: Option<UserId>,
    pub open: bool,
    pub approved: bool,
}

#[derive(Debug)]
struct Failure {
    op: FakeOp,
    pull_request: Option<PullRequestId>,
    destination: Option<String>,
    status: u16,
    once: bool,
}

/// Holds the next call of one operation until opened.
#[derive(Debug, Default)]
pub struct FakeGate {
    arrived: Notify,
    release: Notify,
}

impl FakeGate {
    /// Resolves once a call has reached the gate.
    pub async fn arrived(&self) {
        self.arrived.notified().await;
    }

    /// Lets the held call continue.
    pub fn open(&self) {
        self.release.notify_one();
    }
}

#[derive(Debug, Default)]
struct FakeHostState {
    branches: Vec<String>,
    pull_requests: Vec<FakePullRequest>,
    next_id: u64,
    failures: Vec<Failure>,
    gates: Vec<(FakeOp, Arc<FakeGate>)>,
    calls: Vec<FakeOp>,
}

/// An in-memory [`RepositoryHost`] for a single repository.
#[derive(Debug, Default)]
pub struct FakeHost {
    state: Mutex<FakeHostState>,
}

impl FakeHost {
    pub fn with_branches<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let host = FakeHost::default();
        host.lock().branches = names.into_iter().map(Into::into).collect();
        host
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeHostState> {
        self.state.lock().unwrap()
    }

    /// Adds an open pull request and returns its id.
    pub fn add_open_pull_request(&self, source: &str, destination: &str, title: &str) -> PullRequestId {
        let mut state = self.lock();
        state.next_id += 1;
        let id = PullRequestId(state.next_id);
        state.pull_requests.push(FakePullRequest {
            id,
            source: source.to_string(),
            destination: destination.to_string(),
            title: title.to_string(),
            description: String::new(),
            reviewer: None,
            open: true,
            approved: false,
        });
        id
    }

    /// Makes every call of `op` fail with `status`.
    pub fn fail(&self, op: FakeOp, status: u16) {
        self.lock().failures.push(Failure {
            op,
            pull_request: None,
            destination: None,
            status,
            once: false,
        });
    }

    /// Makes the next call of `op` fail with `status`.
    pub fn fail_once(&self, op: FakeOp, status: u16) {
        self.lock().failures.push(Failure {
            op,
            pull_request: None,
            destination: None,
            status,
            once: true,
        });
    }

    /// Holds the next call of `op` until the returned gate is opened.
    pub fn gate(&self, op: FakeOp) -> Arc<FakeGate> {
        let gate = Arc::new(FakeGate::default());
        self.lock().gates.push((op, Arc::clone(&gate)));
        gate
    }

    /// Makes `op` fail with `status` for one pull request.
    pub fn fail_pull_request(&self, op: FakeOp, id: PullRequestId, status: u16) {
        self.lock().failures.push(Failure {
            op,
            pull_request: Some(id),
            destination: None,
            status,
            once: false,
        });
    }

    /// Makes `op` fail with `status` when it targets `destination`.
    pub fn fail_destination(&self, op: FakeOp, destination: &str, status: u16) {
        self.lock().failures.push(Failure {
            op,
            pull_request: None,
            destination: Some(destination.to_string()),
            status,
            once: false,
        });
    }

    pub fn pull_requests(&self) -> Vec<FakePullRequest> {
        self.lock().pull_requests.clone()
    }

    pub fn pull_request(&self, id: PullRequestId) -> Option<FakePullRequest> {
        self.lock().pull_requests.iter().find(|pr| pr.id == id).cloned()
    }

    /// Number of open pull requests from `source` into `destination`.
    pub fn open_between(&self, source: &str, destination: &str) -> usize {
        self.lock()
            .pull_requests
            .iter()
            .filter(|pr| pr.open && pr.source == source && pr.destination == destination)
            .count()
    }

    pub fn calls(&self, op: FakeOp) -> usize {
        self.lock().calls.iter().filter(|c| **c == op).count()
    }

    async fn pass_gate(&self, op: FakeOp) {
        let gate = {
            let mut state = self.lock();
            let index = state.gates.iter().position(|(gated, _)| *gated == op);
            index.map(|i| state.gates.remove(i).1)
        };
        if let Some(gate) = gate {
            gate.arrived.notify_one();
            gate.release.notified().await;
        }
    }

    fn record(
        &self,
        op: FakeOp,
        pull_request: Option<PullRequestId>,
        destination: Option<&str>,
    ) -> Result<std::sync::MutexGuard<'_, FakeHostState>, HostApiError> {
        let mut state = self.lock();
        state.calls.push(op);
        let index = state.failures.iter().position(|f| {
            f.op == op
                && f.pull_request.is_none_or(|id| Some(id) == pull_request)
                && f.destination.as_deref().is_none_or(|d| Some(d) == destination)
        });
        let injected = index.map(|i| {
            let status = state.failures[i].status;
            if state.failures[i].once {
                state.failures.remove(i);
            }
            status
        });
        match injected {
            Some(status) => Err(HostApiError::from_status(status, "fake host", "injected failure")),
            None => Ok(state),
        }
    }
}

impl RepositoryHost for FakeHost {
    async fn list_branches(&self, _repo: &RepoId) -> Result<Vec<String>, HostApiError> {
        self.pass_gate(FakeOp::ListBranches).await;
        let state = self.record(FakeOp::ListBranches, None, None)?;
        Ok(state.branches.clone())
    }

    async fn find_open_pull_request(
        &self,
        _repo: &RepoId,
        source: &str,
        destination: &str,
    ) -> Result<Option<PullRequestId>, HostApiError> {
        self.pass_gate(FakeOp::FindOpen).await;
        let state = self.record(FakeOp::FindOpen, None, Some(destination))?;
        Ok(state
            .pull_requests
            .iter()
            .find(|pr| pr.open && pr.source == source && pr.destination == destination)
            .map(|pr| pr.id))
    }

    async fn create_pull_request(
        &self,
        _repo: &RepoId,
        request: &NewPullRequest,
    ) -> Result<PullRequestId, HostApiError> {
        self.pass_gate(FakeOp::Create).await;
        let mut state = self.record(FakeOp::Create, None, Some(&request.destination))?;
        state.next_id += 1;
        let id = PullRequestId(state.next_id);
        state.pull_requests.push(FakePullRequest {
            id,
            source: request.source.clone(),
            destination: request.destination.clone(),
            title: request.title.clone(),
            description: request.description.clone(),
            reviewer: request.reviewer.clone(),
            open: true,
            approved: false,
        });
        Ok(id)
    }

    async fn list_open_sentinel_pull_requests(
        &self,
        _repo: &RepoId,
    ) -> Result<Vec<OpenPullRequest>, HostApiError> {
        self.pass_gate(FakeOp::ListSentinel).await;
        let state = self.record(FakeOp::ListSentinel, None, None)?;
        Ok(state
            .pull_requests
            .iter()
            .filter(|pr| pr.open && carries_sentinel(&pr.title))
            .map(|pr| OpenPullRequest {
                id: pr.id,
                destination: pr.destination.clone(),
            })
            .collect())
    }

    async fn approve_pull_request(&self, _repo: &RepoId, id: PullRequestId) -> Result<(), HostApiError> {
        self.pass_gate(FakeOp::Approve).await;
        let mut state = self.record(FakeOp::Approve, Some(id), None)?;
        match state.pull_requests.iter_mut().find(|pr| pr.id == id) {
            Some(pr) => {
                pr.approved = true;
                Ok(())
            }
            None => Err(HostApiError::from_status(404, "approve pull request", "not found")),
        }
    }

    async fn merge_pull_request(&self, _repo: &RepoId, id: PullRequestId) -> Result<(), HostApiError> {
        self.pass_gate(FakeOp::Merge).await;
        let mut state = self.record(FakeOp::Merge, Some(id), None)?;
        match state.pull_requests.iter_mut().find(|pr| pr.id == id && pr.open) {
            Some(pr) => {
                pr.open = false;
                Ok(())
            }
            None => Err(HostApiError::from_status(404, "merge pull request", "not found")),
        }
    }
}
