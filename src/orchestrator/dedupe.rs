//! Local de-duplication of propagation requests.
//!
//! Bitbucket may deliver the same merge more than once. The host's open pull
//! request list is the real guard against duplicates, but query-then-create is
//! not atomic. A [`DedupeWindow`] serialises attempts for the same
//! `(repository, source, destination, author)` and suppresses a repeat that
//! arrives within a configurable window after a successful attempt.
//!
//! A key is only remembered once its attempt succeeds. While an attempt is in
//! flight, a second request for the same key waits for it: if the first
//! attempt fails, the waiter runs its own.
//!
//! Disabled unless configured; see `DEDUPE_WINDOW_SECS`.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::watch;

use crate::types::{RepoId, UserId};

/// Identifies one logical propagation request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupeKey {
    pub repo: RepoId,
    pub source: String,
    pub destination: String,
    pub author: UserId,
}

#[derive(Debug)]
enum Entry {
    /// An attempt is running; the channel flips to `true` when it settles.
    InFlight(watch::Receiver<bool>),
    /// An attempt succeeded at this time.
    Succeeded(DateTime<Utc>),
}

/// Result of asking the window whether a key may run.
#[derive(Debug)]
pub enum Admission {
    /// No attempt is running or recently succeeded. The caller must hand the
    /// ticket back through [`DedupeWindow::settle`].
    Proceed(DedupeTicket),
    /// An attempt for this key succeeded within the window.
    Duplicate,
    /// Another attempt for this key is running. The receiver flips to `true`
    /// (or closes) when it settles.
    InFlight(watch::Receiver<bool>),
}

/// Permission to run one attempt for a key.
///
/// Dropping a ticket without settling it releases the key as if the attempt
/// had failed.
#[derive(Debug)]
pub struct DedupeTicket {
    key: DedupeKey,
    done: watch::Sender<bool>,
}

impl DedupeTicket {
    pub fn key(&self) -> &DedupeKey {
        &self.key
    }
}

/// Remembers in-flight and recently successful propagation requests.
#[derive(Debug)]
pub struct DedupeWindow {
    window: Duration,
    entries: Mutex<HashMap<DedupeKey, Entry>>,
}

impl DedupeWindow {
    /// Creates a window. Returns `None` for a non-positive duration.
    pub fn new(window: Duration) -> Option<Self> {
        (window > Duration::zero()).then(|| Self {
            window,
            entries: Mutex::new(HashMap::new()),
        })
    }

    /// Decides whether an attempt for `key` may start at `now`.
    pub fn admit(&self, key: &DedupeKey, now: DateTime<Utc>) -> Admission {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let window = self.window;
        entries.retain(|_, entry| match entry {
            Entry::Succeeded(at) => now - *at < window,
            // A closed channel means the ticket was dropped unsettled.
            Entry::InFlight(settled) => settled.has_changed().is_ok(),
        });

        match entries.get(key) {
            Some(Entry::Succeeded(_)) => Admission::Duplicate,
            Some(Entry::InFlight(settled)) => Admission::InFlight(settled.clone()),
            None => {
                let (done, settled) = watch::channel(false);
                entries.insert(key.clone(), Entry::InFlight(settled));
                Admission::Proceed(DedupeTicket {
                    key: key.clone(),
                    done,
                })
            }
        }
    }

    /// Waits out any in-flight attempt for `key`, then admits it.
    ///
    /// Returns `None` when an attempt for `key` succeeded within the window.
    pub async fn acquire(&self, key: &DedupeKey) -> Option<DedupeTicket> {
        loop {
            match self.admit(key, Utc::now()) {
                Admission::Proceed(ticket) => return Some(ticket),
                Admission::Duplicate => return None,
                Admission::InFlight(mut settled) => {
                    // An error means the ticket was dropped; re-admit either way.
                    let _ = settled.wait_for(|done| *done).await;
                }
            }
        }
    }

    /// Records the result of the attempt `ticket` was issued for.
    ///
    /// A success is remembered for the window. A failure forgets the key, so
    /// the next request for it (including one already waiting) runs again.
    pub fn settle(&self, ticket: DedupeTicket, succeeded: bool, now: DateTime<Utc>) {
        {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            if succeeded {
                entries.insert(ticket.key.clone(), Entry::Succeeded(now));
            } else {
                entries.remove(&ticket.key);
            }
        }
        ticket.done.send_replace(true);
    }

    /// Number of keys currently tracked, in flight or recently successful.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
