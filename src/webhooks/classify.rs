//! Maps webhook deliveries onto the work they require.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cascade::is_trigger_comment;

use super::events::EventKind;

/// What a delivery asks the bot to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Resolve the cascade for the delivery's merge and ensure its pull requests.
    PropagateMerge,
    /// Approve, and where allowed merge, every open automation pull request.
    SweepApprovals,
    /// Nothing to do.
    Ignore,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Intent::PropagateMerge => "propagate_merge",
            Intent::SweepApprovals => "sweep_approvals",
            Intent::Ignore => "ignore",
        })
    }
}

/// Classifies a delivery.
///
/// A completed merge propagates. A comment consisting only of the sentinel
/// re-triggers propagation for the commented pull request; any other comment
/// is ignored. Every other event kind (approvals, build results, pushes)
/// triggers a sweep.
pub fn classify(kind: &EventKind, comment: Option<&str>) -> Intent {
    match kind {
        EventKind::MergeCompleted => Intent::PropagateMerge,
        EventKind::CommentCreated if comment.is_some_and(is_trigger_comment) => {
            Intent::PropagateMerge
        }
        EventKind::CommentCreated => Intent::Ignore,
        EventKind::Other(_) => Intent::SweepApprovals,
    }
}
