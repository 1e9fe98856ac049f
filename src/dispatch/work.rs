//! Units of detached work.

use serde::{Deserialize, Serialize};

use crate::orchestrator::Trigger;
use crate::types::{DeliveryId, MergeEvent, RepoId};
use crate::webhooks::Intent;

/// What a delivery needs done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Work {
    /// Propagate a merge to the next tier.
    Propagate {
        event: MergeEvent,
        #[serde(default)]
        trigger: Trigger,
    },
    /// Approve and merge open automation pull requests.
    Sweep { repo: RepoId },
}

/// One delivery's work, tagged with its delivery id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub delivery: DeliveryId,
    pub work: Work,
}

impl WorkItem {
    pub fn propagate(delivery: DeliveryId, event: MergeEvent) -> Self {
        WorkItem {
            delivery,
            work: Work::Propagate {
                event,
                trigger: Trigger::Merge,
            },
        }
    }

    /// A propagation forced by a sentinel comment.
    pub fn retrigger(delivery: DeliveryId, event: MergeEvent) -> Self {
        WorkItem {
            delivery,
            work: Work::Propagate {
                event,
                trigger: Trigger::Comment,
            },
        }
    }

    pub fn sweep(delivery: DeliveryId, repo: RepoId) -> Self {
        WorkItem {
            delivery,
            work: Work::Sweep { repo },
        }
    }

    pub fn repo(&self) -> &RepoId {
        match &self.work {
            Work::Propagate { event, .. } => &event.repo,
            Work::Sweep { repo } => repo,
        }
    }

    pub fn intent(&self) -> Intent {
        match self.work {
            Work::Propagate { .. } => Intent::PropagateMerge,
            Work::Sweep { .. } => Intent::SweepApprovals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::merge_event;

    #[test]
    fn comment_work_is_tagged_as_retrigger() {
        let item = WorkItem::retrigger(DeliveryId::new("d-1"), merge_event("dev/teamA", "Fix"));
        assert!(matches!(
            item.work,
            Work::Propagate {
                trigger: Trigger::Comment,
                ..
            }
        ));
        assert_eq!(item.intent(), Intent::PropagateMerge);
    }

    #[test]
    fn trigger_defaults_to_merge_when_absent() {
        let event = merge_event("dev/teamA", "Fix");
        let mut value = serde_json::to_value(Work::Propagate {
            event: event.clone(),
            trigger: Trigger::Comment,
        })
        .unwrap();
        value.as_object_mut().unwrap().remove("trigger");

        let work: Work = serde_json::from_value(value).unwrap();
        assert_eq!(
            work,
            Work::Propagate {
                event,
                trigger: Trigger::Merge
            }
        );
    }
}
