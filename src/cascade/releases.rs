//! Version-ordered release resolution.
//!
//! Release branches are `<release prefix><version>`, e.g. `release/2024.1.3`.
//! A merge into a release branch propagates to the next newer release, and a
//! merge into the newest release propagates back to the development branch.

use std::cmp::Ordering;
use std::fmt;

use tracing::{debug, warn};

use crate::types::{BranchCatalog, MergeEvent};

use super::policy::CascadePolicy;
use super::resolver::PropagationCandidate;

/// A dotted numeric release version such as `2024.1.3` or `v1.2`.
///
/// Missing trailing components compare as zero, so `1.2` equals `1.2.0`.
#[derive(Debug, Clone)]
pub struct ReleaseVersion {
    parts: Vec<u64>,
}

impl ReleaseVersion {
    /// Parses a version, accepting an optional leading `v`.
    ///
    /// Returns `None` for anything other than dot-separated non-negative
    /// integers.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.strip_prefix('v').unwrap_or(s);
        if s.is_empty() {
            return None;
        }
        let parts = s
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    None
                } else {
                    part.parse::<u64>().ok()
                }
            })
            .collect::<Option<Vec<_>>>()?;
        Some(ReleaseVersion { parts })
    }

    fn component(&self, i: usize) -> u64 {
        self.parts.get(i).copied().unwrap_or(0)
    }
}

impl PartialEq for ReleaseVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ReleaseVersion {}

impl PartialOrd for ReleaseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReleaseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.parts.iter().map(u64::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

pub(super) fn resolve(
    event: &MergeEvent,
    catalog: &BranchCatalog,
    policy: &CascadePolicy,
) -> Vec<PropagationCandidate> {
    let destination = event.destination_branch.as_str();

    if policy.is_development(destination) {
        debug!(destination, "Merge landed on the development branch; cascade ends");
        return Vec::new();
    }
    let Some(current) = policy
        .release_suffix(destination)
        .and_then(ReleaseVersion::parse)
    else {
        debug!(destination, "Merge destination is not a versioned release branch");
        return Vec::new();
    };

    let next = catalog
        .iter()
        .filter_map(|name| {
            let version = policy.release_suffix(name).and_then(ReleaseVersion::parse)?;
            (version > current).then_some((version, name))
        })
        .min_by(|(a, _), (b, _)| a.cmp(b));

    match next {
        Some((version, name)) => {
            debug!(destination, next = name, %version, "Cascading to next release");
            vec![PropagationCandidate::new(event, name)]
        }
        None if catalog.contains(&policy.development_branch_name) => {
            debug!(destination, "Newest release; cascading to development branch");
            vec![PropagationCandidate::new(
                event,
                &policy.development_branch_name,
            )]
        }
        None => {
            warn!(
                destination,
                development = %policy.development_branch_name,
                "Development branch missing from catalog; cascade ends"
            );
            Vec::new()
        }
    }
}
