//! Cascade policy: tier classification and strategy selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::types::{DEV_PREFIX, QA_PREFIX, Tier, UAT_PREFIX};

/// Default prefix of release branches.
pub const DEFAULT_RELEASE_PREFIX: &str = "release/";
/// Default name of the shared development branch.
pub const DEFAULT_DEVELOPMENT_BRANCH: &str = "develop";

/// How the resolver picks propagation targets.
///
/// Chosen once at construction time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CascadeStrategy {
    /// Walk `development → dev → qa → uat → release`, keeping each site's
    /// branches in their own lane.
    #[default]
    SiteScopedTiers,

    /// Walk release branches in ascending version order, ending at the
    /// development branch after the newest release.
    VersionOrderedReleases,
}

impl CascadeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CascadeStrategy::SiteScopedTiers => "site-scoped",
            CascadeStrategy::VersionOrderedReleases => "version-ordered",
        }
    }
}

impl fmt::Display for CascadeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a strategy name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown cascade strategy '{0}' (expected 'site-scoped' or 'version-ordered')")]
pub struct UnknownStrategy(pub String);

impl FromStr for CascadeStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "site-scoped" | "site_scoped" | "tiers" => Ok(CascadeStrategy::SiteScopedTiers),
            "version-ordered" | "version_ordered" | "releases" => {
                Ok(CascadeStrategy::VersionOrderedReleases)
            }
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}

/// Configuration of the environment-branch chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadePolicy {
    /// Prefix identifying release-tier branches (e.g. `release/`).
    pub release_branch_prefix: String,

    /// Name of the shared development branch (e.g. `develop`).
    pub development_branch_name: String,

    /// Which resolution strategy to apply.
    pub strategy: CascadeStrategy,
}

impl CascadePolicy {
    /// Creates a policy using the default (site-scoped) strategy.
    pub fn new(
        release_branch_prefix: impl Into<String>,
        development_branch_name: impl Into<String>,
    ) -> Self {
        CascadePolicy {
            release_branch_prefix: release_branch_prefix.into(),
            development_branch_name: development_branch_name.into(),
            strategy: CascadeStrategy::default(),
        }
    }

    /// Sets the resolution strategy.
    pub fn with_strategy(mut self, strategy: CascadeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Returns true if `name` is the development branch.
    pub fn is_development(&self, name: &str) -> bool {
        name == self.development_branch_name
    }

    /// Classifies a branch name into its tier.
    ///
    /// The development branch is matched by exact name first, so a development
    /// branch called `develop` is never mistaken for a `dev*` branch. Names
    /// matching no prefix (feature branches, `main`, ...) have no tier.
    pub fn tier_of(&self, name: &str) -> Option<Tier> {
        if self.is_development(name) {
            return Some(Tier::Development);
        }
        if !self.release_branch_prefix.is_empty() && name.starts_with(&self.release_branch_prefix)
        {
            return Some(Tier::Release);
        }
        if name.starts_with(UAT_PREFIX) {
            Some(Tier::Uat)
        } else if name.starts_with(QA_PREFIX) {
            Some(Tier::Qa)
        } else if name.starts_with(DEV_PREFIX) {
            Some(Tier::Dev)
        } else {
            None
        }
    }

    /// Returns the text after the release prefix, if `name` is a release branch.
    pub fn release_suffix<'a>(&self, name: &'a str) -> Option<&'a str> {
        if self.release_branch_prefix.is_empty() {
            return None;
        }
        name.strip_prefix(self.release_branch_prefix.as_str())
    }
}

impl Default for CascadePolicy {
    fn default() -> Self {
        CascadePolicy::new(DEFAULT_RELEASE_PREFIX, DEFAULT_DEVELOPMENT_BRANCH)
    }
}
