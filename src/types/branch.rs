//! Environment tiers and branch catalogs.
//!
//! A branch name encodes two facets: the environment tier it belongs to and an
//! optional site token identifying the deployment target. Tier membership
//! depends on the configured release prefix and development branch name, so
//! classification itself lives on [`CascadePolicy`](crate::cascade::CascadePolicy);
//! this module holds the policy-independent pieces.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of first-tier environment branches.
pub const DEV_PREFIX: &str = "dev";
/// Prefix of QA environment branches.
pub const QA_PREFIX: &str = "qa";
/// Prefix of UAT (staging) environment branches.
pub const UAT_PREFIX: &str = "uat";

/// An environment stage.
///
/// The derived ordering is the cascade order: a change always flows from a
/// lower tier to the tier immediately above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// The shared development branch (e.g. `develop`). Has no site token.
    Development,
    /// `dev*` branches.
    Dev,
    /// `qa*` branches.
    Qa,
    /// `uat*` branches.
    Uat,
    /// Branches under the configured release prefix.
    Release,
}

impl Tier {
    /// Returns the tier immediately after this one, or `None` at the end of
    /// the chain.
    pub fn next(self) -> Option<Tier> {
        match self {
            Tier::Development => Some(Tier::Dev),
            Tier::Dev => Some(Tier::Qa),
            Tier::Qa => Some(Tier::Uat),
            Tier::Uat => Some(Tier::Release),
            Tier::Release => None,
        }
    }

    /// Returns true if merges into this tier require a human or build gate.
    ///
    /// Automation pull requests targeting a gated tier are approved but never
    /// merged by the sweep.
    pub fn is_gated(self) -> bool {
        matches!(self, Tier::Uat | Tier::Release)
    }

    /// Zero-based position in the cascade order.
    pub fn rank(self) -> u8 {
        match self {
            Tier::Development => 0,
            Tier::Dev => 1,
            Tier::Qa => 2,
            Tier::Uat => 3,
            Tier::Release => 4,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Development => "development",
            Tier::Dev => "dev",
            Tier::Qa => "qa",
            Tier::Uat => "uat",
            Tier::Release => "release",
        };
        f.write_str(name)
    }
}

/// Extracts the site token from a branch name.
///
/// The site token is the text after the first `/`, up to the first `_` that
/// follows it (or the end of the name). Branches without a `/`, or with
/// nothing after it, have no site token.
///
/// ```
/// use auto_cascade::types::site_token;
///
/// assert_eq!(site_token("qa/teamA"), Some("teamA"));
/// assert_eq!(site_token("release/appleufi_1.0"), Some("appleufi"));
/// assert_eq!(site_token("develop"), None);
/// ```
pub fn site_token(name: &str) -> Option<&str> {
    let (_, rest) = name.split_once('/')?;
    let token = match rest.split_once('_') {
        Some((token, _)) => token,
        None => rest,
    };
    if token.is_empty() { None } else { Some(token) }
}

/// The branch names of one repository at one point in time.
///
/// Names are kept sorted and de-duplicated so that resolution is
/// deterministic regardless of the order the host returned them in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchCatalog {
    names: Vec<String>,
}

impl BranchCatalog {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        names.sort();
        names.dedup();
        BranchCatalog { names }
    }

    /// Iterates over branch names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.binary_search_by(|n| n.as_str().cmp(name)).is_ok()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
