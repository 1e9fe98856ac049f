//! Core domain types for the cascade bot.
//!
//! This module contains the fundamental types used throughout the application,
//! designed to encode invariants via the type system.

pub mod branch;
pub mod ids;
pub mod merge;

pub use branch::{BranchCatalog, DEV_PREFIX, QA_PREFIX, Tier, UAT_PREFIX, site_token};
pub use ids::{DeliveryId, PullRequestId, RepoId, UserId};
pub use merge::MergeEvent;
