//! Auto Cascade - a Bitbucket bot that carries merged changes up a chain of
//! environment branches.
//!
//! A merge into `dev/<site>` opens a pull request into `qa/<site>`; once that is
//! built and approved the bot merges it, which opens the `uat/<site>` pull
//! request, and so on. `uat` and `release` pull requests are approved but left
//! for a human to merge.

pub mod cascade;
pub mod config;
pub mod dispatch;
pub mod host;
pub mod orchestrator;
pub mod server;
pub mod types;
pub mod webhooks;

#[cfg(test)]
pub(crate) mod test_utils;
