//! Webhook handling for Bitbucket Cloud events.
//!
//! This module provides:
//! - Shared-key verification for incoming deliveries
//! - Typed decoding of webhook payloads
//! - Classification of a delivery into the work it requires

pub mod auth;
pub mod classify;
pub mod events;
pub mod parser;

pub use auth::verify_shared_key;
pub use classify::{Intent, classify};
pub use events::{
    EVENT_COMMENT_CREATED, EVENT_MERGE_COMPLETED, EventKind, PullRequestInfo, WebhookEvent,
};
pub use parser::{ParseError, parse_webhook};
