//! Shared-key authentication for webhook deliveries.
//!
//! Bitbucket webhooks carry no signature here; instead the webhook URL is
//! registered with a `?key=<secret>` query parameter. The key must match the
//! configured secret before anything else about the request is looked at.
//!
//! The comparison is constant-time: both the provided and the configured key
//! are run through HMAC-SHA256 under the configured key, and the two tags are
//! compared with the HMAC library's `verify_slice`. This hides both the
//! position of the first differing byte and the length of the secret.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verifies a provided shared key against the configured one.
///
/// Returns `false` for a missing or empty key. Never panics.
///
/// # Examples
///
/// ```
/// use auto_cascade::webhooks::verify_shared_key;
/// use secrecy::SecretString;
///
/// let expected = SecretString::new("s3cret".into());
///
/// assert!(verify_shared_key(Some("s3cret"), &expected));
/// assert!(!verify_shared_key(Some("guess"), &expected));
/// assert!(!verify_shared_key(None, &expected));
/// ```
pub fn verify_shared_key(provided: Option<&str>, expected: &SecretString) -> bool {
    let provided = match provided {
        Some(key) if !key.is_empty() => key,
        _ => return false,
    };
    let secret = expected.expose_secret().as_bytes();

    let Some(expected_tag) = compute_tag(secret, secret) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(provided.as_bytes());

    mac.verify_slice(&expected_tag).is_ok()
}

/// Computes the HMAC-SHA256 tag of `message` under `key`.
fn compute_tag(key: &[u8], message: &[u8]) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key).ok()?;
    mac.update(message);
    Some(mac.finalize().into_bytes().to_vec())
}
