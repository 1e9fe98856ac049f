//! The `#AutoCascade` sentinel.
//!
//! Every pull request the bot creates carries the sentinel in its title and
//! description. The sentinel is how the sweep finds automation pull requests,
//! how the resolver tells a propagated merge from an original one, and (as a
//! bare comment) how a human forces a cascade to re-run.

/// The marker that tags automation pull requests.
pub const SENTINEL: &str = "#AutoCascade";

/// Returns true if the text carries the sentinel anywhere.
pub fn carries_sentinel(text: &str) -> bool {
    text.contains(SENTINEL)
}

/// Strips any leading sentinels (and the whitespace around them) from a title.
///
/// Repeated cascades would otherwise accumulate one marker per hop. A sentinel
/// only counts when it stands alone: it must be followed by whitespace, the
/// end of the title, or another sentinel.
///
/// ```
/// use auto_cascade::cascade::strip_sentinel;
///
/// assert_eq!(strip_sentinel("#AutoCascade #AutoCascade Fix login"), "Fix login");
/// assert_eq!(strip_sentinel("Fix login"), "Fix login");
/// assert_eq!(strip_sentinel("#AutoCascadeFix login"), "#AutoCascadeFix login");
/// ```
pub fn strip_sentinel(title: &str) -> &str {
    let mut rest = title.trim_start();
    while let Some(stripped) = rest.strip_prefix(SENTINEL) {
        let standalone = stripped.is_empty()
            || stripped.starts_with(char::is_whitespace)
            || stripped.starts_with(SENTINEL);
        if !standalone {
            break;
        }
        rest = stripped.trim_start();
    }
    rest.trim_end()
}

/// Builds the title of a propagation pull request.
///
/// Falls back to `source -> destination` when the stripped title is empty.
pub fn tagged_title(title: &str, source: &str, destination: &str) -> String {
    let stripped = strip_sentinel(title);
    if stripped.is_empty() {
        format!("{} {} -> {}", SENTINEL, source, destination)
    } else {
        format!("{} {}", SENTINEL, stripped)
    }
}

/// Builds the description of a propagation pull request.
pub fn tagged_description(source: &str, destination: &str) -> String {
    format!(
        "{} {} -> {}, this branch will automatically be merged on successful build result+approval",
        SENTINEL, source, destination
    )
}

/// Returns true if a comment body is a manual re-trigger.
///
/// Only the bare sentinel counts, optionally wrapped in inline-code backticks
/// (some editors insert them automatically). Surrounding whitespace is ignored;
/// anything else, including trailing punctuation, is not a trigger.
pub fn is_trigger_comment(body: &str) -> bool {
    let body = body.trim();
    body == SENTINEL || body.strip_prefix('`').and_then(|b| b.strip_suffix('`')) == Some(SENTINEL)
}
