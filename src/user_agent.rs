//! User-Agent string sent with remote version lookups.

/// Tool tag identifying this client to the arXiv API.
const TOOL_TAG: &str = "paper-library-tool";

/// Default User-Agent for remote requests.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("papershelf/{version} ({TOOL_TAG})")
}
