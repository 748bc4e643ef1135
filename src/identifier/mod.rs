//! Identifier normalization for arXiv-style paper ids.
//!
//! Raw identifiers arrive in several historical shapes:
//!
//! - old style with a slash: `cond-mat/0102536v1`
//! - modern: `2101.00001v1` (no category)
//! - legacy underscore: `cs_0303006v1`, `math.GT_0512630`
//!
//! optionally wrapped in an `/abs/` or `/pdf/` URL and optionally carrying a
//! `.pdf` extension. [`parse`] turns any of these into an [`Identity`] and
//! never fails; [`looks_like_identifier`] is the strict gate used for
//! untrusted names such as directory entries.
//!
//! # Example
//!
//! ```
//! use papershelf_core::identifier::{parse, looks_like_identifier};
//!
//! let identity = parse("https://arxiv.org/abs/cond-mat/0102536v3");
//! assert_eq!(identity.category.as_deref(), Some("cond-mat"));
//! assert_eq!(identity.id_number, "0102536");
//! assert_eq!(identity.version, 3);
//!
//! assert!(!looks_like_identifier("my_notes_folder"));
//! ```

mod classify;
mod rules;

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

pub use classify::{IdentifierShape, classify, looks_like_identifier};
pub use rules::SplitRule;

use rules::VersionSuffix;

/// Version assumed when an identifier carries no `vN` suffix.
pub const DEFAULT_VERSION: u32 = 1;

/// Compiles a regex at static init; panics on invalid pattern.
pub(crate) fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Normalized `(category, idNumber, version)` triple.
///
/// A pure value: two identities are the same paper revision exactly when
/// their fields are equal. `(category, id_number)` is the stable key across
/// versions, see [`Identity::key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Archive/category prefix, absent for modern ids.
    pub category: Option<String>,
    /// Numeric id without version (`0102536`, `2101.00001`).
    pub id_number: String,
    /// Revision number, always >= 1.
    pub version: u32,
}

impl Identity {
    /// Builds an identity, clamping a zero version to [`DEFAULT_VERSION`].
    #[must_use]
    pub fn new(category: Option<&str>, id_number: &str, version: u32) -> Self {
        Self {
            category: category.filter(|c| !c.is_empty()).map(str::to_string),
            id_number: id_number.to_string(),
            version: version.max(DEFAULT_VERSION),
        }
    }

    /// Returns the version-independent registry key.
    #[must_use]
    pub fn key(&self) -> PaperKey {
        PaperKey {
            category: self.category.clone(),
            id_number: self.id_number.clone(),
        }
    }

    /// Returns the same paper at another version.
    #[must_use]
    pub fn with_version(&self, version: u32) -> Self {
        Self {
            version: version.max(DEFAULT_VERSION),
            ..self.clone()
        }
    }

    /// Returns `category/idNumber` (or the bare id number), without version.
    #[must_use]
    pub fn canonical_id(&self) -> String {
        self.key().to_string()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.key(), self.version)
    }
}

/// The stable registry key shared by every version of a paper.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PaperKey {
    /// Archive/category prefix, absent for modern ids.
    pub category: Option<String>,
    /// Numeric id without version.
    pub id_number: String,
}

impl PaperKey {
    /// Builds a key; an empty category is treated as absent.
    #[must_use]
    pub fn new(category: Option<&str>, id_number: &str) -> Self {
        Self {
            category: category.filter(|c| !c.is_empty()).map(str::to_string),
            id_number: id_number.to_string(),
        }
    }

    /// Storage form of the category column (empty string when absent).
    #[must_use]
    pub fn category_column(&self) -> &str {
        self.category.as_deref().unwrap_or("")
    }
}

impl fmt::Display for PaperKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.category {
            Some(category) => write!(f, "{category}/{}", self.id_number),
            None => f.write_str(&self.id_number),
        }
    }
}

/// How much the parser trusts its own split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// The split produced a well-formed modern or legacy identity.
    Canonical,
    /// No rule matched confidently; the identity is a best-effort guess.
    BestEffort,
}

impl Confidence {
    /// Returns the display label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Canonical => "canonical",
            Self::BestEffort => "best_effort",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full parser output: the identity plus how it was derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedIdentifier {
    /// Normalized identity.
    pub identity: Identity,
    /// Split rule that fired.
    pub rule: SplitRule,
    /// Whether the input spelled out a `vN` suffix.
    pub explicit_version: bool,
    /// Whether the result is a well-formed identifier.
    pub confidence: Confidence,
}

impl ParsedIdentifier {
    /// Returns the explicit version, if the input carried one.
    #[must_use]
    pub fn explicit_version(&self) -> Option<u32> {
        self.explicit_version.then_some(self.identity.version)
    }

    /// Returns true when the split is not trustworthy.
    #[must_use]
    pub fn is_best_effort(&self) -> bool {
        self.confidence == Confidence::BestEffort
    }
}

/// Parses a raw identifier into an [`Identity`].
///
/// Total: malformed input still yields a best-effort identity. Use
/// [`parse_identifier`] to learn whether the result should be trusted.
#[must_use]
pub fn parse(raw: &str) -> Identity {
    parse_identifier(raw).identity
}

/// Parses a raw identifier and reports the rule that fired and its confidence.
///
/// Rules are evaluated in order, first match wins:
/// 1. strip a trailing `.pdf` (any case)
/// 2. unwrap an `/abs/` (or `/pdf/`) URL path
/// 3. split on the last `/` into category and tail
/// 4. split on the last `_` when the tail is digits with an optional `vN`
/// 5. otherwise the whole string is the tail
///
/// The tail then loses a trailing `vN`, defaulting the version to 1. A `v0`
/// or overflowing suffix is still split off, clamped into range, and marked
/// best-effort.
#[tracing::instrument(level = "trace", skip(raw), fields(raw = %raw))]
#[must_use]
pub fn parse_identifier(raw: &str) -> ParsedIdentifier {
    let working = rules::normalize(raw);
    let (rule, split) = rules::split_category(working);
    let (id_number, suffix) = rules::split_version(split.tail);
    let (version, explicit, clamped) = match suffix {
        VersionSuffix::Absent => (DEFAULT_VERSION, false, false),
        VersionSuffix::Explicit(version) => (version, true, false),
        VersionSuffix::Clamped(version) => (version, false, true),
    };

    let identity = Identity::new(split.category, id_number, version);
    let confidence = if !clamped && classify::is_well_formed(&identity) {
        Confidence::Canonical
    } else {
        Confidence::BestEffort
    };

    if confidence == Confidence::BestEffort {
        debug!(raw = %raw, rule = %rule, identity = %identity, "best-effort identifier parse");
    } else {
        trace!(rule = %rule, identity = %identity, "parsed identifier");
    }

    ParsedIdentifier {
        identity,
        rule,
        explicit_version: explicit,
        confidence,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn identity(category: Option<&str>, id_number: &str, version: u32) -> Identity {
        Identity::new(category, id_number, version)
    }

    #[test]
    fn test_parse_old_style_with_version() {
        assert_eq!(
            parse("cond-mat/0102536v1"),
            identity(Some("cond-mat"), "0102536", 1)
        );
    }

    #[test]
    fn test_parse_old_style_defaults_version_to_one() {
        let parsed = parse_identifier("cond-mat/0102536");
        assert_eq!(parsed.identity, identity(Some("cond-mat"), "0102536", 1));
        assert!(!parsed.explicit_version);
        assert_eq!(parsed.explicit_version(), None);
    }

    #[test]
    fn test_parse_modern_has_no_category() {
        let parsed = parse_identifier("2101.00001v2");
        assert_eq!(parsed.identity, identity(None, "2101.00001", 2));
        assert_eq!(parsed.rule, SplitRule::Bare);
        assert_eq!(parsed.explicit_version(), Some(2));
        assert_eq!(parsed.confidence, Confidence::Canonical);
    }

    #[test]
    fn test_parse_modern_digits_and_dots_only() {
        assert_eq!(parse("1706.03762"), identity(None, "1706.03762", 1));
    }

    #[test]
    fn test_parse_legacy_underscore() {
        let parsed = parse_identifier("cs_0303006v1");
        assert_eq!(parsed.identity, identity(Some("cs"), "0303006", 1));
        assert_eq!(parsed.rule, SplitRule::Underscore);
    }

    #[test]
    fn test_parse_dotted_category_underscore() {
        let parsed = parse_identifier("math.GT_0512630");
        assert_eq!(parsed.identity, identity(Some("math.GT"), "0512630", 1));
        assert_eq!(parsed.confidence, Confidence::Canonical);
    }

    #[test]
    fn test_parse_abs_url() {
        assert_eq!(
            parse("http://arxiv.org/abs/cond-mat/0102536v1"),
            identity(Some("cond-mat"), "0102536", 1)
        );
        assert_eq!(
            parse("https://arxiv.org/abs/2101.00001v3"),
            identity(None, "2101.00001", 3)
        );
    }

    #[test]
    fn test_parse_pdf_url_and_extension() {
        assert_eq!(
            parse("https://arxiv.org/pdf/2101.00001v2.pdf"),
            identity(None, "2101.00001", 2)
        );
        assert_eq!(parse("2101.00001v4.PDF"), identity(None, "2101.00001", 4));
    }

    #[test]
    fn test_parse_url_query_and_trailing_slash_are_dropped() {
        assert_eq!(
            parse("https://arxiv.org/abs/2101.00001v2/?context=cs"),
            identity(None, "2101.00001", 2)
        );
    }

    #[test]
    fn test_parse_arxiv_prefix_and_whitespace() {
        assert_eq!(
            parse("  arXiv:1706.03762v5 \n"),
            identity(None, "1706.03762", 5)
        );
    }

    #[test]
    fn test_parse_noise_is_best_effort() {
        let parsed = parse_identifier("my_notes_folder");
        assert_eq!(parsed.rule, SplitRule::Bare);
        assert_eq!(parsed.identity, identity(None, "my_notes_folder", 1));
        assert!(parsed.is_best_effort());
    }

    #[test]
    fn test_parse_uppercase_v_is_not_a_version() {
        let parsed = parse_identifier("2101.00001V2");
        assert_eq!(parsed.identity, identity(None, "2101.00001V2", 1));
        assert!(parsed.is_best_effort());
    }

    #[test]
    fn test_parse_zero_version_keeps_paper_key() {
        let parsed = parse_identifier("2101.00001v0");
        assert_eq!(parsed.identity, identity(None, "2101.00001", 1));
        assert_eq!(parsed.identity.key(), parse("2101.00001").key());
        assert_eq!(parsed.explicit_version(), None);
        assert!(parsed.is_best_effort());
    }

    #[test]
    fn test_parse_overflowing_version_is_clamped() {
        let parsed = parse_identifier("cs/0303006v99999999999");
        assert_eq!(parsed.identity, identity(Some("cs"), "0303006", u32::MAX));
        assert_eq!(parsed.explicit_version(), None);
        assert!(parsed.is_best_effort());
    }

    #[test]
    fn test_identity_display_and_canonical_id() {
        let old = identity(Some("cond-mat"), "0102536", 2);
        assert_eq!(old.to_string(), "cond-mat/0102536v2");
        assert_eq!(old.canonical_id(), "cond-mat/0102536");

        let modern = identity(None, "2101.00001", 1);
        assert_eq!(modern.to_string(), "2101.00001v1");
        assert_eq!(modern.canonical_id(), "2101.00001");
    }

    #[test]
    fn test_identity_new_normalizes_empty_category_and_zero_version() {
        let id = Identity::new(Some(""), "2101.00001", 0);
        assert_eq!(id.category, None);
        assert_eq!(id.version, 1);
    }

    #[test]
    fn test_key_ignores_version() {
        assert_eq!(
            parse("1706.03762v1").key(),
            parse("1706.03762v7").key()
        );
        assert_ne!(parse("cs/0303006").key(), parse("math/0303006").key());
    }

    #[test]
    fn test_paper_key_category_column() {
        assert_eq!(PaperKey::new(None, "2101.00001").category_column(), "");
        assert_eq!(PaperKey::new(Some("cs"), "0303006").category_column(), "cs");
    }
}
