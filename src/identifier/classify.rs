//! Strict shape checks for candidate identifiers.
//!
//! The parser accepts anything; this module decides whether a name really
//! denotes a paper. Categories are assumed lowercase, matching how
//! directory names are written on disk.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::{Identity, compile_static_regex};

static MODERN_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"^\d{4}\.\d{4,5}v?\d*$"));

static LEGACY_SLASH_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"^[a-z\-.]+/\d{7}v?\d*$"));

static LEGACY_UNDERSCORE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"^[a-z.]+_\d{7}v?\d*$"));

static MODERN_ID_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"^\d{4}\.\d{4,5}$"));

static LEGACY_ID_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"^\d{7}$"));

static CATEGORY_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"^[A-Za-z][A-Za-z\-]*(?:\.[A-Za-z\-]+)?$"));

/// Canonical identifier shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierShape {
    /// `YYMM.NNNN[N][vN]`
    Modern,
    /// `category/NNNNNNN[vN]`
    LegacySlash,
    /// `category_NNNNNNN[vN]`
    LegacyUnderscore,
}

impl IdentifierShape {
    /// Returns the display label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Modern => "modern",
            Self::LegacySlash => "legacy_slash",
            Self::LegacyUnderscore => "legacy_underscore",
        }
    }
}

impl fmt::Display for IdentifierShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the canonical shape `candidate` matches, if any.
#[must_use]
pub fn classify(candidate: &str) -> Option<IdentifierShape> {
    if MODERN_RE.is_match(candidate) {
        Some(IdentifierShape::Modern)
    } else if LEGACY_SLASH_RE.is_match(candidate) {
        Some(IdentifierShape::LegacySlash)
    } else if LEGACY_UNDERSCORE_RE.is_match(candidate) {
        Some(IdentifierShape::LegacyUnderscore)
    } else {
        None
    }
}

/// Returns true when `candidate` plausibly names a paper.
///
/// Used to filter directory-scan and import candidates before any registry
/// operation.
#[must_use]
pub fn looks_like_identifier(candidate: &str) -> bool {
    classify(candidate).is_some()
}

/// Structural check on a parsed identity: a modern id without category, or
/// a seven-digit legacy id with a category.
pub(crate) fn is_well_formed(identity: &Identity) -> bool {
    match identity.category.as_deref() {
        None => MODERN_ID_NUMBER_RE.is_match(&identity.id_number),
        Some(category) => {
            CATEGORY_RE.is_match(category) && LEGACY_ID_NUMBER_RE.is_match(&identity.id_number)
        }
    }
}
