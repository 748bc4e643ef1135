//! Ordered normalization and split rules for identifier parsing.
//!
//! Each rule is a guarded function; the tables below are evaluated top to
//! bottom and the first rule whose guard matches wins.

use std::fmt;

use serde::Serialize;

/// Which split rule produced the category/tail pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitRule {
    /// `category/tail`, split on the last slash.
    Slash,
    /// `category_tail`, split on the last underscore.
    Underscore,
    /// No category.
    Bare,
}

impl SplitRule {
    /// Returns the display label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slash => "slash",
            Self::Underscore => "underscore",
            Self::Bare => "bare",
        }
    }
}

impl fmt::Display for SplitRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category/tail pair before version extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Split<'a> {
    pub(crate) category: Option<&'a str>,
    pub(crate) tail: &'a str,
}

type Normalizer = fn(&str) -> &str;
type SplitFn = fn(&str) -> Option<Split<'_>>;

const NORMALIZERS: &[Normalizer] = &[trim_input, strip_arxiv_prefix, strip_pdf_suffix, unwrap_url_path];

const SPLIT_RULES: &[(SplitRule, SplitFn)] = &[
    (SplitRule::Slash, split_on_slash),
    (SplitRule::Underscore, split_on_underscore),
    (SplitRule::Bare, split_bare),
];

const PDF_SUFFIX: &str = ".pdf";
const ARXIV_PREFIX: &str = "arxiv:";
const URL_MARKERS: &[&str] = &["/abs/", "/pdf/"];

/// Applies every normalizer in order.
pub(crate) fn normalize(raw: &str) -> &str {
    NORMALIZERS.iter().fold(raw, |working, step| step(working))
}

/// Runs the split rules in order and returns the first match.
pub(crate) fn split_category(working: &str) -> (SplitRule, Split<'_>) {
    SPLIT_RULES
        .iter()
        .find_map(|(rule, split)| split(working).map(|result| (*rule, result)))
        .unwrap_or((
            SplitRule::Bare,
            Split {
                category: None,
                tail: working,
            },
        ))
}

/// Version marker found at the end of a tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VersionSuffix {
    /// No `vN` suffix.
    Absent,
    /// A usable `vN` with N >= 1.
    Explicit(u32),
    /// `v0` or a number past `u32::MAX`, pulled into range.
    Clamped(u32),
}

/// Splits a trailing lowercase `v` + digits off the tail.
///
/// Any all-digit suffix is a version, so every spelling of a paper shares one
/// id number. A tail that is nothing but a version marker keeps its text.
pub(crate) fn split_version(tail: &str) -> (&str, VersionSuffix) {
    let Some((id_number, digits)) = tail.rsplit_once('v') else {
        return (tail, VersionSuffix::Absent);
    };
    if id_number.is_empty() || !is_ascii_digits(digits) {
        return (tail, VersionSuffix::Absent);
    }
    let suffix = match digits.parse::<u32>() {
        Ok(0) => VersionSuffix::Clamped(1),
        Ok(version) => VersionSuffix::Explicit(version),
        Err(_) => VersionSuffix::Clamped(u32::MAX),
    };
    (id_number, suffix)
}

fn trim_input(raw: &str) -> &str {
    raw.trim()
}

fn strip_arxiv_prefix(working: &str) -> &str {
    match working.get(..ARXIV_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(ARXIV_PREFIX) => {
            working[ARXIV_PREFIX.len()..].trim_start()
        }
        _ => working,
    }
}

fn strip_pdf_suffix(working: &str) -> &str {
    let Some(cut) = working.len().checked_sub(PDF_SUFFIX.len()) else {
        return working;
    };
    match working.get(cut..) {
        Some(suffix) if suffix.eq_ignore_ascii_case(PDF_SUFFIX) => &working[..cut],
        _ => working,
    }
}

fn unwrap_url_path(working: &str) -> &str {
    let Some(path) = URL_MARKERS.iter().find_map(|marker| {
        working
            .rfind(marker)
            .map(|index| &working[index + marker.len()..])
    }) else {
        return working;
    };
    let path = path.split(['?', '#']).next().unwrap_or(path);
    strip_pdf_suffix(path.trim_end_matches('/'))
}

fn split_on_slash(working: &str) -> Option<Split<'_>> {
    let (category, tail) = working.rsplit_once('/')?;
    Some(Split {
        category: non_empty(category),
        tail,
    })
}

fn split_on_underscore(working: &str) -> Option<Split<'_>> {
    let (category, tail) = working.rsplit_once('_')?;
    is_numeric_or_versioned(tail).then(|| Split {
        category: non_empty(category),
        tail,
    })
}

fn split_bare(working: &str) -> Option<Split<'_>> {
    Some(Split {
        category: None,
        tail: working,
    })
}

/// `digits` or `digits` + `v` + `digits`.
fn is_numeric_or_versioned(tail: &str) -> bool {
    match tail.split_once('v') {
        Some((number, version)) => is_ascii_digits(number) && is_ascii_digits(version),
        None => is_ascii_digits(tail),
    }
}

fn is_ascii_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_pdf_case_insensitively() {
        assert_eq!(normalize("cs_0303006v1.pdf"), "cs_0303006v1");
        assert_eq!(normalize("cs_0303006v1.Pdf"), "cs_0303006v1");
        assert_eq!(normalize(".pdf"), "");
    }

    #[test]
    fn test_normalize_unwraps_last_abs_segment() {
        assert_eq!(
            normalize("http://arxiv.org/abs/cond-mat/0102536v1"),
            "cond-mat/0102536v1"
        );
        assert_eq!(
            normalize("https://export.arxiv.org/abs/2101.00001#section"),
            "2101.00001"
        );
    }

    #[test]
    fn test_normalize_leaves_multibyte_input_intact() {
        assert_eq!(normalize("naïve"), "naïve");
        assert_eq!(normalize("é"), "é");
    }

    #[test]
    fn test_slash_rule_wins_over_underscore() {
        let (rule, split) = split_category("physics_x/0102536_12");
        assert_eq!(rule, SplitRule::Slash);
        assert_eq!(split.category, Some("physics_x"));
        assert_eq!(split.tail, "0102536_12");
    }

    #[test]
    fn test_underscore_rule_requires_numeric_tail() {
        let (rule, split) = split_category("cs_0303006v2");
        assert_eq!(rule, SplitRule::Underscore);
        assert_eq!(split.category, Some("cs"));

        let (rule, split) = split_category("my_notes_folder");
        assert_eq!(rule, SplitRule::Bare);
        assert_eq!(split.tail, "my_notes_folder");
    }

    #[test]
    fn test_underscore_rule_rejects_dotted_tail() {
        // A modern id behind an underscore is not a legacy tail.
        let (rule, _) = split_category("draft_2101.00001");
        assert_eq!(rule, SplitRule::Bare);
    }

    #[test]
    fn test_leading_slash_yields_no_category() {
        let (rule, split) = split_category("/0102536");
        assert_eq!(rule, SplitRule::Slash);
        assert_eq!(split.category, None);
    }

    #[test]
    fn test_split_version_cases() {
        assert_eq!(split_version("0102536v1"), ("0102536", VersionSuffix::Explicit(1)));
        assert_eq!(
            split_version("2101.00001v12"),
            ("2101.00001", VersionSuffix::Explicit(12))
        );
        assert_eq!(split_version("2101.00001"), ("2101.00001", VersionSuffix::Absent));
        assert_eq!(split_version("2101.00001v"), ("2101.00001v", VersionSuffix::Absent));
        assert_eq!(split_version("v3"), ("v3", VersionSuffix::Absent));
    }

    #[test]
    fn test_split_version_clamps_out_of_range_suffix() {
        assert_eq!(split_version("2101.00001v0"), ("2101.00001", VersionSuffix::Clamped(1)));
        assert_eq!(
            split_version("2101.00001v99999999999"),
            ("2101.00001", VersionSuffix::Clamped(u32::MAX))
        );
    }
}
