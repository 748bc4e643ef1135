//! On-disk layout for a paper's artifacts.
//!
//! Every paper lives under `root/{category|none}/{idNumber}/` with a
//! `metadata/` and a `pdf/` subdirectory. The PDF itself is named
//! `{idNumber}v{version}.pdf`.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::identifier::Identity;

/// Directory used in place of a category for modern identifiers.
pub const NO_CATEGORY_DIR: &str = "none";

/// Subdirectory holding metadata text files.
pub const METADATA_SUBDIR: &str = "metadata";

/// Subdirectory holding the PDF.
pub const PDF_SUBDIR: &str = "pdf";

/// Resolved artifact paths for one paper revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaperLayout {
    /// `root/{category|none}/{idNumber}`
    pub paper_dir: PathBuf,
    /// `paper_dir/metadata`
    pub metadata_dir: PathBuf,
    /// `paper_dir/pdf`
    pub pdf_dir: PathBuf,
    /// `pdf_dir/{idNumber}v{version}.pdf`
    pub pdf_file: PathBuf,
}

impl PaperLayout {
    /// Computes the layout for `identity` under `root`. Touches no files.
    #[must_use]
    pub fn new(root: &Path, identity: &Identity) -> Self {
        let category = identity
            .category
            .as_deref()
            .map_or_else(|| NO_CATEGORY_DIR.to_string(), sanitize_path_component);
        let id_number = sanitize_path_component(&identity.id_number);

        let paper_dir = root.join(category).join(&id_number);
        let metadata_dir = paper_dir.join(METADATA_SUBDIR);
        let pdf_dir = paper_dir.join(PDF_SUBDIR);
        let pdf_file = pdf_dir.join(format!("{id_number}v{}.pdf", identity.version));

        Self {
            paper_dir,
            metadata_dir,
            pdf_dir,
            pdf_file,
        }
    }

    /// Path of the paper directory relative to the library root.
    #[must_use]
    pub fn relative_dir(identity: &Identity) -> PathBuf {
        Self::new(Path::new(""), identity).paper_dir
    }
}

/// Replaces every character outside `[A-Za-z0-9_.-]` with `_`.
///
/// `.` and `..` are not allowed to survive as whole components.
#[must_use]
pub fn sanitize_path_component(value: &str) -> String {
    let sanitized: String = value
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
                ch
            } else {
                '_'
            }
        })
        .collect();

    match sanitized.as_str() {
        "" | "." | ".." => "_".repeat(sanitized.len().max(1)),
        _ => sanitized,
    }
}
