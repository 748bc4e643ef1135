//! Discovery of papers already on disk.
//!
//! Two layouts are recognised under a library root:
//!
//! - nested: `root/{category|none}/{idNumber}/` (see [`crate::layout`])
//! - flat: `root/{identifier}/`, a directory named after the identifier
//!
//! A candidate only counts when its name passes
//! [`looks_like_identifier`] and it has a `metadata/` or `pdf/`
//! subdirectory. The category part of a name is lowercased for that check
//! only, because layouts keep categories such as `math.GT` as written; the
//! registry key keeps the original case. Loose PDFs are handled by
//! [`collect_pdf_imports`].

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::identifier::{Identity, looks_like_identifier, parse, parse_identifier};
use crate::layout::{METADATA_SUBDIR, NO_CATEGORY_DIR, PDF_SUBDIR};
use crate::registry::{PaperRecord, RegistryEntry};

const TITLE_FILE: &str = "title.txt";
const AUTHORS_FILE: &str = "authors.txt";

/// Errors from directory scans.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The directory could not be read.
    #[error("cannot read directory {path}: {source}")]
    Io {
        /// Directory being read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The path exists but is not a directory.
    #[error("not a directory: {path}\n  Suggestion: Pass the library root or a folder of PDFs")]
    NotADirectory {
        /// Offending path.
        path: PathBuf,
    },
}

/// A paper directory found by [`scan_library`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScannedPaper {
    /// Identity derived from the directory name (and PDF names, for the version).
    pub identity: Identity,
    /// Paper directory.
    pub path: PathBuf,
    /// Contents of `metadata/title.txt`, if present and non-empty.
    pub title: Option<String>,
    /// Contents of `metadata/authors.txt`, if present and non-empty.
    pub authors: Option<String>,
    /// `metadata/` exists and is non-empty.
    pub has_metadata: bool,
    /// `pdf/` exists and is non-empty.
    pub has_pdf: bool,
}

impl ScannedPaper {
    /// Converts the scan result into an upsert payload.
    ///
    /// Title and authors missing on disk fall back to `existing` (the stored
    /// entry for the same key), then to a placeholder title.
    #[must_use]
    pub fn to_record(&self, existing: Option<&RegistryEntry>) -> PaperRecord {
        let stored = |field: fn(&RegistryEntry) -> &str| {
            existing
                .map(field)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        let title = self
            .title
            .clone()
            .or_else(|| stored(|entry| entry.title.as_str()))
            .unwrap_or_else(|| self.placeholder_title());
        let authors = self
            .authors
            .clone()
            .or_else(|| stored(|entry| entry.authors.as_str()))
            .unwrap_or_default();

        PaperRecord::new(self.identity.clone())
            .with_description(title, authors)
            .with_artifacts(
                self.path.to_string_lossy(),
                self.has_metadata,
                self.has_pdf,
            )
    }

    /// Title recorded for papers scanned without `metadata/title.txt`.
    #[must_use]
    pub fn placeholder_title(&self) -> String {
        format!("Paper: {}", self.identity.key())
    }
}

/// A loose PDF whose file stem names a paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdfImport {
    /// Source file.
    pub path: PathBuf,
    /// Identity parsed from the file stem.
    pub identity: Identity,
}

impl PdfImport {
    /// Title recorded for imports that have no metadata yet.
    #[must_use]
    pub fn placeholder_title(&self) -> String {
        format!("Imported: {}", self.identity)
    }
}

/// Result of [`collect_pdf_imports`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PdfImports {
    /// PDFs named after a paper.
    pub accepted: Vec<PdfImport>,
    /// PDFs whose names do not look like identifiers.
    pub rejected: Vec<PathBuf>,
}

/// Finds paper directories under `root` in both nested and flat layouts.
///
/// Unreadable subdirectories are logged and skipped. Results are sorted by
/// path.
///
/// # Errors
///
/// Returns [`ScanError`] if `root` itself cannot be read.
#[instrument(skip(root), fields(root = %root.display()))]
pub async fn scan_library(root: &Path) -> Result<Vec<ScannedPaper>, ScanError> {
    let mut found = Vec::new();

    for (name, path) in list_subdirs(root).await? {
        if is_paper_dir_name(&name) {
            if let Some(paper) = inspect_paper_dir(&path, &name).await {
                found.push(paper);
            }
            continue;
        }

        // Not an identifier itself: treat as a category directory.
        let children = match list_subdirs(&path).await {
            Ok(children) => children,
            Err(error) => {
                warn!(path = %path.display(), error = %error, "Skipping unreadable directory");
                continue;
            }
        };
        for (child, child_path) in children {
            let candidate = if name == NO_CATEGORY_DIR {
                child
            } else {
                format!("{name}/{child}")
            };
            if is_paper_dir_name(&candidate)
                && let Some(paper) = inspect_paper_dir(&child_path, &candidate).await
            {
                found.push(paper);
            }
        }
    }

    found.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(count = found.len(), "library scan complete");
    Ok(found)
}

/// Lists `*.pdf` files (extension in any case) directly inside `dir`.
///
/// # Errors
///
/// Returns [`ScanError`] if `dir` cannot be read or is not a directory.
#[instrument(skip(dir), fields(dir = %dir.display()))]
pub async fn collect_pdf_imports(dir: &Path) -> Result<PdfImports, ScanError> {
    let mut imports = PdfImports::default();

    for path in list_files(dir).await? {
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            continue;
        }

        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        if looks_like_identifier(&stem) {
            imports.accepted.push(PdfImport {
                identity: parse(&stem),
                path,
            });
        } else {
            debug!(path = %path.display(), "rejecting PDF with non-identifier name");
            imports.rejected.push(path);
        }
    }

    imports.accepted.sort_by(|a, b| a.path.cmp(&b.path));
    imports.rejected.sort();
    Ok(imports)
}

/// Classifier gate for directory names, with the category case folded.
fn is_paper_dir_name(name: &str) -> bool {
    match name.rfind(['/', '_']) {
        Some(index) => {
            let folded = format!("{}{}", name[..index].to_ascii_lowercase(), &name[index..]);
            looks_like_identifier(&folded)
        }
        None => looks_like_identifier(name),
    }
}

async fn inspect_paper_dir(path: &Path, name: &str) -> Option<ScannedPaper> {
    let metadata_dir = path.join(METADATA_SUBDIR);
    let pdf_dir = path.join(PDF_SUBDIR);
    if !is_dir(&metadata_dir).await && !is_dir(&pdf_dir).await {
        return None;
    }

    let mut identity = parse(name);
    let has_metadata = has_entries(&metadata_dir).await;
    let has_pdf = has_entries(&pdf_dir).await;
    if has_pdf && let Some(version) = highest_pdf_version(&pdf_dir, &identity).await {
        identity = identity.with_version(version.max(identity.version));
    }

    let (title, authors) = if has_metadata {
        (
            read_trimmed(&metadata_dir.join(TITLE_FILE)).await,
            read_trimmed(&metadata_dir.join(AUTHORS_FILE)).await,
        )
    } else {
        (None, None)
    };

    Some(ScannedPaper {
        identity,
        path: path.to_path_buf(),
        title,
        authors,
        has_metadata,
        has_pdf,
    })
}

/// Highest explicit `vN` among PDFs in `pdf_dir` naming the same paper.
async fn highest_pdf_version(pdf_dir: &Path, identity: &Identity) -> Option<u32> {
    let files = list_files(pdf_dir).await.ok()?;
    files
        .iter()
        .filter_map(|path| path.file_stem()?.to_str())
        .map(parse_identifier)
        .filter(|parsed| parsed.identity.id_number == identity.id_number)
        .filter_map(|parsed| parsed.explicit_version())
        .max()
}

async fn list_subdirs(dir: &Path) -> Result<Vec<(String, PathBuf)>, ScanError> {
    let mut out = Vec::new();
    for path in list_entries(dir).await? {
        if is_dir(&path).await
            && let Some(name) = path.file_name().and_then(|name| name.to_str())
        {
            out.push((name.to_string(), path.clone()));
        }
    }
    Ok(out)
}

async fn list_files(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut out = Vec::new();
    for path in list_entries(dir).await? {
        if tokio::fs::metadata(&path)
            .await
            .is_ok_and(|meta| meta.is_file())
        {
            out.push(path);
        }
    }
    Ok(out)
}

async fn list_entries(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let io_err = |source| ScanError::Io {
        path: dir.to_path_buf(),
        source,
    };
    if !is_dir(dir).await && tokio::fs::metadata(dir).await.is_ok() {
        return Err(ScanError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let mut reader = tokio::fs::read_dir(dir).await.map_err(io_err)?;
    let mut paths = Vec::new();
    while let Some(entry) = reader.next_entry().await.map_err(io_err)? {
        paths.push(entry.path());
    }
    Ok(paths)
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.is_dir())
}

async fn has_entries(dir: &Path) -> bool {
    match tokio::fs::read_dir(dir).await {
        Ok(mut reader) => matches!(reader.next_entry().await, Ok(Some(_))),
        Err(_) => false,
    }
}

async fn read_trimmed(path: &Path) -> Option<String> {
    let text = tokio::fs::read_to_string(path).await.ok()?;
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
